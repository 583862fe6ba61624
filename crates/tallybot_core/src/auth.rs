//! Sender allow-list.

use crate::model::message::UserId;
use log::info;
use std::collections::HashSet;

/// Static allow-list built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct Authorizer {
    allowed: HashSet<UserId>,
}

impl Authorizer {
    pub fn new(allowed: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn is_allowed(&self, user_id: UserId) -> bool {
        let allowed = self.allowed.contains(&user_id);
        info!(
            "event=auth_check module=auth status={} user_id={}",
            if allowed { "allowed" } else { "denied" },
            user_id.0
        );
        allowed
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}
