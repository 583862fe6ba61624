//! Inbound chat message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Chat id (numeric). Replies are always addressed to the originating chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// One inbound update as delivered by the transport.
///
/// `text == None` models non-text updates (photos, stickers, joins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub sender_id: UserId,
    pub chat_id: ChatId,
    pub text: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RawMessage {
    /// Creates a text message stamped with the current time.
    pub fn text(sender_id: UserId, chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            chat_id,
            text: Some(text.into()),
            timestamp: Utc::now(),
        }
    }

    /// Creates a non-text update stamped with the current time.
    pub fn non_text(sender_id: UserId, chat_id: ChatId) -> Self {
        Self {
            sender_id,
            chat_id,
            text: None,
            timestamp: Utc::now(),
        }
    }
}
