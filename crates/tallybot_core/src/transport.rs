//! Outbound chat transport contract.

use crate::model::message::ChatId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(pub String);

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "transport send failed: {}", self.0)
    }
}

impl Error for TransportError {}

/// Delivers reply text to a chat.
pub trait Transport: Send + Sync {
    fn send(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError>;
}

/// Records every sent message in order.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<(ChatId, String)>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all messages sent so far.
    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .map_err(|_| TransportError("memory transport lock poisoned".to_string()))?
            .push((chat_id, text.to_string()));
        Ok(())
    }
}
