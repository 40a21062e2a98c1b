//! Event types exchanged with a UI transport

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Handle of a message rendered by a transport
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Allocate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Event delivered by the hosting UI for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// A new chat was opened
    ChatStart { session_id: String },
    /// The user sent a message
    Message { session_id: String, content: String },
    /// The UI closed the chat
    ChatEnd { session_id: String },
}

impl InboundEvent {
    /// Session the event belongs to
    pub fn session_id(&self) -> &str {
        match self {
            Self::ChatStart { session_id }
            | Self::Message { session_id, .. }
            | Self::ChatEnd { session_id } => session_id,
        }
    }
}

/// Assistant message as rendered by a transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Message handle
    pub id: MessageId,
    /// Target session
    pub session_id: String,
    /// Current message text
    pub content: String,
}

impl OutboundMessage {
    /// Create a new outbound message with a fresh id
    pub fn new(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            session_id: session_id.into(),
            content: content.into(),
        }
    }
}
