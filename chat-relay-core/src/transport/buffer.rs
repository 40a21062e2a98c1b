//! In-memory transport that records what would have been rendered

use async_trait::async_trait;
use std::sync::Mutex;

use super::events::{MessageId, OutboundMessage};
use super::Transport;

/// Collects outbound messages in render order, applying updates in place
#[derive(Debug, Default)]
pub struct BufferedTransport {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl BufferedTransport {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the rendered messages
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.lock().clone()
    }

    /// Drain the rendered messages
    pub fn take(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<OutboundMessage>> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for BufferedTransport {
    async fn send(&self, session_id: &str, content: &str) -> crate::Result<MessageId> {
        let message = OutboundMessage::new(session_id, content);
        let id = message.id.clone();
        self.lock().push(message);
        Ok(id)
    }

    async fn update(&self, session_id: &str, id: &MessageId, content: &str) -> crate::Result<()> {
        let mut messages = self.lock();
        let message = messages
            .iter_mut()
            .find(|m| &m.id == id && m.session_id == session_id)
            .ok_or_else(|| crate::Error::NotFound(format!("message {id}")))?;
        message.content = content.to_string();
        Ok(())
    }
}
