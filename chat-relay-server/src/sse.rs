//! Transport that forwards rendered messages to a server-sent event stream

use async_trait::async_trait;
use axum::response::sse::Event;
use chat_relay_core::transport::{MessageId, OutboundMessage, Transport};
use chat_relay_core::{Error, Result};
use tokio::sync::mpsc;

/// Widget-side rendering instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// Render a new assistant message
    Message(OutboundMessage),
    /// Replace the text of an already rendered message
    Update(OutboundMessage),
    /// The request could not be completed
    Error(String),
}

impl WidgetEvent {
    /// Encode as an SSE frame
    pub fn into_event(self) -> Event {
        match self {
            WidgetEvent::Message(message) => Event::default()
                .event("message")
                .data(serde_json::to_string(&message).unwrap_or_default()),
            WidgetEvent::Update(message) => Event::default()
                .event("update")
                .data(serde_json::to_string(&message).unwrap_or_default()),
            WidgetEvent::Error(message) => Event::default().event("error").data(message),
        }
    }
}

/// Sends widget events over an unbounded channel drained by the SSE response
#[derive(Debug, Clone)]
pub struct SseTransport {
    events: mpsc::UnboundedSender<WidgetEvent>,
}

impl SseTransport {
    pub fn new(events: mpsc::UnboundedSender<WidgetEvent>) -> Self {
        Self { events }
    }

    /// Create a transport together with the receiving end of its stream
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WidgetEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Report a failure to the client; ignored if it already disconnected
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.events.send(WidgetEvent::Error(message.into()));
    }

    fn emit(&self, event: WidgetEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| Error::Transport("event stream closed".to_string()))
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn send(&self, session_id: &str, content: &str) -> Result<MessageId> {
        let message = OutboundMessage::new(session_id, content);
        let id = message.id.clone();
        self.emit(WidgetEvent::Message(message))?;
        Ok(id)
    }

    async fn update(&self, session_id: &str, id: &MessageId, content: &str) -> Result<()> {
        self.emit(WidgetEvent::Update(OutboundMessage {
            id: id.clone(),
            session_id: session_id.to_string(),
            content: content.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_reuses_message_id() {
        let (transport, mut rx) = SseTransport::channel();

        let id = transport.send("s1", "Thinking...").await.unwrap();
        transport.update("s1", &id, "555-0100").await.unwrap();

        match rx.recv().await.unwrap() {
            WidgetEvent::Message(m) => {
                assert_eq!(m.id, id);
                assert_eq!(m.content, "Thinking...");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match rx.recv().await.unwrap() {
            WidgetEvent::Update(m) => {
                assert_eq!(m.id, id);
                assert_eq!(m.content, "555-0100");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_after_disconnect_is_transport_error() {
        let (transport, rx) = SseTransport::channel();
        drop(rx);

        let err = transport.send("s1", "hello").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
