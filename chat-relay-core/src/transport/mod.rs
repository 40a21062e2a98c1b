//! Transport interface between the chat handlers and a UI surface
//!
//! A transport delivers inbound user events to the handlers (by calling
//! them with explicit parameters) and renders outbound assistant messages.
//! Outbound messages are addressable so an interim placeholder can be
//! replaced in place once the real reply arrives.

pub mod buffer;
pub mod events;

pub use buffer::BufferedTransport;
pub use events::{InboundEvent, MessageId, OutboundMessage};

use async_trait::async_trait;

/// Outbound side of a UI transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Render a new assistant message and return its handle
    async fn send(&self, session_id: &str, content: &str) -> crate::Result<MessageId>;

    /// Replace the content of a previously sent message
    async fn update(&self, session_id: &str, id: &MessageId, content: &str) -> crate::Result<()>;
}
