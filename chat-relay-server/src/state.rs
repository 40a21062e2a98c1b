use chat_relay_agent::ChatHandlers;
use chat_relay_core::transport::OutboundMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state of the web server
#[derive(Clone)]
pub struct AppState {
    pub handlers: Arc<ChatHandlers>,
}

impl AppState {
    pub fn new(handlers: ChatHandlers) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }
}

/// Body of `POST /api/sessions/:id/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

/// Reply to `POST /api/sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStarted {
    pub session_id: String,
    pub messages: Vec<OutboundMessage>,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
