//! Web chat widget for chat-relay
//!
//! Serves the widget page and a small JSON/SSE API that feeds the chat
//! handlers.

pub mod handlers;
pub mod server;
pub mod sse;
pub mod state;

pub use server::{build_router, run_server};
pub use sse::{SseTransport, WidgetEvent};
pub use state::AppState;
