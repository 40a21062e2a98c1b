//! Chat-completion provider integrations for chat-relay
//!
//! This crate provides the provider abstraction and a client for
//! OpenAI-compatible endpoints such as Gemini's compatibility surface.

pub mod base;
pub mod openai_compat;
pub mod registry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use base::{LLMProvider, LLMResponse, Message, ProviderError, ProviderResult, Role};
pub use openai_compat::OpenAICompatClient;
pub use registry::{ProviderRegistry, ProviderSpec};
