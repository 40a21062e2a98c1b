//! Agent logic for chat-relay
//!
//! This crate provides the persona definition, run bindings, the turn
//! executor and the session store, plus the chat handlers transports call.

pub mod agent;
pub mod handlers;
pub mod run_config;
pub mod runner;
pub mod session;
pub mod turn;

pub use agent::Agent;
pub use handlers::{ChatHandlers, RunConfigFactory};
pub use run_config::{ModelBinding, ModelSettings, RunConfig};
pub use runner::{RunResult, Runner};
pub use session::{Session, SessionHandle, SessionKey, SessionStore, SessionValue};
pub use turn::{advance, run_turn, TurnError, TurnOutput, TurnReply, ERROR_PREFIX};
