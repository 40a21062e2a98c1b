//! Core types and traits for chat-relay
//!
//! This crate provides the error type, configuration, logging setup and
//! the transport interface shared by all other chat-relay components.

pub mod config;
pub mod error;
pub mod logging;
pub mod transport;

pub use error::{Error, Result};
