//! Turn executor: advances a conversation by exactly one round trip

use chat_relay_providers::{Message, ProviderError};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::runner::Runner;
use crate::session::Session;

/// Prefix of the text shown to the user when a turn fails
pub const ERROR_PREFIX: &str = "An error occurred:";

/// Why a turn produced no reply
#[derive(Error, Debug)]
pub enum TurnError {
    /// The completion call failed for any reason: network, malformed
    /// response, auth or quota.
    #[error("{0}")]
    RemoteCallFailure(#[from] ProviderError),
}

impl TurnError {
    /// Text rendered in place of the assistant reply
    pub fn user_message(&self) -> String {
        format!("{ERROR_PREFIX} {self}")
    }
}

/// A completed turn
#[derive(Debug, Clone)]
pub struct TurnOutput {
    /// Assistant reply text
    pub reply: String,
    /// New authoritative history, ending with the user/assistant pair
    pub history: Vec<Message>,
}

/// What the user sees after a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnReply {
    Reply(String),
    Failed(String),
}

impl TurnReply {
    pub fn text(&self) -> &str {
        match self {
            TurnReply::Reply(text) | TurnReply::Failed(text) => text,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TurnReply::Failed(_))
    }
}

/// Run one turn without touching the session.
///
/// The user message is appended to a working copy of the history, which is
/// submitted as a single completion call. On success the provider's
/// canonical input list becomes the new history.
pub async fn run_turn(session: &Session, user_text: &str) -> Result<TurnOutput, TurnError> {
    let mut working = session.history.clone();
    working.push(Message::user(user_text));

    debug!(
        session = %session.id,
        "Calling agent with context: {:?}",
        working
    );

    let result = Runner::run(&session.agent, working, &session.run_config).await?;

    Ok(TurnOutput {
        reply: result.final_output().to_string(),
        history: result.to_input_list(),
    })
}

/// Run one turn and commit its history.
///
/// A failed turn leaves `session.history` exactly as it was, so retrying
/// the same message does not duplicate it.
pub async fn advance(session: &mut Session, user_text: &str) -> TurnReply {
    match run_turn(session, user_text).await {
        Ok(output) => {
            info!(session = %session.id, "User: {}", user_text);
            info!(session = %session.id, "Assistant: {}", output.reply);
            session.history = output.history;
            TurnReply::Reply(output.reply)
        }
        Err(e) => {
            error!(session = %session.id, "Error: {}", e);
            TurnReply::Failed(e.user_message())
        }
    }
}
