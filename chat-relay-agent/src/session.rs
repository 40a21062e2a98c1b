//! Per-conversation state and the store that owns it
//!
//! Each session lives behind its own async mutex: turns of one session are
//! serialized while sessions never share state.

use chat_relay_core::{Error, Result};
use chat_relay_providers::Message;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::agent::Agent;
use crate::run_config::RunConfig;

/// Mutable state of one conversation
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque id supplied by the transport
    pub id: String,
    /// Conversation so far, oldest first
    pub history: Vec<Message>,
    /// Persona for this conversation
    pub agent: Arc<Agent>,
    /// Bindings used for every turn
    pub run_config: Arc<RunConfig>,
}

impl Session {
    /// Create a session with an empty history
    pub fn new(id: impl Into<String>, agent: Arc<Agent>, run_config: Arc<RunConfig>) -> Self {
        Self {
            id: id.into(),
            history: Vec::new(),
            agent,
            run_config,
        }
    }
}

/// Addressable slots of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    History,
    Agent,
    Config,
}

/// Value held in one slot
#[derive(Debug, Clone)]
pub enum SessionValue {
    History(Vec<Message>),
    Agent(Arc<Agent>),
    Config(Arc<RunConfig>),
}

impl SessionValue {
    /// Slot this value belongs in
    pub fn key(&self) -> SessionKey {
        match self {
            SessionValue::History(_) => SessionKey::History,
            SessionValue::Agent(_) => SessionKey::Agent,
            SessionValue::Config(_) => SessionKey::Config,
        }
    }

    pub fn into_history(self) -> Option<Vec<Message>> {
        match self {
            SessionValue::History(history) => Some(history),
            _ => None,
        }
    }

    pub fn into_agent(self) -> Option<Arc<Agent>> {
        match self {
            SessionValue::Agent(agent) => Some(agent),
            _ => None,
        }
    }

    pub fn into_config(self) -> Option<Arc<RunConfig>> {
        match self {
            SessionValue::Config(config) => Some(config),
            _ => None,
        }
    }
}

/// Shared handle to one session
pub type SessionHandle = Arc<Mutex<Session>>;

/// Owns every active session, keyed by session id
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session, replacing any previous session with the same id
    pub fn create(&self, session: Session) -> SessionHandle {
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));
        if self
            .sessions
            .write()
            .insert(id.clone(), handle.clone())
            .is_some()
        {
            debug!("Replaced existing session {}", id);
        }
        handle
    }

    /// Handle of an active session
    pub fn handle(&self, session_id: &str) -> Result<SessionHandle> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("session {session_id}")))
    }

    /// Exclusive access to a session until the guard is dropped.
    ///
    /// Waits for any turn already running on the same session.
    pub async fn lock(&self, session_id: &str) -> Result<OwnedMutexGuard<Session>> {
        let handle = self.handle(session_id)?;
        Ok(handle.lock_owned().await)
    }

    /// Read one slot of a session
    pub async fn get(&self, session_id: &str, key: SessionKey) -> Result<SessionValue> {
        let session = self.lock(session_id).await?;
        Ok(match key {
            SessionKey::History => SessionValue::History(session.history.clone()),
            SessionKey::Agent => SessionValue::Agent(session.agent.clone()),
            SessionKey::Config => SessionValue::Config(session.run_config.clone()),
        })
    }

    /// Write the slot named by the value
    pub async fn set(&self, session_id: &str, value: SessionValue) -> Result<()> {
        let mut session = self.lock(session_id).await?;
        match value {
            SessionValue::History(history) => session.history = history,
            SessionValue::Agent(agent) => session.agent = agent,
            SessionValue::Config(config) => session.run_config = config,
        }
        Ok(())
    }

    /// Write a slot, checking that the value fits the key
    pub async fn set_key(&self, session_id: &str, key: SessionKey, value: SessionValue) -> Result<()> {
        if value.key() != key {
            return Err(Error::Session(format!(
                "value for {:?} cannot be stored under {:?}",
                value.key(),
                key
            )));
        }
        self.set(session_id, value).await
    }

    /// Conversation history of a session
    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        let session = self.lock(session_id).await?;
        Ok(session.history.clone())
    }

    /// Drop a session; returns whether it existed
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
