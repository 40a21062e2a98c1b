//! Chat lifecycle handlers
//!
//! Transports call these with explicit session ids and message text; the
//! handlers never depend on how events are delivered.

use chat_relay_core::config::{AgentConfig, ProviderConfig};
use chat_relay_core::transport::{InboundEvent, Transport};
use chat_relay_core::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::agent::Agent;
use crate::run_config::RunConfig;
use crate::session::{Session, SessionStore};
use crate::turn::{self, TurnReply};

/// Builds the run configuration for a new session
pub type RunConfigFactory = Arc<dyn Fn() -> Result<RunConfig> + Send + Sync>;

/// Entry points invoked by a transport
pub struct ChatHandlers {
    store: Arc<SessionStore>,
    agent_config: AgentConfig,
    run_config_factory: RunConfigFactory,
}

impl ChatHandlers {
    /// Handlers that build a fresh provider client per session from `provider`
    pub fn new(agent_config: AgentConfig, provider: ProviderConfig) -> Self {
        Self::with_factory(
            agent_config,
            Arc::new(move || RunConfig::from_config(&provider)),
        )
    }

    /// Handlers with a custom run configuration source
    pub fn with_factory(agent_config: AgentConfig, run_config_factory: RunConfigFactory) -> Self {
        Self {
            store: Arc::new(SessionStore::new()),
            agent_config,
            run_config_factory,
        }
    }

    /// Session store backing these handlers
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn agent_config(&self) -> &AgentConfig {
        &self.agent_config
    }

    /// Start a chat: bind the agent and provider, reset history, greet.
    pub async fn on_chat_start(&self, session_id: &str, transport: &dyn Transport) -> Result<()> {
        let agent = Arc::new(Agent::from_config(&self.agent_config));
        let run_config = Arc::new((self.run_config_factory)()?);

        info!(
            session = session_id,
            model = %run_config.model.model,
            "Chat started"
        );
        self.store.create(Session::new(session_id, agent, run_config));

        transport.send(session_id, &self.agent_config.greeting).await?;
        Ok(())
    }

    /// Handle one user message.
    ///
    /// A placeholder is rendered first and then replaced with the reply or
    /// the error text. Remote failures are reported through the returned
    /// [`TurnReply`], never as `Err`.
    pub async fn on_message(
        &self,
        session_id: &str,
        content: &str,
        transport: &dyn Transport,
    ) -> Result<TurnReply> {
        if content.trim().is_empty() {
            return Err(Error::Validation("message must not be empty".to_string()));
        }
        let handle = self.store.handle(session_id)?;

        let placeholder = transport
            .send(session_id, &self.agent_config.placeholder)
            .await?;

        let reply = {
            let mut session = handle.lock().await;
            turn::advance(&mut session, content).await
        };

        transport
            .update(session_id, &placeholder, reply.text())
            .await?;
        Ok(reply)
    }

    /// End a chat; returns whether the session existed
    pub fn on_chat_end(&self, session_id: &str) -> bool {
        let removed = self.store.remove(session_id);
        debug!(session = session_id, removed, "Chat ended");
        removed
    }

    /// Route an inbound event to its handler
    pub async fn dispatch(&self, event: InboundEvent, transport: &dyn Transport) -> Result<()> {
        debug!(session = event.session_id(), "Dispatching {:?}", event);
        match event {
            InboundEvent::ChatStart { session_id } => {
                self.on_chat_start(&session_id, transport).await
            }
            InboundEvent::Message {
                session_id,
                content,
            } => self
                .on_message(&session_id, &content, transport)
                .await
                .map(|_| ()),
            InboundEvent::ChatEnd { session_id } => {
                self.on_chat_end(&session_id);
                Ok(())
            }
        }
    }
}
