//! Runner: one completion call for an agent over a message list

use chat_relay_providers::{Message, ProviderError, ProviderResult, Role};
use tracing::{debug, info};

use crate::agent::Agent;
use crate::run_config::RunConfig;

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunResult {
    input: Vec<Message>,
    new_items: Vec<Message>,
    final_output: String,
}

impl RunResult {
    /// Top-level text answer
    pub fn final_output(&self) -> &str {
        &self.final_output
    }

    /// Canonical conversation after this run: the submitted input followed
    /// by the produced items. This is what the next run should receive.
    pub fn to_input_list(&self) -> Vec<Message> {
        let mut list = Vec::with_capacity(self.input.len() + self.new_items.len());
        list.extend(self.input.iter().cloned());
        list.extend(self.new_items.iter().cloned());
        list
    }
}

/// Executes agents against a provider
pub struct Runner;

impl Runner {
    /// Submit `input` with the agent's instructions as a single blocking
    /// completion call.
    ///
    /// System messages in `input` are dropped; the agent's instructions are
    /// always the only system prompt. A completion without text is an
    /// invalid response.
    pub async fn run(
        agent: &Agent,
        input: Vec<Message>,
        config: &RunConfig,
    ) -> ProviderResult<RunResult> {
        let input: Vec<Message> = input
            .into_iter()
            .filter(|m| m.role != Role::System)
            .collect();

        let mut messages = Vec::with_capacity(input.len() + 1);
        messages.push(agent.system_message());
        messages.extend(input.iter().cloned());

        debug!(
            agent = agent.name(),
            model = %config.model.model,
            "Submitting {} input items",
            input.len()
        );

        let response = config
            .provider
            .chat(
                messages,
                Some(config.model.model.clone()),
                config.model.settings.max_tokens,
                config.model.settings.temperature,
            )
            .await?;

        let final_output = response
            .text_content()
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!(
                    "completion has no text content (finish_reason: {})",
                    response.finish_reason
                ))
            })?
            .to_string();

        if !config.tracing_disabled {
            info!(
                agent = agent.name(),
                provider = %config.provider_name,
                model = %config.model.model,
                input_items = input.len(),
                finish_reason = %response.finish_reason,
                total_tokens = response.usage.get("total_tokens").copied().unwrap_or_default(),
                "Run trace"
            );
        }

        Ok(RunResult {
            input,
            new_items: vec![Message::assistant(final_output.clone())],
            final_output,
        })
    }
}
