//! Scripted in-memory provider for tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::base::{LLMProvider, LLMResponse, Message, ProviderError, ProviderResult};

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Reply with this text
    Reply(String),
    /// Fail with an API error carrying this message
    Fail(String),
}

/// A request as seen by the provider
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Provider that plays back scripted outcomes and records every call.
///
/// When the script runs out it echoes the last user message.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a provider from a sequence of outcomes
    pub fn with_script(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(
        &self,
        messages: Vec<Message>,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> ProviderResult<LLMResponse> {
        let echo = messages
            .iter()
            .rev()
            .find(|m| m.role == crate::base::Role::User)
            .map(|m| format!("echo: {}", m.content))
            .unwrap_or_else(|| "echo".to_string());

        lock(&self.calls).push(RecordedCall {
            messages,
            model,
            max_tokens,
            temperature,
        });

        match lock(&self.script).pop_front() {
            Some(Scripted::Reply(text)) => Ok(LLMResponse::text(text)),
            Some(Scripted::Fail(message)) => Err(ProviderError::ApiError(message)),
            None => Ok(LLMResponse::text(echo)),
        }
    }

    fn get_default_model(&self) -> String {
        "scripted".to_string()
    }
}
