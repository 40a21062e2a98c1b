//! Model and provider bindings for a run

use chat_relay_core::config::ProviderConfig;
use chat_relay_providers::{LLMProvider, OpenAICompatClient};
use std::fmt;
use std::sync::Arc;

/// Sampling settings forwarded with every request
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModelSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Which model to call and how
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBinding {
    pub model: String,
    pub settings: ModelSettings,
}

impl ModelBinding {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            settings: ModelSettings::default(),
        }
    }
}

/// Everything needed to execute one completion call.
///
/// Built once per session and shared by reference across its turns.
#[derive(Clone)]
pub struct RunConfig {
    pub model: ModelBinding,
    pub provider: Arc<dyn LLMProvider>,
    pub provider_name: String,
    pub tracing_disabled: bool,
}

impl RunConfig {
    /// Bind a provider handle to a model
    pub fn new(provider: Arc<dyn LLMProvider>, model: ModelBinding) -> Self {
        Self {
            model,
            provider,
            provider_name: "custom".to_string(),
            tracing_disabled: true,
        }
    }

    /// Build the provider client and bindings from configuration
    pub fn from_config(config: &ProviderConfig) -> chat_relay_core::Result<Self> {
        let client = OpenAICompatClient::from_config(config)?;
        let model = ModelBinding {
            model: client.get_default_model(),
            settings: ModelSettings {
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            },
        };

        Ok(Self {
            model,
            provider: Arc::new(client),
            provider_name: config.name.clone(),
            tracing_disabled: config.tracing_disabled,
        })
    }

    pub fn with_tracing_disabled(mut self, disabled: bool) -> Self {
        self.tracing_disabled = disabled;
        self
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("tracing_disabled", &self.tracing_disabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_binds_model_and_settings() {
        let config = ProviderConfig {
            api_key: "k".to_string(),
            max_tokens: Some(512),
            temperature: Some(0.2),
            ..ProviderConfig::default()
        };

        let run_config = RunConfig::from_config(&config).unwrap();
        assert_eq!(run_config.model.model, "gemini-2.0-flash");
        assert_eq!(run_config.model.settings.max_tokens, Some(512));
        assert_eq!(run_config.provider_name, "gemini");
        assert!(run_config.tracing_disabled);
        assert!(format!("{run_config:?}").contains("gemini-2.0-flash"));
    }

    #[test]
    fn test_from_config_local_provider_uses_registry_defaults() {
        let config = ProviderConfig {
            name: "ollama".to_string(),
            model: String::new(),
            ..ProviderConfig::default()
        };

        let run_config = RunConfig::from_config(&config).unwrap();
        assert_eq!(run_config.model.model, "llama3.2");
        assert_eq!(run_config.provider_name, "ollama");
    }

    #[test]
    fn test_from_config_without_key_is_config_error() {
        let err = RunConfig::from_config(&ProviderConfig::default()).unwrap_err();
        assert!(matches!(err, chat_relay_core::Error::Config(_)));
    }
}
