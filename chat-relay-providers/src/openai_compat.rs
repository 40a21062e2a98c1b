//! HTTP client for OpenAI-compatible chat-completion endpoints

use async_trait::async_trait;
use chat_relay_core::config::ProviderConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::base::{LLMProvider, LLMResponse, Message, ProviderError, ProviderResult};
use crate::registry::ProviderRegistry;

/// Chat completion request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat completion response body
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: i64,
    #[serde(default)]
    completion_tokens: i64,
    #[serde(default)]
    total_tokens: i64,
}

/// Client for any endpoint speaking the OpenAI chat-completions dialect
pub struct OpenAICompatClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    default_model: String,
    extra_headers: HashMap<String, String>,
}

impl OpenAICompatClient {
    /// Create a new client.
    ///
    /// A blank `api_base` falls back to the registry default for
    /// `provider_name`, then to a local OpenAI-compatible proxy.
    pub fn new(
        api_key: Option<String>,
        api_base: Option<String>,
        default_model: String,
        extra_headers: Option<HashMap<String, String>>,
        provider_name: Option<String>,
    ) -> Self {
        let registry = ProviderRegistry::new();

        let api_base = api_base
            .filter(|base| !base.trim().is_empty())
            .or_else(|| {
                provider_name
                    .as_deref()
                    .and_then(|name| registry.find_by_name(name))
                    .map(|spec| spec.default_api_base.clone())
                    .filter(|base| !base.is_empty())
            })
            .unwrap_or_else(|| "http://localhost:4000".to_string());

        Self {
            client: Client::builder()
                .http1_only() // Force HTTP/1.1 to avoid issues with some local servers
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            default_model,
            extra_headers: extra_headers.unwrap_or_default(),
        }
    }

    /// Build a client from the provider section of the configuration
    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        let registry = ProviderRegistry::new();
        let spec = registry.find_by_name(&config.name);
        let needs_key = spec.map_or(true, |spec| spec.requires_api_key());

        if needs_key && config.api_key().is_none() {
            let env_hint = spec
                .map(|spec| spec.env_key.as_str())
                .filter(|env_key| !env_key.is_empty())
                .unwrap_or("CHAT_RELAY__PROVIDER__API_KEY");
            return Err(ProviderError::ConfigError(format!(
                "no API key configured for provider '{}' (set {})",
                config.name, env_hint
            )));
        }

        let model = if config.model.trim().is_empty() {
            spec.map(|spec| spec.default_model.clone()).ok_or_else(|| {
                ProviderError::ConfigError(format!(
                    "no model configured for provider '{}'",
                    config.name
                ))
            })?
        } else {
            config.model.clone()
        };

        Ok(Self::new(
            config.api_key().map(ToString::to_string),
            config.api_base().map(ToString::to_string),
            model,
            config.extra_headers.clone(),
            Some(config.name.clone()),
        ))
    }

    /// Base URL requests are sent to (without trailing slash)
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    /// Convert the wire response into our standard format
    fn parse_response(response: ChatCompletionResponse) -> ProviderResult<LLMResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

        let mut usage = HashMap::new();
        if let Some(u) = response.usage {
            usage.insert("prompt_tokens".to_string(), u.prompt_tokens);
            usage.insert("completion_tokens".to_string(), u.completion_tokens);
            usage.insert("total_tokens".to_string(), u.total_tokens);
        }

        Ok(LLMResponse {
            content: choice.message.content,
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            usage,
        })
    }

    fn apply_headers(&self, mut req_builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(api_key) = &self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        for (key, value) in &self.extra_headers {
            req_builder = req_builder.header(key, value);
        }

        req_builder
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatClient {
    async fn chat(
        &self,
        messages: Vec<Message>,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> ProviderResult<LLMResponse> {
        let model = model.unwrap_or_else(|| self.default_model.clone());
        let request = ChatCompletionRequest {
            model: &model,
            messages: &messages,
            max_tokens,
            temperature,
        };

        debug!(
            "Sending chat request to {} with model {} ({} messages)",
            self.api_base,
            model,
            messages.len()
        );

        let req_builder = self.apply_headers(self.client.post(self.completions_url()).json(&request));
        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        let response_data: ChatCompletionResponse = serde_json::from_str(&body)?;
        Self::parse_response(response_data)
    }

    fn get_default_model(&self) -> String {
        self.default_model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        })
        .to_string()
    }

    #[test]
    fn test_api_base_falls_back_to_registry() {
        let client = OpenAICompatClient::new(
            Some("k".to_string()),
            Some("  ".to_string()),
            "gemini-2.0-flash".to_string(),
            None,
            Some("gemini".to_string()),
        );
        assert_eq!(
            client.completions_url(),
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
        );
    }

    #[test]
    fn test_unknown_provider_without_base_uses_local_proxy() {
        let client = OpenAICompatClient::new(None, None, "m".to_string(), None, None);
        assert_eq!(client.api_base(), "http://localhost:4000");
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = ProviderConfig::default();
        let err = OpenAICompatClient::from_config(&config).err().unwrap();
        assert!(matches!(err, ProviderError::ConfigError(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_from_config_local_provider_without_key() {
        let config = ProviderConfig {
            name: "ollama".to_string(),
            model: String::new(),
            ..ProviderConfig::default()
        };
        let client = OpenAICompatClient::from_config(&config).unwrap();
        assert_eq!(client.get_default_model(), "llama3.2");
        assert_eq!(client.api_base(), "http://localhost:11434/v1");
    }

    #[tokio::test]
    async fn test_chat_sends_history_and_parses_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_header("x-extra", "1")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gemini-2.0-flash",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "What is the number for front desk?"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("Front desk is 555-0100."))
            .create_async()
            .await;

        let mut headers = HashMap::new();
        headers.insert("x-extra".to_string(), "1".to_string());
        let client = OpenAICompatClient::new(
            Some("test-key".to_string()),
            Some(format!("{}/", server.url())),
            "gemini-2.0-flash".to_string(),
            Some(headers),
            Some("gemini".to_string()),
        );

        let response = client
            .chat(
                vec![
                    Message::system("be brief"),
                    Message::user("What is the number for front desk?"),
                ],
                None,
                None,
                None,
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.text_content(), Some("Front desk is 555-0100."));
        assert_eq!(response.finish_reason, "stop");
        assert_eq!(response.usage.get("total_tokens"), Some(&17));
    }

    #[tokio::test]
    async fn test_chat_omits_unset_sampling_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "override",
                "max_tokens": 256
            })))
            .with_status(200)
            .with_body(completion_body("ok"))
            .create_async()
            .await;

        let client = OpenAICompatClient::new(None, Some(server.url()), "m".to_string(), None, None);
        client
            .chat(vec![Message::user("hi")], Some("override".to_string()), Some(256), None)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_surfaces_http_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"quota exceeded"}}"#)
            .create_async()
            .await;

        let client = OpenAICompatClient::new(None, Some(server.url()), "m".to_string(), None, None);
        let err = client
            .chat(vec![Message::user("hi")], None, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::ApiError(_)));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_chat_rejects_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = OpenAICompatClient::new(None, Some(server.url()), "m".to_string(), None, None);
        let err = tokio_test::assert_err!(
            client
                .chat(vec![Message::user("hi")], None, None, None)
                .await
        );
        assert!(matches!(err, ProviderError::JsonError(_)));
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = OpenAICompatClient::new(None, Some(server.url()), "m".to_string(), None, None);
        let err = client
            .chat(vec![Message::user("hi")], None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
