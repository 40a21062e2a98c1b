//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for chat-relay
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Persona configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Remote completion provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Web widget server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
    /// Also write log records to stdout; the rolling file is always written
    #[serde(default = "default_console")]
    pub console: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_console() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
            console: default_console(),
        }
    }
}

/// Persona the assistant speaks as
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent name
    #[serde(default = "default_agent_name")]
    pub name: String,
    /// Static system prompt
    #[serde(default = "default_instructions")]
    pub instructions: String,
    /// First message shown when a chat starts
    #[serde(default = "default_greeting")]
    pub greeting: String,
    /// Interim message shown while a reply is pending
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_agent_name() -> String {
    "Assistant".to_string()
}

/// Telephone directory inquiry operator persona
pub const DEFAULT_INSTRUCTIONS: &str = "As a telephone directory inquiry operator, you are \
responsible for professionally handling incoming calls and providing accurate contact \
information. Begin each call with a polite greeting. Speak clearly and listen attentively to \
understand the caller's request. Confirm the details by asking for clarification if necessary, \
search the directory system efficiently, and provide the correct number, ensuring that the \
caller receives accurate information. If the number is unavailable, suggest an alternative, \
such as the main reception number. For multiple inquiries, prioritize based on urgency and \
politely ask the caller to hold if additional time is needed. If faced with an impatient \
caller, remain calm, professional, and rephrase responses for clarity. In case of unresolved \
issues, escalate them to a supervisor. Maintain logs of frequently requested numbers, report \
any outdated or incorrect information for updates, and always follow security protocols when \
handling sensitive contact details. Your role is crucial in ensuring callers receive prompt \
and reliable assistance while maintaining professionalism and efficiency.";

fn default_instructions() -> String {
    DEFAULT_INSTRUCTIONS.to_string()
}

fn default_greeting() -> String {
    "Hello, this is the Phone number Inquiry Service. How may I assist you?".to_string()
}

fn default_placeholder() -> String {
    "Thinking...".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            instructions: default_instructions(),
            greeting: default_greeting(),
            placeholder: default_placeholder(),
        }
    }
}

/// Remote chat-completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registry name of the provider (gemini, openai, deepseek, ...)
    #[serde(default = "default_provider_name")]
    pub name: String,
    /// API key; usually supplied through the environment
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API; the registry default when unset
    #[serde(default)]
    pub api_base: Option<String>,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Extra HTTP headers sent with every request
    #[serde(default)]
    pub extra_headers: Option<HashMap<String, String>>,
    /// Completion length cap forwarded to the provider
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Sampling temperature forwarded to the provider
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Skip the per-run trace records
    #[serde(default = "default_tracing_disabled")]
    pub tracing_disabled: bool,
}

fn default_provider_name() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_tracing_disabled() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_key: String::new(),
            api_base: None,
            model: default_model(),
            extra_headers: None,
            max_tokens: None,
            temperature: None,
            tracing_disabled: default_tracing_disabled(),
        }
    }
}

impl ProviderConfig {
    /// API key if one is configured
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    /// Configured base URL with blanks treated as unset
    pub fn api_base(&self) -> Option<&str> {
        self.api_base
            .as_deref()
            .map(str::trim)
            .filter(|base| !base.is_empty())
    }
}

/// Web widget server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
