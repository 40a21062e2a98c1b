//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
///
/// Credentials and the model are not checked here: whether a provider needs
/// a key, and which model it defaults to, comes from the provider registry
/// when the provider is bound.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.provider.name.trim().is_empty() {
        errors.push("provider.name must not be empty".to_string());
    }
    if let Some(base) = config.provider.api_base() {
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            errors.push("provider.api_base must be an http(s) URL".to_string());
        }
    }
    if config.provider.max_tokens == Some(0) {
        errors.push("provider.max_tokens must be > 0".to_string());
    }
    if let Some(temperature) = config.provider.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            errors.push("provider.temperature must be in [0.0, 2.0]".to_string());
        }
    }

    if config.agent.name.trim().is_empty() {
        errors.push("agent.name must not be empty".to_string());
    }
    if config.agent.instructions.trim().is_empty() {
        errors.push("agent.instructions must not be empty".to_string());
    }

    if config.server.host.trim().is_empty() {
        errors.push("server.host must not be empty".to_string());
    }
    if config.server.port == 0 {
        errors.push("server.port must be > 0".to_string());
    }

    let format = config.logging.format.to_ascii_lowercase();
    if format != "text" && format != "json" {
        errors.push("logging.format must be text or json".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
