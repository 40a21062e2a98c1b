//! Configuration loading and management

use super::schema::Config;
use super::validate::validate_config;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Prefix for `SECTION__FIELD` style environment overrides
const ENV_PREFIX: &str = "CHAT_RELAY__";

/// Configuration loader
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// `(provider name, env var)` pairs read into `provider.api_key`
    credential_vars: Vec<(String, String)>,
}

impl ConfigLoader {
    /// Create a new config loader with the default config directory
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|h| h.join(".chat-relay"))
            .unwrap_or_else(|| PathBuf::from(".chat-relay"));

        Self {
            config_dir,
            credential_vars: Vec::new(),
        }
    }

    /// Create a new config loader with a custom config directory
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
            credential_vars: Vec::new(),
        }
    }

    /// Environment variables holding each provider's API key, usually taken
    /// from the provider registry
    pub fn with_credential_vars<I, N, K>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (N, K)>,
        N: Into<String>,
        K: Into<String>,
    {
        self.credential_vars = vars
            .into_iter()
            .map(|(name, env_key)| (name.into(), env_key.into()))
            .collect();
        self
    }

    /// Environment variable holding the API key for `provider`, if known
    pub fn credential_var(&self, provider: &str) -> Option<&str> {
        self.credential_vars
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(provider))
            .map(|(_, env_key)| env_key.as_str())
    }

    /// Load configuration from file and environment, then validate it.
    ///
    /// Precedence, lowest first: built-in defaults, `config.json`, the
    /// provider's credential variable (e.g. `GEMINI_API_KEY`), and
    /// `CHAT_RELAY__SECTION__FIELD` overrides.
    pub fn load(&self) -> crate::Result<Config> {
        let config = self.load_unchecked()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration without validation (used by `status`)
    pub fn load_unchecked(&self) -> crate::Result<Config> {
        let config_path = self.config_path();
        let mut merged = serde_json::to_value(Config::default())?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let file_value: Value = serde_json::from_str(&content)?;
            merge_values(&mut merged, file_value);
        }

        apply_path_overrides(&mut merged);
        self.apply_credential_var(&mut merged);

        Ok(serde_json::from_value(merged)?)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the config file path
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    fn apply_credential_var(&self, config: &mut Value) {
        // An explicit path override wins over the provider's credential variable.
        if std::env::var(format!("{ENV_PREFIX}PROVIDER__API_KEY")).is_ok() {
            return;
        }

        let provider = config
            .pointer("/provider/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if let Some(env_key) = self.credential_var(&provider) {
            if let Ok(value) = std::env::var(env_key) {
                let path = ["provider".to_string(), "api_key".to_string()];
                set_path_value(config, &path, Value::String(value));
            }
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    merge_values(existing, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn parse_env_value(raw: &str) -> Value {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        return v;
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}

fn set_path_value(root: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return;
    };

    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Some(map) = current.as_object_mut() else {
            return;
        };
        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Some(map) = current.as_object_mut() {
        map.insert(last.clone(), value);
    }
}

fn apply_path_overrides(config: &mut Value) {
    for (key, value) in std::env::vars() {
        let Some(suffix) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let segments: Vec<String> = suffix
            .split("__")
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase())
            .collect();
        if segments.is_empty() {
            continue;
        }
        // Keys and model names stay strings even when they look numeric.
        let parsed = if matches!(
            segments.last().map(String::as_str),
            Some("api_key" | "model" | "name" | "api_base")
        ) {
            Value::String(value)
        } else {
            parse_env_value(&value)
        };
        set_path_value(config, &segments, parsed);
    }
}
