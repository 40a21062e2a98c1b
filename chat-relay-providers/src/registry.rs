//! Provider registry - single source of truth for OpenAI-compatible endpoint metadata

use serde::{Deserialize, Serialize};

/// One provider's metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    // Identity
    pub name: String,
    pub display_name: String,
    pub env_key: String,

    // Endpoint defaults
    pub default_api_base: String,
    pub default_model: String,

    // Local endpoints accept requests without a key
    #[serde(default)]
    pub is_local: bool,
}

impl ProviderSpec {
    pub fn label(&self) -> String {
        if !self.display_name.is_empty() {
            self.display_name.clone()
        } else {
            let mut name = self.name.clone();
            if let Some(first_char) = name.chars().next() {
                name = first_char.to_uppercase().to_string() + &name[first_char.len_utf8()..];
            }
            name
        }
    }

    /// Whether requests need an API key
    pub fn requires_api_key(&self) -> bool {
        !self.is_local
    }
}

/// Registry of available providers
pub struct ProviderRegistry {
    providers: Vec<ProviderSpec>,
}

impl ProviderRegistry {
    /// Create a new provider registry with default providers
    pub fn new() -> Self {
        Self {
            providers: Self::default_providers(),
        }
    }

    /// Get all provider specs
    pub fn all(&self) -> &[ProviderSpec] {
        &self.providers
    }

    /// Find a provider by config name (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&ProviderSpec> {
        self.providers
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(name))
    }

    /// `(provider name, env var)` pairs for every provider that reads its
    /// key from the environment
    pub fn credential_vars(&self) -> Vec<(String, String)> {
        self.providers
            .iter()
            .filter(|spec| !spec.env_key.is_empty())
            .map(|spec| (spec.name.clone(), spec.env_key.clone()))
            .collect()
    }

    fn default_providers() -> Vec<ProviderSpec> {
        let yaml = include_str!("providers.yaml");
        serde_yaml::from_str(yaml).expect("Failed to parse default providers configuration")
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
