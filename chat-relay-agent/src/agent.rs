//! Static persona definition

use chat_relay_core::config::AgentConfig;
use chat_relay_providers::Message;

/// A named persona with fixed instructions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    name: String,
    instructions: String,
}

impl Agent {
    /// Create a new agent
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
        }
    }

    /// Create the agent described by the configuration
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.name.clone(), config.instructions.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Instructions as the leading system message of a request
    pub fn system_message(&self) -> Message {
        Message::system(self.instructions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_relay_providers::Role;

    #[test]
    fn test_from_default_config() {
        let agent = Agent::from_config(&AgentConfig::default());
        assert_eq!(agent.name(), "Assistant");
        assert!(agent.instructions().contains("telephone directory"));

        let system = agent.system_message();
        assert_eq!(system.role, Role::System);
        assert_eq!(system.content, agent.instructions());
    }
}
