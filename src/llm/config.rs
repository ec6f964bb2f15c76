//! Configuration for the model collaborator

use crate::llm::prompts::SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};

/// One keyword rule of the scripted model
///
/// The first rule whose `contains` appears in the user message (ignoring
/// case) answers it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyRule {
    /// Substring to look for
    pub contains: String,
    /// Reply text (plain text or a JSON command)
    pub reply: String,
    /// Fail the request with a transport error instead of replying
    pub fail: bool,
}

impl ReplyRule {
    pub fn new(contains: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            contains: contains.into(),
            reply: reply.into(),
            fail: false,
        }
    }

    /// A rule that makes matching requests fail
    pub fn failing(contains: impl Into<String>) -> Self {
        Self {
            contains: contains.into(),
            reply: String::new(),
            fail: true,
        }
    }

    pub fn matches(&self, message: &str) -> bool {
        message
            .to_lowercase()
            .contains(&self.contains.to_lowercase())
    }
}

/// Configuration for the model session
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// System prompt given to the session
    pub system_prompt: String,
    /// Simulated round-trip time
    pub latency_ms: u64,
    /// Maximum number of history messages kept in the session
    pub max_history: usize,
    /// Keyword rules, checked in order
    pub rules: Vec<ReplyRule>,
    /// Reply when no rule matches
    pub fallback: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            latency_ms: 600,
            max_history: 40,
            rules: Vec::new(),
            fallback: None,
        }
    }
}

impl ModelConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// An unconfigured deployment has nothing to answer with
    pub fn is_configured(&self) -> bool {
        !self.rules.is_empty() || self.fallback.is_some()
    }

    /// Add a keyword rule
    pub fn with_rule(mut self, rule: ReplyRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set the fallback reply
    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    /// Set the simulated latency
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.system_prompt, SYSTEM_PROMPT);
    }

    #[test]
    fn test_model_config_builder() {
        let config = ModelConfig::new()
            .with_rule(ReplyRule::new("weather", "Sunny."))
            .with_fallback("I'm not sure.")
            .with_latency_ms(5);

        assert!(config.is_configured());
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.latency_ms, 5);
    }

    #[test]
    fn test_rule_matching_ignores_case() {
        let rule = ReplyRule::new("Bedroom Light", "{}");
        assert!(rule.matches("turn off the bedroom light"));
        assert!(!rule.matches("turn off the kitchen light"));
        assert!(ReplyRule::failing("x").fail);
    }
}
