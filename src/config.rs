//! Configuration for the assistant
//!
//! Loaded from a TOML file; every field has a default so a partial file (or
//! no file at all) works.

use crate::llm::ModelConfig;
use crate::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Speech capture settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Whether a capture collaborator is available at all
    pub enabled: bool,
    /// Simulated time from start to result
    pub latency_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latency_ms: 300,
        }
    }
}

/// Speech synthesis settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Simulated speaking time per word
    pub ms_per_word: u64,
    /// Shortest utterance duration
    pub min_duration_ms: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            ms_per_word: 250,
            min_duration_ms: 400,
        }
    }
}

impl SynthesisConfig {
    /// How long an utterance of `text` takes to speak
    pub fn utterance_duration(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count() as u64;
        Duration::from_millis((words * self.ms_per_word).max(self.min_duration_ms))
    }
}

/// Configuration for the complete assistant
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Reveal animation tick interval
    pub typing_interval_ms: u64,
    /// Event channel buffer size
    pub channel_buffer_size: usize,
    /// Shutdown timeout in milliseconds
    pub shutdown_timeout_ms: u64,
    /// Speech capture settings
    pub capture: CaptureConfig,
    /// Speech synthesis settings
    pub synthesis: SynthesisConfig,
    /// Model collaborator settings
    pub model: ModelConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            typing_interval_ms: 40,
            channel_buffer_size: 100,
            shutdown_timeout_ms: 5000,
            capture: CaptureConfig::default(),
            synthesis: SynthesisConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl AssistantConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ParleyError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let config: AssistantConfig = toml::from_str(&content).map_err(|e| {
            ParleyError::Config(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Platform config location, e.g. `~/.config/parley/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("parley").join("config.toml"))
    }

    /// Load from an explicit path, else the default path if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.typing_interval_ms == 0 {
            return Err(ParleyError::Config(
                "typing_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.channel_buffer_size == 0 {
            return Err(ParleyError::Config(
                "channel_buffer_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.typing_interval_ms)
    }

    /// Set the reveal tick interval
    pub fn with_typing_interval_ms(mut self, interval: u64) -> Self {
        self.typing_interval_ms = interval;
        self
    }

    /// Set the channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }

    /// Set the model configuration
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    /// Disable speech capture (text-only mode)
    pub fn without_capture(mut self) -> Self {
        self.capture.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AssistantConfig::default();
        assert_eq!(config.typing_interval_ms, 40);
        assert_eq!(config.channel_buffer_size, 100);
        assert!(config.capture.enabled);
        assert!(!config.model.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AssistantConfig::new()
            .with_typing_interval_ms(5)
            .with_channel_buffer_size(1000)
            .without_capture();

        assert_eq!(config.typing_interval(), Duration::from_millis(5));
        assert_eq!(config.channel_buffer_size, 1000);
        assert!(!config.capture.enabled);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AssistantConfig = toml::from_str(
            r#"
            typing_interval_ms = 10

            [capture]
            enabled = false

            [[model.rules]]
            contains = "weather"
            reply = "The weather in London is mild."
            "#,
        )
        .unwrap();

        assert_eq!(config.typing_interval_ms, 10);
        assert!(!config.capture.enabled);
        assert_eq!(config.capture.latency_ms, 300);
        assert_eq!(config.synthesis.ms_per_word, 250);
        assert_eq!(config.model.rules.len(), 1);
        assert!(config.model.is_configured());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channel_buffer_size = 7").unwrap();

        let config = AssistantConfig::load(file.path()).unwrap();
        assert_eq!(config.channel_buffer_size, 7);

        let explicit = AssistantConfig::load_or_default(Some(file.path())).unwrap();
        assert_eq!(explicit.channel_buffer_size, 7);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "typing_interval_ms = 0").unwrap();
        assert!(matches!(
            AssistantConfig::load(file.path()),
            Err(ParleyError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = AssistantConfig::load(dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ParleyError::Config(_))));
    }

    #[test]
    fn test_utterance_duration() {
        let synthesis = SynthesisConfig {
            ms_per_word: 100,
            min_duration_ms: 250,
        };
        assert_eq!(
            synthesis.utterance_duration("one two three four"),
            Duration::from_millis(400)
        );
        assert_eq!(synthesis.utterance_duration("hi"), Duration::from_millis(250));
    }
}
