//! Error types for the Parley assistant
//!
//! Most of these never reach a caller: the orchestrator turns them into a
//! spoken apology and returns to idle. They exist so collaborators can report
//! what went wrong and so logs can say it precisely.

use thiserror::Error;

/// Parley errors
#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    /// The model collaborator is not available (unconfigured deployment)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No speech capture capability on this platform
    #[error("Unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// A model request failed after being sent
    #[error("Transport error: {0}")]
    Transport(String),

    /// A model reply is not a recognized structured command
    #[error("Parse error: {0}")]
    Parse(String),

    /// A device command named a device outside the fixed set
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// Speech capture or synthesis collaborator failure
    #[error("Speech error: {0}")]
    Speech(String),

    /// Channel communication error
    #[error("Channel error: {0}")]
    Channel(String),

    /// File system I/O error
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Scenario file could not be loaded or failed validation
    #[error("Scenario error: {0}")]
    Scenario(String),
}

impl From<std::io::Error> for ParleyError {
    fn from(e: std::io::Error) -> Self {
        ParleyError::Io(e.to_string())
    }
}

impl ParleyError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the assistant usable for the next turn.
    /// Non-recoverable ones disable a capability until restart.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Missing model session stays missing for the whole run
            ParleyError::Configuration(_) => false,
            ParleyError::UnsupportedEnvironment(_) => false,
            // Next request may well succeed
            ParleyError::Transport(_) => true,
            ParleyError::Parse(_) => true,
            ParleyError::UnknownDevice(_) => true,
            ParleyError::Speech(_) => true,
            ParleyError::Channel(_) => false,
            ParleyError::Io(_) => false,
            ParleyError::Config(_) => false,
            ParleyError::Scenario(_) => false,
        }
    }

    /// Get a user-friendly description of the error
    pub fn user_message(&self) -> String {
        match self {
            ParleyError::Configuration(_) => {
                "The language model is not configured. Please check your configuration.".to_string()
            }
            ParleyError::UnsupportedEnvironment(_) => {
                "Speech recognition is not supported here. Please type your message instead."
                    .to_string()
            }
            ParleyError::Transport(_) => {
                "I'm sorry, I'm having a bit of trouble right now. Please try again later."
                    .to_string()
            }
            ParleyError::Parse(_) => "Sorry, I didn't understand that command.".to_string(),
            ParleyError::UnknownDevice(_) => "I don't know that device.".to_string(),
            ParleyError::Speech(_) => "Speech failed. Please try again.".to_string(),
            ParleyError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            ParleyError::Io(_) => "File system error occurred.".to_string(),
            ParleyError::Config(_) => "Configuration error. Please check settings.".to_string(),
            ParleyError::Scenario(_) => "Scenario could not be run.".to_string(),
        }
    }
}

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, ParleyError>;
