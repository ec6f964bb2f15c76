//! Model collaborator
//!
//! The assistant talks to a language model through `ModelSession`: one text
//! message in, one reply out, inside a persistent conversation. How the
//! session reaches a provider is its own business.
//!
//! - **config**: model settings and scripted reply rules
//! - **context**: conversation history
//! - **prompts**: the system prompt describing the command vocabulary
//! - **scripted**: a keyword-rule session used by the binary and tests

pub mod config;
pub mod context;
pub mod prompts;
pub mod scripted;

pub use config::{ModelConfig, ReplyRule};
pub use context::{ConversationContext, ConversationMessage, MessageRole};
pub use prompts::SYSTEM_PROMPT;
pub use scripted::ScriptedModel;

use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// A persistent conversation with the model
#[async_trait]
pub trait ModelSession: Send + Sync {
    /// Send one user message and wait for the reply text
    ///
    /// Fails with `ParleyError::Transport` when the request does not succeed.
    async fn send_message(&self, message: &str) -> Result<String>;
}

/// Create the model session for this deployment
///
/// Returns `None` when the deployment is unconfigured; callers degrade to
/// apologizing instead of failing.
pub fn create_session(config: &ModelConfig) -> Option<Arc<dyn ModelSession>> {
    if !config.is_configured() {
        warn!("Model session not configured: no reply rules and no fallback");
        return None;
    }
    info!(
        "Model session ready ({} rules, fallback: {})",
        config.rules.len(),
        config.fallback.is_some()
    );
    Some(Arc::new(ScriptedModel::new(config.clone())))
}
