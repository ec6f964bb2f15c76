//! Keyword-scripted model session
//!
//! Stands in for a hosted model: keeps the same conversation history a real
//! session would, builds the request from it, and answers the latest user
//! turn of that request from configured rules after a simulated delay.

use crate::llm::config::ModelConfig;
use crate::llm::context::{ConversationContext, ConversationMessage, MessageRole};
use crate::llm::ModelSession;
use crate::{ParleyError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::debug;

pub struct ScriptedModel {
    config: ModelConfig,
    context: Mutex<ConversationContext>,
}

impl ScriptedModel {
    pub fn new(config: ModelConfig) -> Self {
        let context = ConversationContext::new(config.system_prompt.clone(), config.max_history);
        Self {
            config,
            context: Mutex::new(context),
        }
    }

    fn answer(&self, request: &[ConversationMessage]) -> Result<String> {
        let message = request
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .ok_or_else(|| ParleyError::Transport("request has no user turn".to_string()))?;

        match self.config.rules.iter().find(|rule| rule.matches(message)) {
            Some(rule) if rule.fail => Err(ParleyError::Transport(format!(
                "request matching '{}' failed",
                rule.contains
            ))),
            Some(rule) => Ok(rule.reply.clone()),
            None => self
                .config
                .fallback
                .clone()
                .ok_or_else(|| ParleyError::Transport("no reply available".to_string())),
        }
    }
}

#[async_trait]
impl ModelSession for ScriptedModel {
    async fn send_message(&self, message: &str) -> Result<String> {
        let request = {
            let mut context = self.context.lock();
            context.add_user_message(message);
            context.messages()
        };
        debug!("Request carries {} messages", request.len());

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        let reply = self.answer(&request)?;
        debug!("Scripted reply: {}", reply);
        self.context.lock().add_assistant_message(reply.clone());
        Ok(reply)
    }
}
