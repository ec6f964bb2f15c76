//! Conversation history kept by a model session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in the conversation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant response
    Assistant,
}

impl MessageRole {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single message in the conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Manages conversation history for one session
///
/// The system prompt is always first; the oldest exchanges are dropped once
/// `max_messages` is exceeded.
#[derive(Clone, Debug)]
pub struct ConversationContext {
    system_prompt: String,
    messages: Vec<ConversationMessage>,
    max_messages: usize,
}

impl ConversationContext {
    /// Create a new conversation context with a system prompt
    pub fn new(system_prompt: impl Into<String>, max_messages: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
            max_messages: max_messages.max(1),
        }
    }

    /// Add a user message to the conversation
    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.push(ConversationMessage::new(MessageRole::User, content));
    }

    /// Add an assistant message to the conversation
    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.push(ConversationMessage::new(MessageRole::Assistant, content));
    }

    fn push(&mut self, message: ConversationMessage) {
        self.messages.push(message);
        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(..excess);
        }
    }

    /// All messages including the system prompt
    pub fn messages(&self) -> Vec<ConversationMessage> {
        let mut result = vec![ConversationMessage::new(
            MessageRole::System,
            self.system_prompt.clone(),
        )];
        result.extend(self.messages.iter().cloned());
        result
    }

    /// Number of messages in history (excluding system prompt)
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_context() {
        let mut ctx = ConversationContext::new("You are a test assistant.", 10);

        assert_eq!(ctx.message_count(), 0);

        ctx.add_user_message("Hello");
        ctx.add_assistant_message("Hi there!");
        assert_eq!(ctx.message_count(), 2);

        let messages = ctx.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, "You are a test assistant.");
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[2].role, MessageRole::Assistant);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut ctx = ConversationContext::new("System", 3);
        for i in 0..5 {
            ctx.add_user_message(format!("message {i}"));
        }

        assert_eq!(ctx.message_count(), 3);
        let messages = ctx.messages();
        assert_eq!(messages[1].content, "message 2");
        assert_eq!(messages[3].content, "message 4");
    }
}
