//! Chat model abstraction.
//!
//! The query pipeline only sees the [`ChatModel`] trait; concrete backends live
//! in submodules.

mod openai;

pub use openai::OpenAIChatModel;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a message in a chat completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
        }
    }
}

/// A role-tagged turn sent to the chat model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Trait for chat completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a single completion for the given messages.
    ///
    /// An empty string is a valid completion; transport and protocol problems
    /// are returned as errors.
    async fn complete(&self, messages: &[Message], max_tokens: u32) -> Result<String>;

    /// Model identifier, for logs and status output.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let system = Message::system("be nice");
        assert_eq!(system.role, Role::System);
        assert_eq!(system.content, "be nice");

        let user = Message::user(String::from("hello"));
        assert_eq!(user.role, Role::User);
        assert_eq!(user.role.to_string(), "user");
    }

    #[test]
    fn test_message_serializes_like_chat_api() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
