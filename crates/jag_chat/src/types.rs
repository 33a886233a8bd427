//! Core types for the chat client.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use jag_flow::{PipelineStep, TokenExchange};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID (UUID)
    pub id: String,
    /// Role of the message sender
    pub role: MessageRole,
    /// Message content
    pub content: String,
    /// When the message was created
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

/// Body of a chat request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
}

/// Body of a successful chat response.
///
/// `content` is required; a body without it is rejected as invalid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    /// Pipeline steps the orchestrator ran for this message
    #[serde(default, deserialize_with = "supplementary")]
    pub agent_flow: Vec<PipelineStep>,
    /// Token exchanges performed for this message
    #[serde(default, deserialize_with = "supplementary")]
    pub token_exchanges: Vec<TokenExchange>,
}

/// Decode an optional reply field, falling back to empty when it is `null`
/// or malformed so the reply content is never lost over it.
fn supplementary<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring malformed reply field");
        T::default()
    }))
}

impl ChatReply {
    /// Create a reply carrying only text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            agent_flow: Vec::new(),
            token_exchanges: Vec::new(),
        }
    }

    pub fn with_flow(mut self, steps: Vec<PipelineStep>) -> Self {
        self.agent_flow = steps;
        self
    }

    pub fn with_exchanges(mut self, exchanges: Vec<TokenExchange>) -> Self {
        self.token_exchanges = exchanges;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, MessageRole::User);
        assert!(user.is_user());

        let assistant = ChatMessage::assistant("Hi there");
        assert_eq!(assistant.role, MessageRole::Assistant);
        assert_ne!(user.id, assistant.id);
    }

    #[test]
    fn test_reply_requires_content() {
        assert!(serde_json::from_str::<ChatReply>(r#"{"answer": "hi"}"#).is_err());

        let reply: ChatReply = serde_json::from_str(r#"{"content": "hi"}"#).unwrap();
        assert_eq!(reply, ChatReply::text("hi"));
    }

    #[test]
    fn test_reply_survives_odd_flow() {
        let reply: ChatReply = serde_json::from_str(
            r#"{"content": "Hi there",
                "agent_flow": [{"step": "router", "status": null, "agents": null}],
                "token_exchanges": null}"#,
        )
        .unwrap();
        assert_eq!(reply.content, "Hi there");
        assert_eq!(reply.agent_flow.len(), 1);
        assert!(reply.token_exchanges.is_empty());

        let reply: ChatReply =
            serde_json::from_str(r#"{"content": "Hi there", "agent_flow": "oops"}"#).unwrap();
        assert_eq!(reply.content, "Hi there");
        assert!(reply.agent_flow.is_empty());
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ChatRequest {
            message: "Check basketball stock".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"message": "Check basketball stock"}));
    }
}
