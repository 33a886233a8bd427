//! Chat backend seam and its HTTP implementation.

use async_trait::async_trait;
use tracing::debug;

use crate::config::ChatConfig;
use crate::error::{ChatError, ChatResult};
use crate::types::{ChatReply, ChatRequest};

/// Something that answers chat messages on behalf of a user.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one message, authorized with the user's bearer credential.
    async fn send(&self, message: &str, bearer: &str) -> ChatResult<ChatReply>;
}

/// Backend reached over HTTP at `<base>/api/chat`.
pub struct HttpChatBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChatBackend {
    /// Create a backend from configuration.
    pub fn new(config: &ChatConfig) -> ChatResult<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: config.chat_endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, message: &str, bearer: &str) -> ChatResult<ChatReply> {
        if bearer.trim().is_empty() {
            return Err(ChatError::NotAuthenticated);
        }

        debug!("POST {}", self.endpoint);

        let request = ChatRequest {
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", bearer))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ChatError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}
