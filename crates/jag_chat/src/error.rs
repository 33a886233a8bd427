//! Error types for the chat client.

use thiserror::Error;

/// Result type alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors that can occur while talking to the chat backend.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Not authenticated: no bearer credential")]
    NotAuthenticated,

    #[error("Sign-in unavailable for provider '{provider}': {reason}")]
    SignInUnavailable { provider: String, reason: String },

    #[error("Chat request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Chat endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid chat response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}
