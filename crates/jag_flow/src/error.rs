//! Error types for the flow module.

use thiserror::Error;

/// Result type alias for flow operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors that can occur while loading step snapshots.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Invalid step snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
