//! Mock chat backend for testing.
//!
//! Provides a scripted implementation of the ChatBackend trait for use in
//! tests and offline demos without a running orchestrator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use jag_flow::{PipelineStep, StepStatus, RESPONSE_STEP};

use crate::backend::ChatBackend;
use crate::error::{ChatError, ChatResult};
use crate::types::ChatReply;

/// Predefined outcome for a send call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with this reply
    Reply(ChatReply),
    /// Fail with a backend error carrying this message
    Failure(String),
    /// Fail as if the body could not be parsed
    Malformed(String),
    /// Never settle
    Stall,
}

impl MockReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Reply(ChatReply::text(content))
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    pub message: String,
    pub bearer: String,
}

/// Mock chat backend.
///
/// Replies are returned in order and cycle once exhausted. With no scripted
/// replies the backend echoes the message back with a minimal flow.
#[derive(Clone, Default)]
pub struct MockBackend {
    replies: Arc<RwLock<Vec<MockReply>>>,
    reply_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl MockBackend {
    /// Create a new mock backend that echoes messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reply for the next send call.
    pub fn add_reply(self, reply: MockReply) -> Self {
        self.replies.write().push(reply);
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    fn next_reply(&self, message: &str) -> MockReply {
        let replies = self.replies.read();
        if replies.is_empty() {
            return MockReply::Reply(Self::echo(message));
        }
        let index = self.reply_index.fetch_add(1, Ordering::SeqCst);
        replies[index % replies.len()].clone()
    }

    fn echo(message: &str) -> ChatReply {
        ChatReply::text(format!("(mock) {}", message)).with_flow(vec![
            PipelineStep::new("router", StepStatus::Completed),
            PipelineStep::new(RESPONSE_STEP, StepStatus::Completed),
        ])
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn send(&self, message: &str, bearer: &str) -> ChatResult<ChatReply> {
        self.captured_calls.write().push(CapturedCall {
            message: message.to_string(),
            bearer: bearer.to_string(),
        });

        match self.next_reply(message) {
            MockReply::Reply(reply) => Ok(reply),
            MockReply::Failure(msg) => Err(ChatError::Backend(msg)),
            MockReply::Malformed(msg) => Err(ChatError::InvalidResponse(msg)),
            MockReply::Stall => std::future::pending().await,
        }
    }
}
