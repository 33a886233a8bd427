//! # jag_chat - Session-gated chat client for jag-console
//!
//! This crate talks to the agent orchestrator's chat endpoint on behalf of a
//! signed-in user:
//! - Conversation history with an in-flight gate
//! - Bearer credential taken from an injected session provider
//! - One `POST /api/chat` per message, with a fixed fallback on failure
//! - Agent flow and token exchange snapshots kept from the latest reply
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ SessionProvider  │────▶│  ChatController  │────▶│   ChatBackend    │
//! └──────────────────┘     └────────┬─────────┘     └──────────────────┘
//!                                   │                  HttpChatBackend
//!                                   ▼                  MockBackend
//!                          ┌──────────────────┐
//!                          │ jag_flow render  │
//!                          └──────────────────┘
//! ```

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod mock;
pub mod session;
pub mod types;

pub use backend::{ChatBackend, HttpChatBackend};
pub use config::ChatConfig;
pub use controller::{ChatController, PendingRequest, SubmitOutcome, SubmitRejected, FALLBACK_REPLY};
pub use error::{ChatError, ChatResult};
pub use mock::{CapturedCall, MockBackend, MockReply};
pub use session::{Session, SessionProvider, SessionStatus, StaticSession, UserProfile};
pub use types::{ChatMessage, ChatReply, ChatRequest, MessageRole};
