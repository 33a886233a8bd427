//! Chat session controller.
//!
//! Owns the conversation history and the in-flight flag, and issues one
//! authenticated request per submitted message. A submit is split in two:
//! [`ChatController::begin`] runs the precondition gate and appends the user
//! message synchronously, [`PendingRequest::complete`] awaits the backend and
//! appends the reply. Every failure past the gate ends as the fixed
//! [`FALLBACK_REPLY`] in the history; nothing escapes to the caller.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, warn};

use jag_flow::{render_agent_flow, FlowView, PipelineStep, TokenExchange};

use crate::backend::ChatBackend;
use crate::session::{Session, SessionProvider};
use crate::types::ChatMessage;

/// Assistant message appended when a request fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Why a submit was refused. No request is sent and no state changes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("message is empty")]
    EmptyMessage,

    #[error("not signed in")]
    Unauthenticated,

    #[error("a request is already in flight")]
    InFlight,
}

/// How a submitted request settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The reply was appended
    Replied,
    /// The request failed and the fallback message was appended
    Failed,
    /// The controller was dropped or cleared before the reply arrived
    Discarded,
}

#[derive(Debug, Default)]
struct ChatState {
    messages: Vec<ChatMessage>,
    draft: String,
    pending: bool,
    flow: Vec<PipelineStep>,
    exchanges: Vec<TokenExchange>,
    /// Bumped by `clear`; requests begun in an older epoch are discarded.
    epoch: u64,
}

/// Conversation controller bound to one backend and one session provider.
pub struct ChatController {
    state: Arc<RwLock<ChatState>>,
    backend: Arc<dyn ChatBackend>,
    session: Arc<dyn SessionProvider>,
}

impl ChatController {
    pub fn new(backend: Arc<dyn ChatBackend>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            state: Arc::new(RwLock::new(ChatState::default())),
            backend,
            session,
        }
    }

    /// Gate a submit and record the user message.
    ///
    /// On success the trimmed message is in the history, the draft is
    /// cleared and the controller is pending until the returned request
    /// completes or is dropped.
    pub fn begin(&self, draft: &str) -> Result<PendingRequest, SubmitRejected> {
        let text = draft.trim();
        if text.is_empty() {
            debug!("Ignoring empty message");
            return Err(SubmitRejected::EmptyMessage);
        }

        let session = self.session.session();
        let bearer = match session.bearer() {
            Some(token) => token.to_string(),
            None => {
                debug!("Ignoring message, session is {:?}", session.status);
                return Err(SubmitRejected::Unauthenticated);
            }
        };

        let epoch = {
            let mut state = self.state.write();
            if state.pending {
                debug!("Ignoring message, a request is already in flight");
                return Err(SubmitRejected::InFlight);
            }
            state.messages.push(ChatMessage::user(text));
            state.draft.clear();
            state.pending = true;
            state.epoch
        };

        debug!("Submitting chat message ({} chars)", text.len());

        Ok(PendingRequest {
            message: text.to_string(),
            bearer,
            backend: Arc::clone(&self.backend),
            guard: PendingGuard {
                state: Arc::downgrade(&self.state),
                epoch,
                settled: false,
            },
        })
    }

    /// Submit a message and wait for it to settle.
    pub async fn submit(&self, draft: &str) -> Result<SubmitOutcome, SubmitRejected> {
        let request = self.begin(draft)?;
        Ok(request.complete().await)
    }

    /// Submit the current draft.
    pub async fn submit_draft(&self) -> Result<SubmitOutcome, SubmitRejected> {
        let draft = self.draft();
        self.submit(&draft).await
    }

    pub fn set_draft(&self, draft: impl Into<String>) {
        self.state.write().draft = draft.into();
    }

    pub fn draft(&self) -> String {
        self.state.read().draft.clone()
    }

    /// Conversation history in display order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.read().messages.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state.read().pending
    }

    /// Whether input should be enabled: signed in and nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.session.session().is_authenticated() && !self.is_pending()
    }

    pub fn session(&self) -> Session {
        self.session.session()
    }

    /// Step snapshot from the most recent successful reply.
    pub fn flow_steps(&self) -> Vec<PipelineStep> {
        self.state.read().flow.clone()
    }

    /// Rendered agent flow for the most recent successful reply.
    pub fn flow_view(&self) -> FlowView {
        render_agent_flow(&self.state.read().flow)
    }

    /// Token exchanges from the most recent successful reply.
    pub fn token_exchanges(&self) -> Vec<TokenExchange> {
        self.state.read().exchanges.clone()
    }

    /// Drop the conversation. Replies still in flight are discarded.
    pub fn clear(&self) {
        let mut state = self.state.write();
        let epoch = state.epoch.wrapping_add(1);
        *state = ChatState {
            epoch,
            ..ChatState::default()
        };
    }
}

/// A request that passed the gate and has not settled yet.
pub struct PendingRequest {
    message: String,
    bearer: String,
    backend: Arc<dyn ChatBackend>,
    guard: PendingGuard,
}

impl PendingRequest {
    /// The trimmed message being sent.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Send the request and record its outcome.
    pub async fn complete(self) -> SubmitOutcome {
        let PendingRequest {
            message,
            bearer,
            backend,
            mut guard,
        } = self;

        let result = backend.send(&message, &bearer).await;
        guard.settled = true;

        let Some(state) = guard.state.upgrade() else {
            debug!("Discarding chat reply, conversation is gone");
            return SubmitOutcome::Discarded;
        };

        let mut state = state.write();
        if state.epoch != guard.epoch {
            debug!("Discarding chat reply, conversation was cleared");
            return SubmitOutcome::Discarded;
        }

        state.pending = false;
        match result {
            Ok(reply) => {
                state.messages.push(ChatMessage::assistant(reply.content));
                state.flow = reply.agent_flow;
                state.exchanges = reply.token_exchanges;
                SubmitOutcome::Replied
            }
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                state.messages.push(ChatMessage::assistant(FALLBACK_REPLY));
                SubmitOutcome::Failed
            }
        }
    }
}

/// Clears the pending flag however the request ends, including when the
/// `complete` future is dropped before it settles.
struct PendingGuard {
    state: Weak<RwLock<ChatState>>,
    epoch: u64,
    /// Set once `complete` has recorded the outcome itself.
    settled: bool,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.write();
        if state.epoch == self.epoch {
            state.pending = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockReply};
    use crate::session::{MockSessionProvider, UserProfile};

    fn signed_in() -> Arc<MockSessionProvider> {
        let mut session = MockSessionProvider::new();
        session
            .expect_session()
            .returning(|| Session::authenticated("id-token", UserProfile::default()));
        Arc::new(session)
    }

    fn signed_out() -> Arc<MockSessionProvider> {
        let mut session = MockSessionProvider::new();
        session.expect_session().returning(Session::unauthenticated);
        Arc::new(session)
    }

    #[test]
    fn test_begin_appends_before_send() {
        let backend = MockBackend::new();
        let controller = ChatController::new(Arc::new(backend.clone()), signed_in());
        controller.set_draft("  Hello  ");

        let request = controller.begin(&controller.draft()).unwrap();

        assert_eq!(request.message(), "Hello");
        let messages = controller.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Hello");
        assert!(messages[0].is_user());
        assert!(controller.is_pending());
        assert_eq!(controller.draft(), "");
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_empty_rejected_without_session_lookup() {
        // no expectations: a session lookup would panic
        let session = Arc::new(MockSessionProvider::new());
        let controller = ChatController::new(Arc::new(MockBackend::new()), session);

        assert_eq!(controller.begin("").err(), Some(SubmitRejected::EmptyMessage));
        assert_eq!(controller.begin(" \t\n").err(), Some(SubmitRejected::EmptyMessage));
        assert!(controller.messages().is_empty());
    }

    #[test]
    fn test_unauthenticated_rejected() {
        let backend = MockBackend::new();
        let controller = ChatController::new(Arc::new(backend.clone()), signed_out());
        controller.set_draft("Hello");

        assert_eq!(controller.begin("Hello").err(), Some(SubmitRejected::Unauthenticated));
        assert!(controller.messages().is_empty());
        assert!(!controller.is_pending());
        assert_eq!(controller.draft(), "Hello");
        assert!(!controller.can_submit());
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_second_begin_while_pending_rejected() {
        let controller = ChatController::new(Arc::new(MockBackend::new()), signed_in());

        let _first = controller.begin("one").unwrap();
        assert!(!controller.can_submit());
        assert_eq!(controller.begin("two").err(), Some(SubmitRejected::InFlight));
        assert_eq!(controller.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_appended() {
        let backend = MockBackend::new().add_reply(MockReply::text("Hi there"));
        let controller = ChatController::new(Arc::new(backend.clone()), signed_in());

        let outcome = controller.submit("Hello").await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Replied);
        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Hi there");
        assert!(!messages[1].is_user());
        assert!(!controller.is_pending());
        assert!(controller.can_submit());

        let calls = backend.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].message, "Hello");
        assert_eq!(calls[0].bearer, "id-token");
    }

    #[tokio::test]
    async fn test_failure_appends_fallback() {
        let backend = MockBackend::new()
            .add_reply(MockReply::failure("connection refused"))
            .add_reply(MockReply::Malformed("missing field `content`".to_string()));
        let controller = ChatController::new(Arc::new(backend), signed_in());

        assert_eq!(controller.submit("one").await, Ok(SubmitOutcome::Failed));
        assert_eq!(controller.submit("two").await, Ok(SubmitOutcome::Failed));

        let contents: Vec<String> = controller.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["one", FALLBACK_REPLY, "two", FALLBACK_REPLY]);
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_flow() {
        let reply = jag_flow::parse_steps(
            r#"[{"step": "router", "status": "completed", "agents": ["sales"]}]"#,
        )
        .unwrap();
        let backend = MockBackend::new()
            .add_reply(MockReply::Reply(crate::types::ChatReply::text("ok").with_flow(reply)))
            .add_reply(MockReply::failure("down"));
        let controller = ChatController::new(Arc::new(backend), signed_in());

        controller.submit("first").await.unwrap();
        assert_eq!(controller.flow_steps().len(), 1);

        controller.submit("second").await.unwrap();
        assert_eq!(controller.flow_steps().len(), 1);
        assert_eq!(controller.flow_view().involved(), vec![jag_flow::Participant::Sales]);
    }

    #[tokio::test]
    async fn test_dropped_controller_discards_reply() {
        let controller = ChatController::new(Arc::new(MockBackend::new()), signed_in());
        let request = controller.begin("Hello").unwrap();
        drop(controller);

        assert_eq!(request.complete().await, SubmitOutcome::Discarded);
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight_reply() {
        let controller = ChatController::new(Arc::new(MockBackend::new()), signed_in());
        let stale = controller.begin("old").unwrap();

        controller.clear();
        assert!(!controller.is_pending());

        let fresh = controller.begin("new").unwrap();
        assert_eq!(stale.complete().await, SubmitOutcome::Discarded);
        // the stale request must not clear the fresh one's pending flag
        assert!(controller.is_pending());

        assert_eq!(fresh.complete().await, SubmitOutcome::Replied);
        let contents: Vec<String> = controller.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["new", "(mock) new"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_clear_racing_completion_never_leaks_stale_reply() {
        for _ in 0..200 {
            let controller = ChatController::new(Arc::new(MockBackend::new()), signed_in());
            let stale = controller.begin("old").unwrap();

            let settle = tokio::spawn(stale.complete());
            controller.clear();
            let _fresh = controller.begin("new").unwrap();
            settle.await.unwrap();

            let contents: Vec<String> =
                controller.messages().into_iter().map(|m| m.content).collect();
            assert_eq!(contents, vec!["new"]);
            assert!(controller.is_pending());
        }
    }
}
