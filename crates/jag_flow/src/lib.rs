//! # jag_flow
//!
//! Agent pipeline model and status rendering for jag-console.
//!
//! The orchestrator behind the chat endpoint reports every run as a flat list
//! of pipeline steps (`router`, `token_exchange`, `sales_agent`, ...,
//! `generate_response`). This crate turns that snapshot into a fixed visual
//! pipeline with one badge per participant agent.
//!
//! # Architecture
//!
//! - **Steps**: `PipelineStep` records as emitted by the orchestrator
//! - **Participants**: the closed set of agents and their static display config
//! - **Render**: pure mapping from a step snapshot to a `FlowView`
//! - **Exchange**: per-agent token exchange records and their summary
//!
//! ```text
//! router ──▶ [S] sales ─┐
//!            [I] inventory ─┤
//!            [C] customer ──┼──▶ response
//!            [P] pricing ───┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use jag_flow::{parse_steps, render_agent_flow, StepStatus, Participant};
//!
//! let steps = parse_steps(r#"[
//!     {"step": "router", "status": "completed", "agents": ["sales"]},
//!     {"step": "sales_agent", "status": "completed"}
//! ]"#).unwrap();
//!
//! let view = render_agent_flow(&steps);
//! assert_eq!(view.participant(Participant::Sales).status, StepStatus::Completed);
//! ```

pub mod error;
pub mod exchange;
pub mod participant;
pub mod render;
pub mod step;

pub use error::{FlowError, FlowResult};
pub use exchange::{summarize, ExchangeStatus, ExchangeSummary, TokenExchange};
pub use participant::{Participant, MUTED_COLOR};
pub use render::{render_agent_flow, Badge, FlowView, ParticipantView};
pub use step::{parse_steps, PipelineStep, StepStatus, RESPONSE_STEP, ROUTER_STEP};
