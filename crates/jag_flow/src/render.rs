//! Agent flow rendering.
//!
//! Maps an orchestrator step snapshot onto the fixed visual pipeline
//! `router → sales, inventory, customer, pricing → response`. Rendering is a
//! pure function of the snapshot: it holds no state and performs no I/O.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::participant::{Participant, MUTED_COLOR};
use crate::step::{PipelineStep, StepStatus, ROUTER_STEP};

/// Badge glyph shown for a stage.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Check,
    Cross,
    Clock,
    Neutral,
}

impl Badge {
    pub fn symbol(&self) -> char {
        match self {
            Self::Check => '✓',
            Self::Cross => '✗',
            Self::Clock => '⏱',
            Self::Neutral => '·',
        }
    }
}

/// Rendered state of one participant.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ParticipantView {
    pub participant: Participant,
    pub status: StepStatus,
    pub badge: Badge,
    pub color: &'static str,
    /// Reduced opacity (denied)
    pub dimmed: bool,
    /// Pulsing animation (pending)
    pub pulsing: bool,
    /// Whether the router selected this participant
    pub involved: bool,
    /// Detail text from the participant's step, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ParticipantView {
    fn new(participant: Participant, status: StepStatus, involved: bool) -> Self {
        let (badge, color) = match status {
            StepStatus::Completed => (Badge::Check, participant.color()),
            StepStatus::Denied => (Badge::Cross, participant.color()),
            StepStatus::Pending => (Badge::Clock, participant.color()),
            StepStatus::Inactive => (Badge::Neutral, MUTED_COLOR),
        };

        Self {
            participant,
            status,
            badge,
            color,
            dimmed: status == StepStatus::Denied,
            pulsing: status == StepStatus::Pending,
            involved,
            detail: None,
        }
    }
}

/// The full rendered pipeline.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FlowView {
    /// Status of the routing stage
    pub router: StepStatus,
    /// One entry per participant, in display order
    pub participants: Vec<ParticipantView>,
    /// Whether the response stage completed
    pub response_completed: bool,
}

impl FlowView {
    /// Get the rendered state of a participant.
    pub fn participant(&self, participant: Participant) -> &ParticipantView {
        // participants always holds every entry of Participant::ALL in order
        &self.participants[participant as usize]
    }

    /// Participants the router selected for this run.
    pub fn involved(&self) -> Vec<Participant> {
        self.participants
            .iter()
            .filter(|p| p.involved)
            .map(|p| p.participant)
            .collect()
    }

    /// Whether nothing in the pipeline has happened yet.
    pub fn is_idle(&self) -> bool {
        self.router == StepStatus::Inactive
            && !self.response_completed
            && self
                .participants
                .iter()
                .all(|p| p.status == StepStatus::Inactive)
    }
}

impl fmt::Display for FlowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let router_badge = if self.router == StepStatus::Completed {
            Badge::Check
        } else {
            Badge::Neutral
        };
        write!(f, "router {} ─▶", router_badge.symbol())?;

        for view in &self.participants {
            write!(
                f,
                " [{} {}]",
                view.participant.glyph(),
                view.badge.symbol()
            )?;
        }

        let response_badge = if self.response_completed {
            Badge::Check
        } else {
            Badge::Neutral
        };
        write!(f, " ─▶ response {}", response_badge.symbol())
    }
}

/// Render a step snapshot into the fixed visual pipeline.
pub fn render_agent_flow(steps: &[PipelineStep]) -> FlowView {
    let visual: Vec<&PipelineStep> = steps.iter().filter(|s| s.is_visual()).collect();

    let routers: Vec<&PipelineStep> = visual.iter().copied().filter(|s| s.is_router()).collect();
    let selecting_router = routers.iter().copied().find(|s| !s.participants.is_empty());

    if routers.iter().filter(|s| !s.participants.is_empty()).count() > 1 {
        debug!("Multiple {} steps carry participants, using the first", ROUTER_STEP);
    }

    let involved: Vec<Participant> = selecting_router
        .map(|s| {
            s.participants
                .iter()
                .filter_map(|id| Participant::from_id(id))
                .collect()
        })
        .unwrap_or_default();

    let router = selecting_router
        .or_else(|| routers.first().copied())
        .map(|s| s.status)
        .unwrap_or(StepStatus::Inactive);

    let participants = Participant::ALL
        .into_iter()
        .map(|participant| {
            let is_involved = involved.contains(&participant);
            let step = visual
                .iter()
                .copied()
                .find(|s| s.step == participant.step_id());

            let status = match step {
                Some(s) => s.status,
                None if is_involved => StepStatus::Pending,
                None => StepStatus::Inactive,
            };

            let mut view = ParticipantView::new(participant, status, is_involved);
            view.detail = step.and_then(|s| s.detail.clone());
            view
        })
        .collect();

    let response_completed = steps
        .iter()
        .any(|s| s.is_response() && s.status == StepStatus::Completed);

    FlowView {
        router,
        participants,
        response_completed,
    }
}
