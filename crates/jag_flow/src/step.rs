//! Pipeline step records as reported by the orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FlowError, FlowResult};

/// Identifier of the routing step.
pub const ROUTER_STEP: &str = "router";

/// Identifier of the final response synthesis step.
pub const RESPONSE_STEP: &str = "generate_response";

/// Status of a pipeline step.
///
/// Any status outside the four known values (the orchestrator also emits
/// `processing` for in-progress steps, and `null` or non-string values are
/// possible) is read as `Inactive`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase", from = "Value")]
pub enum StepStatus {
    Pending,
    Completed,
    Denied,
    #[default]
    Inactive,
}

impl StepStatus {
    /// Parse a status string, falling back to `Inactive`.
    pub fn parse(value: &str) -> Self {
        match value {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "denied" => Self::Denied,
            _ => Self::Inactive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Denied => "denied",
            Self::Inactive => "inactive",
        }
    }
}

impl From<Value> for StepStatus {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::parse(&s),
            _ => Self::Inactive,
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single step in an orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineStep {
    /// Step identifier (`router`, `sales_agent`, `generate_response`, ...)
    pub step: String,
    /// Step status
    #[serde(default)]
    pub status: StepStatus,
    /// Participants selected by the router (only meaningful on `router`)
    #[serde(
        rename = "agents",
        default,
        deserialize_with = "lenient_participants",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub participants: Vec<String>,
    /// Human readable action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Extra detail, e.g. the scopes that were denied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PipelineStep {
    /// Create a step with the given identifier and status.
    pub fn new(step: impl Into<String>, status: StepStatus) -> Self {
        Self {
            step: step.into(),
            status,
            participants: Vec::new(),
            action: None,
            detail: None,
        }
    }

    /// Create a router step that selected the given participants.
    pub fn router<I, S>(status: StepStatus, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            participants: participants.into_iter().map(Into::into).collect(),
            ..Self::new(ROUTER_STEP, status)
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_router(&self) -> bool {
        self.step == ROUTER_STEP
    }

    pub fn is_response(&self) -> bool {
        self.step == RESPONSE_STEP
    }

    /// Whether the step takes part in the visual pipeline.
    pub fn is_visual(&self) -> bool {
        self.step.contains("agent") || self.is_router() || self.is_response()
    }
}

/// `agents` may be `null` or hold non-string entries; keep only the ids.
fn lenient_participants<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(id) => Some(id),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Parse a step snapshot from JSON.
///
/// Accepts either a bare array of steps or a chat reply object carrying an
/// `agent_flow` array.
pub fn parse_steps(json: &str) -> FlowResult<Vec<PipelineStep>> {
    let value: Value = serde_json::from_str(json)?;
    let steps = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map.remove("agent_flow").ok_or_else(|| {
            FlowError::InvalidSnapshot("object has no `agent_flow` field".to_string())
        })?,
        other => {
            return Err(FlowError::InvalidSnapshot(format!(
                "expected an array or object, got {}",
                other
            )))
        }
    };
    Ok(serde_json::from_value(steps)?)
}
