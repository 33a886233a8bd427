//! The fixed set of participant agents and their display configuration.

use serde::{Deserialize, Serialize};

/// Color used for stages that took no part in a run.
pub const MUTED_COLOR: &str = "#9ca3af";

/// A participant agent in the pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Participant {
    Sales,
    Inventory,
    Customer,
    Pricing,
}

impl Participant {
    /// All participants in display order.
    pub const ALL: [Participant; 4] = [
        Participant::Sales,
        Participant::Inventory,
        Participant::Customer,
        Participant::Pricing,
    ];

    /// Identifier used by the router (`sales`, `inventory`, ...).
    pub fn id(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Inventory => "inventory",
            Self::Customer => "customer",
            Self::Pricing => "pricing",
        }
    }

    /// Identifier of this participant's pipeline step.
    pub fn step_id(&self) -> &'static str {
        match self {
            Self::Sales => "sales_agent",
            Self::Inventory => "inventory_agent",
            Self::Customer => "customer_agent",
            Self::Pricing => "pricing_agent",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Sales => "Sales Agent",
            Self::Inventory => "Inventory Agent",
            Self::Customer => "Customer Agent",
            Self::Pricing => "Pricing Agent",
        }
    }

    /// Single-letter glyph shown inside the badge.
    pub fn glyph(&self) -> char {
        match self {
            Self::Sales => 'S',
            Self::Inventory => 'I',
            Self::Customer => 'C',
            Self::Pricing => 'P',
        }
    }

    /// Badge color (hex).
    pub fn color(&self) -> &'static str {
        match self {
            Self::Sales => "#3b82f6",
            Self::Inventory => "#10b981",
            Self::Customer => "#8b5cf6",
            Self::Pricing => "#f59e0b",
        }
    }

    /// Look up a participant by router identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
