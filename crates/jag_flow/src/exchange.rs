//! Token exchange records.
//!
//! For every participant the router selects, the orchestrator exchanges the
//! user's ID token for an agent-scoped access token. Each attempt is reported
//! back as a `TokenExchange` record alongside the step snapshot.

use serde::{Deserialize, Serialize};

/// Outcome of a single token exchange.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ExchangeStatus {
    Granted,
    Denied,
    Error,
}

impl From<String> for ExchangeStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "granted" => Self::Granted,
            "denied" => Self::Denied,
            _ => Self::Error,
        }
    }
}

/// A token exchange attempt for one agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenExchange {
    /// Participant identifier (`sales`, `inventory`, ...)
    pub agent: String,
    /// Name of the resource the token was requested for
    #[serde(default)]
    pub agent_name: String,
    pub status: ExchangeStatus,
    /// Scopes actually granted
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Scopes that were requested
    #[serde(default)]
    pub requested_scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default)]
    pub demo_mode: bool,
}

impl TokenExchange {
    /// Requested scopes that were not granted.
    pub fn missing_scopes(&self) -> Vec<&str> {
        self.requested_scopes
            .iter()
            .filter(|s| !self.scopes.contains(s))
            .map(String::as_str)
            .collect()
    }

    /// One-line description for terminal output.
    pub fn describe(&self) -> String {
        let name = if self.agent_name.is_empty() {
            self.agent.as_str()
        } else {
            self.agent_name.as_str()
        };

        match self.status {
            ExchangeStatus::Granted => format!("{}: granted [{}]", name, self.scopes.join(", ")),
            ExchangeStatus::Denied => format!(
                "{}: denied [{}]",
                name,
                self.requested_scopes.join(", ")
            ),
            ExchangeStatus::Error => format!(
                "{}: error ({})",
                name,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Counts over a set of exchanges.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ExchangeSummary {
    pub total: usize,
    pub granted: usize,
    pub denied: usize,
    pub errored: usize,
}

impl std::fmt::Display for ExchangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Token exchange complete: {} granted, {} denied",
            self.granted, self.denied
        )?;
        if self.errored > 0 {
            write!(f, ", {} failed", self.errored)?;
        }
        Ok(())
    }
}

/// Summarize a set of exchanges.
pub fn summarize(exchanges: &[TokenExchange]) -> ExchangeSummary {
    exchanges
        .iter()
        .fold(ExchangeSummary::default(), |mut summary, exchange| {
            summary.total += 1;
            match exchange.status {
                ExchangeStatus::Granted => summary.granted += 1,
                ExchangeStatus::Denied => summary.denied += 1,
                ExchangeStatus::Error => summary.errored += 1,
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(agent: &str, status: ExchangeStatus) -> TokenExchange {
        TokenExchange {
            agent: agent.to_string(),
            agent_name: String::new(),
            status,
            scopes: Vec::new(),
            requested_scopes: Vec::new(),
            error: None,
            audience: None,
            demo_mode: false,
        }
    }

    #[test]
    fn test_summarize() {
        let exchanges = vec![
            exchange("sales", ExchangeStatus::Granted),
            exchange("inventory", ExchangeStatus::Granted),
            exchange("pricing", ExchangeStatus::Denied),
            exchange("customer", ExchangeStatus::Error),
        ];
        let summary = summarize(&exchanges);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.granted, 2);
        assert_eq!(summary.denied, 1);
        assert_eq!(summary.errored, 1);
        assert_eq!(
            summary.to_string(),
            "Token exchange complete: 2 granted, 1 denied, 1 failed"
        );
    }

    #[test]
    fn test_parse_orchestrator_record() {
        let record: TokenExchange = serde_json::from_str(
            r##"{
                "agent": "inventory",
                "agent_name": "ProGear Inventory MCP",
                "color": "#10b981",
                "success": false,
                "access_denied": true,
                "scopes": [],
                "requested_scopes": ["inventory:write"],
                "demo_mode": true,
                "error": "Access denied by policy",
                "status": "denied"
            }"##,
        )
        .unwrap();

        assert_eq!(record.status, ExchangeStatus::Denied);
        assert_eq!(record.missing_scopes(), vec!["inventory:write"]);
        assert_eq!(
            record.describe(),
            "ProGear Inventory MCP: denied [inventory:write]"
        );
    }

    #[test]
    fn test_unknown_status_is_error() {
        let record: TokenExchange =
            serde_json::from_str(r#"{"agent": "sales", "status": "timeout"}"#).unwrap();
        assert_eq!(record.status, ExchangeStatus::Error);
        assert_eq!(record.describe(), "sales: error (unknown error)");
    }
}
