//! CLI command definitions.
//!
//! This module defines the command structure for the jag CLI and the pieces
//! shared between commands: client construction and terminal output.

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use jag_chat::{
    ChatBackend, ChatConfig, ChatController, HttpChatBackend, MockBackend, StaticSession,
    UserProfile,
};
use jag_flow::{summarize, FlowView, StepStatus, TokenExchange};

pub mod chat;
pub mod flow;
pub mod send;

/// jag - chat with governed AI agents
#[derive(Parser)]
#[command(name = "jag")]
#[command(version, about = "jag - chat with governed AI agents")]
#[command(long_about = r#"
jag talks to an agent orchestrator on behalf of a signed-in user. Every
message is sent with the user's ID token; the orchestrator exchanges it for
agent-scoped tokens and reports which agents ran, which were denied, and why.

COMMANDS:
  chat  → Interactive conversation with agent flow display
  send  → Send a single message and print the reply
  flow  → Render an agent flow snapshot from a file or stdin

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or input
  3 - Authentication required
  4 - Backend error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub client: ClientArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and identity options shared by the chat commands.
#[derive(Args, Clone, Debug, Default)]
pub struct ClientArgs {
    /// Base URL of the agent backend
    #[arg(long, env = "JAG_API_URL", global = true)]
    pub api_url: Option<String>,

    /// ID token issued by the identity provider
    #[arg(long, env = "JAG_ID_TOKEN", hide_env_values = true, global = true)]
    pub id_token: Option<String>,

    /// Email of the signed-in user (display only)
    #[arg(long, env = "JAG_USER_EMAIL", global = true)]
    pub email: Option<String>,

    /// Name of the signed-in user (display only)
    #[arg(long, env = "JAG_USER_NAME", global = true)]
    pub name: Option<String>,

    /// Request timeout in seconds (0 disables)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Answer from a built-in mock backend instead of the network
    #[arg(long, global = true)]
    pub mock: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session
    Chat(chat::ChatArgs),

    /// Send one message and print the reply
    Send(send::SendArgs),

    /// Render an agent flow snapshot
    Flow(flow::FlowArgs),
}

impl ClientArgs {
    /// Resolve configuration: settings file and environment, then flags.
    pub fn config(&self) -> Result<ChatConfig> {
        let current_dir = std::env::current_dir()?;
        let mut config = ChatConfig::from_settings(&current_dir)?;

        if let Some(url) = &self.api_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.email.clone(),
            name: self.name.clone(),
            sub: None,
        }
    }

    /// Build the session provider and a controller bound to it.
    pub fn connect(&self) -> Result<(ChatController, Arc<StaticSession>)> {
        let session = Arc::new(StaticSession::new(self.id_token.clone(), self.profile()));

        let backend: Arc<dyn ChatBackend> = if self.mock {
            info!("Using mock backend");
            Arc::new(MockBackend::new())
        } else {
            let config = self.config()?;
            let backend = HttpChatBackend::new(&config)?;
            debug!("Chat endpoint: {}", backend.endpoint());
            Arc::new(backend)
        };

        let controller = ChatController::new(backend, session.clone());
        Ok((controller, session))
    }
}

fn status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Completed => "completed",
        StepStatus::Denied => "denied",
        StepStatus::Pending => "waiting",
        StepStatus::Inactive => "not involved",
    }
}

/// Print a rendered flow with one line per participant.
pub fn print_flow(view: &FlowView) {
    println!("🔀 {}", view);
    for participant in &view.participants {
        if participant.status == StepStatus::Inactive && !participant.involved {
            continue;
        }
        let mut line = format!(
            "   [{}] {} {} {}",
            participant.participant.glyph(),
            participant.badge.symbol(),
            participant.participant.display_name(),
            status_label(participant.status)
        );
        if let Some(detail) = &participant.detail {
            line.push_str(&format!(" ({})", detail));
        }
        println!("{}", line);
    }
}

/// Print token exchange results.
pub fn print_exchanges(exchanges: &[TokenExchange]) {
    if exchanges.is_empty() {
        return;
    }
    println!("🔑 {}", summarize(exchanges));
    for exchange in exchanges {
        println!("   - {}", exchange.describe());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_global_client_args() {
        let cli = Cli::try_parse_from([
            "jag",
            "--api-url",
            "http://agents.local:8000",
            "--name",
            "Sarah",
            "send",
            "Check basketball stock",
        ])
        .unwrap();

        assert_eq!(cli.client.api_url.as_deref(), Some("http://agents.local:8000"));
        assert_eq!(cli.client.profile().display_name(), "Sarah");
        assert!(matches!(cli.command, Commands::Send(_)));
    }

    #[test]
    fn test_flag_overrides_config() {
        let args = ClientArgs {
            api_url: Some("https://agents.example.com/".to_string()),
            timeout_secs: Some(5),
            ..ClientArgs::default()
        };
        let config = args.config().unwrap();
        assert_eq!(config.chat_endpoint(), "https://agents.example.com/api/chat");
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let args = ClientArgs {
            api_url: Some("agents.example.com".to_string()),
            ..ClientArgs::default()
        };
        assert!(args.config().is_err());
    }

    #[test]
    fn test_mock_connect_without_token_is_signed_out() {
        let args = ClientArgs {
            mock: true,
            ..ClientArgs::default()
        };
        let (controller, _session) = args.connect().unwrap();
        assert!(!controller.can_submit());
    }
}
