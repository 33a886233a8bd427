//! Chat command - Interactive conversation with the agent backend.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use jag_chat::{ChatController, MessageRole, SessionProvider, SubmitOutcome, SubmitRejected};

use super::{print_exchanges, print_flow, ClientArgs};

#[derive(Args)]
pub struct ChatArgs {
    /// Identity provider used by /login
    #[arg(long, default_value = "okta")]
    provider: String,

    /// Do not print the agent flow after each reply
    #[arg(long)]
    no_flow: bool,
}

/// A line of REPL input.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Message(String),
    Login(Option<String>),
    Logout,
    Flow,
    Exchanges,
    History,
    Clear,
    Help,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "login" => Input::Login(parts.next().map(str::to_string)),
        "logout" => Input::Logout,
        "flow" => Input::Flow,
        "exchanges" => Input::Exchanges,
        "history" => Input::History,
        "clear" => Input::Clear,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => Input::Unknown(other.to_string()),
    }
}

const HELP: &str = "\
Commands:
  /login [provider]  Sign in (uses the configured ID token)
  /logout            Sign out
  /flow              Show the agent flow of the last reply
  /exchanges         Show token exchanges of the last reply
  /history           Show the conversation so far
  /clear             Forget the conversation
  /quit              Leave";

fn prompt(controller: &ChatController) {
    let marker = if controller.can_submit() { ">" } else { "🔒" };
    print!("{} ", marker);
    let _ = std::io::stdout().flush();
}

fn print_history(controller: &ChatController) {
    let messages = controller.messages();
    if messages.is_empty() {
        println!("(no messages yet)");
        return;
    }
    for message in messages {
        let who = match message.role {
            MessageRole::User => "you",
            MessageRole::Assistant => "assistant",
        };
        println!("[{}] {}: {}", message.created_at.format("%H:%M:%S"), who, message.content);
    }
}

async fn send_message(controller: &ChatController, text: &str, show_flow: bool) {
    let request = match controller.begin(text) {
        Ok(request) => request,
        Err(SubmitRejected::EmptyMessage) => return,
        Err(SubmitRejected::Unauthenticated) => {
            println!("🔒 Sign in first with /login");
            return;
        }
        Err(SubmitRejected::InFlight) => {
            println!("⏳ Still waiting for the previous reply");
            return;
        }
    };

    println!("⏳ Agents are working...");

    let outcome = request.complete().await;
    if outcome == SubmitOutcome::Discarded {
        return;
    }

    if let Some(reply) = controller.messages().last() {
        println!("\n🤖 {}\n", reply.content);
    }

    // a failed turn has no flow of its own
    if show_flow && should_show_flow(outcome) {
        let view = controller.flow_view();
        if !view.is_idle() {
            print_flow(&view);
            print_exchanges(&controller.token_exchanges());
            println!();
        }
    }
}

fn should_show_flow(outcome: SubmitOutcome) -> bool {
    outcome == SubmitOutcome::Replied
}

pub async fn execute(args: ChatArgs, client: &ClientArgs) -> Result<()> {
    let (controller, session) = client.connect()?;

    let current = session.session();
    if current.is_authenticated() {
        println!("💬 Signed in as {}. Type /help for commands.", current.profile.display_name());
    } else {
        println!("💬 Not signed in. Use /login once JAG_ID_TOKEN is set. Type /help for commands.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt(&controller);
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Message(text) => send_message(&controller, &text, !args.no_flow).await,
            Input::Login(provider) => {
                let provider = provider.unwrap_or_else(|| args.provider.clone());
                match session.sign_in(&provider).await {
                    Ok(()) => println!(
                        "✅ Signed in as {}",
                        session.session().profile.display_name()
                    ),
                    Err(e) => println!("❌ {}", e),
                }
            }
            Input::Logout => {
                session.sign_out().await?;
                println!("👋 Signed out");
            }
            Input::Flow => {
                let view = controller.flow_view();
                if view.is_idle() {
                    println!("(no agent flow yet)");
                } else {
                    print_flow(&view);
                }
            }
            Input::Exchanges => {
                let exchanges = controller.token_exchanges();
                if exchanges.is_empty() {
                    println!("(no token exchanges yet)");
                } else {
                    print_exchanges(&exchanges);
                }
            }
            Input::History => print_history(&controller),
            Input::Clear => {
                controller.clear();
                println!("🧹 Conversation cleared");
            }
            Input::Help => println!("{}", HELP),
            Input::Quit => break,
            Input::Unknown(name) => println!("Unknown command /{}. Type /help.", name),
        }
    }

    info!("Chat session ended with {} messages", controller.messages().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages() {
        assert_eq!(
            parse_input("Check basketball stock"),
            Input::Message("Check basketball stock".to_string())
        );
        assert_eq!(parse_input("   "), Input::Message("   ".to_string()));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input("/login"), Input::Login(None));
        assert_eq!(parse_input("/login okta"), Input::Login(Some("okta".to_string())));
        assert_eq!(parse_input("  /logout "), Input::Logout);
        assert_eq!(parse_input("/flow"), Input::Flow);
        assert_eq!(parse_input("/exchanges"), Input::Exchanges);
        assert_eq!(parse_input("/history"), Input::History);
        assert_eq!(parse_input("/clear"), Input::Clear);
        assert_eq!(parse_input("/?"), Input::Help);
        assert_eq!(parse_input("/exit"), Input::Quit);
        assert_eq!(parse_input("/deploy"), Input::Unknown("deploy".to_string()));
        assert_eq!(parse_input("/"), Input::Unknown(String::new()));
    }

    #[test]
    fn test_flow_shown_only_for_replies() {
        assert!(should_show_flow(SubmitOutcome::Replied));
        assert!(!should_show_flow(SubmitOutcome::Failed));
        assert!(!should_show_flow(SubmitOutcome::Discarded));
    }

    #[tokio::test]
    async fn test_send_message_with_mock_backend() {
        let client = ClientArgs {
            mock: true,
            id_token: Some("id-token".to_string()),
            ..ClientArgs::default()
        };
        let (controller, _session) = client.connect().unwrap();

        send_message(&controller, "hello", true).await;

        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "(mock) hello");
        assert!(!controller.is_pending());
    }
}
