//! jag-console CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or input
//! - 3: Authentication required
//! - 4: Backend error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};
use jag_chat::{ChatError, SubmitRejected};
use jag_flow::FlowError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const AUTH_REQUIRED: u8 = 3;
    pub const BACKEND_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "jag=debug" } else { "jag=info" };
    let mut filter = EnvFilter::from_default_env();
    for directive in [default_level, "warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Chat(args) => commands::chat::execute(args, &cli.client).await,
        Commands::Send(args) => commands::send::execute(args, &cli.client).await,
        Commands::Flow(args) => commands::flow::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if let Some(rejected) = e.downcast_ref::<SubmitRejected>() {
        return match rejected {
            SubmitRejected::Unauthenticated => ExitCodes::AUTH_REQUIRED,
            _ => ExitCodes::INVALID_ARGS,
        };
    }

    if let Some(chat) = e.downcast_ref::<ChatError>() {
        return match chat {
            ChatError::NotAuthenticated | ChatError::SignInUnavailable { .. } => {
                ExitCodes::AUTH_REQUIRED
            }
            ChatError::Config(_) => ExitCodes::INVALID_ARGS,
            ChatError::Transport(_)
            | ChatError::Status { .. }
            | ChatError::InvalidResponse(_)
            | ChatError::Backend(_) => ExitCodes::BACKEND_ERROR,
            _ => ExitCodes::GENERAL_ERROR,
        };
    }

    if e.downcast_ref::<FlowError>().is_some() {
        return ExitCodes::INVALID_ARGS;
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("chat request failed") {
        ExitCodes::BACKEND_ERROR
    } else if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
