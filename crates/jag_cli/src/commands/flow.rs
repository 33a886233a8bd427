//! Flow command - Render an agent flow snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncReadExt;
use tracing::debug;

use jag_flow::{parse_steps, render_agent_flow, FlowView, TokenExchange};

use super::{print_exchanges, print_flow};

#[derive(Args)]
pub struct FlowArgs {
    /// Snapshot file (a step array or a chat reply); reads stdin when omitted
    file: Option<PathBuf>,

    /// Print the rendered view as JSON
    #[arg(long)]
    json: bool,
}

/// Token exchanges carried by a chat reply, if the input is one.
fn exchanges_from(input: &str) -> Vec<TokenExchange> {
    serde_json::from_str::<serde_json::Value>(input)
        .ok()
        .and_then(|mut value| value.get_mut("token_exchanges").map(|v| v.take()))
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

fn render(input: &str) -> Result<(FlowView, Vec<TokenExchange>)> {
    let steps = parse_steps(input)?;
    debug!("Parsed {} steps", steps.len());
    Ok((render_agent_flow(&steps), exchanges_from(input)))
}

pub async fn execute(args: FlowArgs) -> Result<()> {
    let input = match &args.file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Snapshot file not found: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    let (view, exchanges) = render(&input)?;

    if args.json {
        let output = serde_json::json!({
            "view": view,
            "token_exchanges": exchanges,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if view.is_idle() {
        println!("(no agent activity)");
    } else {
        print_flow(&view);
    }
    print_exchanges(&exchanges);

    Ok(())
}
