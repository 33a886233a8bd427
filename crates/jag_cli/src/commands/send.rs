//! Send command - One-shot message to the agent backend.

use anyhow::Result;
use clap::Args;
use tracing::info;

use jag_chat::SubmitOutcome;

use super::{print_exchanges, print_flow, ClientArgs};

#[derive(Args)]
pub struct SendArgs {
    /// Message to send
    message: String,

    /// Print the reply and flow as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: SendArgs, client: &ClientArgs) -> Result<()> {
    let (controller, _session) = client.connect()?;
    info!("Sending message as {}", controller.session().profile.display_name());

    let outcome = controller.submit(&args.message).await?;

    let reply = controller
        .messages()
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default();

    if args.json {
        let output = serde_json::json!({
            "content": reply,
            "failed": outcome == SubmitOutcome::Failed,
            "agent_flow": controller.flow_view(),
            "token_exchanges": controller.token_exchanges(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("🤖 {}", reply);
        if outcome == SubmitOutcome::Replied {
            let view = controller.flow_view();
            if !view.is_idle() {
                println!();
                print_flow(&view);
                print_exchanges(&controller.token_exchanges());
            }
        }
    }

    if outcome == SubmitOutcome::Failed {
        anyhow::bail!("Chat request failed, see log output for details");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_with_mock_backend() {
        let client = ClientArgs {
            mock: true,
            id_token: Some("id-token".to_string()),
            ..ClientArgs::default()
        };
        let args = SendArgs {
            message: "Check basketball stock".to_string(),
            json: true,
        };
        assert!(execute(args, &client).await.is_ok());
    }

    #[tokio::test]
    async fn test_send_signed_out_is_rejected() {
        let client = ClientArgs {
            mock: true,
            ..ClientArgs::default()
        };
        let args = SendArgs {
            message: "Check basketball stock".to_string(),
            json: false,
        };
        let err = execute(args, &client).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<jag_chat::SubmitRejected>(),
            Some(&jag_chat::SubmitRejected::Unauthenticated)
        );
    }
}
