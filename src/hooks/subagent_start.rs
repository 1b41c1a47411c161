use anyhow::Result;
use serde_json::Value;

use super::{HookContext, HookInput, HookOutput};
use crate::event_log::{now_iso, with_fields};
use crate::tts::Narrator;

pub async fn run(input: &HookInput, ctx: &HookContext, notify: bool) -> Result<HookOutput> {
    let agent_id = input.str_or("agent_id", "unknown");
    let agent_type = input.str_or("agent_type", "unknown");

    let entry = with_fields(input.raw(), [("logged_at", Value::from(now_iso()))]);
    ctx.log.append("subagent_start", entry);
    tracing::debug!(agent_id, agent_type, "Logged subagent start");

    if notify {
        let message = start_announcement(agent_type);
        tracing::debug!(agent_id, %message, "Announcing subagent start");
        Narrator::from_config(&ctx.config).narrate(&message).await;
    }

    Ok(HookOutput::Silent)
}

fn start_announcement(agent_type: &str) -> String {
    if agent_type.is_empty() || agent_type == "unknown" {
        "Subagent started".to_string()
    } else {
        format!("{agent_type} agent started")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logs_input_with_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = HookContext::scratch(dir.path());
        let input = HookInput::parse(r#"{"agent_id": "a1", "agent_type": "Explore"}"#).unwrap();

        assert_eq!(run(&input, &ctx, false).await.unwrap(), HookOutput::Silent);

        let entries = ctx.logged("subagent_start");
        assert_eq!(entries[0]["agent_id"], "a1");
        assert!(entries[0]["logged_at"].is_string());
    }

    #[test]
    fn announcement_names_the_agent_type() {
        assert_eq!(start_announcement("Explore"), "Explore agent started");
        assert_eq!(start_announcement("unknown"), "Subagent started");
        assert_eq!(start_announcement(""), "Subagent started");
    }
}
