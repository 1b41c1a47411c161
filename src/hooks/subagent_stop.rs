use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

use super::{HookContext, HookInput, HookOutput};
use crate::llm::Summarizer;
use crate::transcript::{self, expand_home};
use crate::tts::{Narrator, TtsQueueLock};

/// Spoken when summarization is turned off.
pub const PLAIN_ANNOUNCEMENT: &str = "Subagent Complete";

#[derive(Debug, Clone, Copy, Default)]
pub struct StopOptions {
    pub chat: bool,
    pub notify: bool,
    pub summarize: bool,
}

pub async fn run(input: &HookInput, ctx: &HookContext, options: StopOptions) -> Result<HookOutput> {
    ctx.log.append("subagent_stop", input.raw().clone());

    if options.chat {
        if let Some(path) = input.path_field("transcript_path") {
            if let Err(e) = copy_chat(&path, ctx) {
                tracing::debug!("Failed to copy transcript to chat.json: {e:#}");
            }
        }
    }

    if options.notify {
        announce_completion(input, ctx, options.summarize).await?;
    }

    Ok(HookOutput::Silent)
}

/// Convert the JSONL transcript into a JSON array at `<logs_dir>/chat.json`.
fn copy_chat(transcript_path: &std::path::Path, ctx: &HookContext) -> Result<()> {
    if !transcript_path.exists() {
        return Ok(());
    }
    let entries = transcript::read_jsonl(transcript_path)
        .with_context(|| format!("reading {}", transcript_path.display()))?;
    std::fs::create_dir_all(ctx.log.dir())?;
    let body = serde_json::to_string_pretty(&Value::Array(entries))?;
    std::fs::write(ctx.log.dir().join("chat.json"), body)?;
    Ok(())
}

/// Summarize, then speak while holding the TTS queue lock.
///
/// A lock timeout does not suppress the announcement; it is spoken
/// unserialized instead.
async fn announce_completion(input: &HookInput, ctx: &HookContext, summarize: bool) -> Result<()> {
    let agent_id = input.str_or("agent_id", "unknown").to_string();
    tracing::debug!(
        %agent_id,
        agent_transcript_path = input.str_or("agent_transcript_path", "NOT FOUND"),
        "Subagent stopped"
    );

    let mut lock = TtsQueueLock::new(ctx.config.tts_lock_path());
    lock.cleanup_stale(Duration::from_secs(ctx.config.stale_lock_secs));

    let message = if summarize {
        let task = transcript::extract_task(subagent_transcript(input).as_deref());
        Summarizer::from_config(&ctx.config)
            .summarize(&task, Some(agent_id.as_str()))
            .await
    } else {
        PLAIN_ANNOUNCEMENT.to_string()
    };
    tracing::debug!(%message, "Announcement ready");

    let timeout = Duration::from_secs(ctx.config.lock_timeout_secs);
    let holder = agent_id.clone();
    let held = match tokio::task::spawn_blocking(move || {
        let acquired = lock.acquire(&holder, timeout);
        acquired.then_some(lock)
    })
    .await
    {
        Ok(held) => held,
        Err(e) => {
            tracing::warn!(%agent_id, "TTS lock acquisition task failed: {e}");
            None
        }
    };

    if held.is_none() {
        tracing::debug!(%agent_id, "TTS lock not acquired, announcing anyway");
    }
    Narrator::from_config(&ctx.config).narrate(&message).await;
    if let Some(mut lock) = held {
        lock.release(&agent_id);
    }
    Ok(())
}

/// The subagent's own transcript, else the session transcript.
fn subagent_transcript(input: &HookInput) -> Option<PathBuf> {
    input
        .str_field("agent_transcript_path")
        .filter(|p| !p.is_empty())
        .or_else(|| input.str_field("transcript_path").filter(|p| !p.is_empty()))
        .map(expand_home)
}
