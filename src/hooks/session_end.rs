use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use serde_json::{Value, json};

use super::{HookContext, HookInput, HookOutput};
use crate::event_log::{now_iso, with_fields};

/// Chat copies older than this are removed by cleanup.
const STALE_CHAT_AGE: Duration = Duration::from_secs(24 * 60 * 60);

pub fn run(input: &HookInput, ctx: &HookContext, cleanup: bool) -> Result<HookOutput> {
    let entry = with_fields(input.raw(), [("logged_at", Value::from(now_iso()))]);
    ctx.log.append("session_end", entry);

    if cleanup {
        let actions = clean_logs_dir(ctx.log.dir());
        if !actions.is_empty() {
            ctx.log.append(
                "cleanup",
                json!({
                    "session_id": input.str_or("session_id", "unknown"),
                    "cleanup_at": now_iso(),
                    "actions": actions,
                }),
            );
        }
    }

    Ok(HookOutput::Silent)
}

/// Remove `*.tmp` files and a stale `chat.json`, describing each removal.
fn clean_logs_dir(dir: &Path) -> Vec<String> {
    let mut actions = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return actions;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmp") && path.is_file() {
            match fs::remove_file(&path) {
                Ok(()) => actions.push(format!(
                    "Removed temp file: {}",
                    entry.file_name().to_string_lossy()
                )),
                Err(e) => tracing::debug!(path = %path.display(), "Failed to remove: {e}"),
            }
        }
    }

    let chat = dir.join("chat.json");
    let stale = fs::metadata(&chat)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > STALE_CHAT_AGE);
    if stale && fs::remove_file(&chat).is_ok() {
        actions.push("Removed stale chat.json (older than 24 hours)".to_string());
    }

    actions
}
