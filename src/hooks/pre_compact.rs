use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::{Value, json};

use super::{HookContext, HookInput, HookOutput};
use crate::event_log::{now_iso, with_fields};
use crate::transcript::{TranscriptStats, expand_home};

const CUSTOM_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct CompactOptions {
    pub backup: bool,
    pub verbose: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Manual,
    Auto,
    Other,
}

impl Trigger {
    fn parse(value: &str) -> Self {
        match value {
            "manual" => Trigger::Manual,
            "auto" => Trigger::Auto,
            _ => Trigger::Other,
        }
    }
}

pub fn run(input: &HookInput, ctx: &HookContext, options: CompactOptions) -> Result<HookOutput> {
    let session_id = input.str_or("session_id", "unknown");
    let trigger_name = input.str_or("trigger", "unknown");
    let trigger = Trigger::parse(trigger_name);
    let transcript = input.str_field("transcript_path").filter(|p| !p.is_empty());
    let stats = transcript.map(|p| TranscriptStats::for_path(&expand_home(p)));

    let mut fields = vec![
        ("logged_at", Value::from(now_iso())),
        ("trigger_type", Value::from(trigger_name)),
        ("is_manual", Value::from(trigger == Trigger::Manual)),
        ("is_auto", Value::from(trigger == Trigger::Auto)),
    ];
    if let Some(stats) = &stats {
        fields.push(("transcript_stats", json!(stats)));
    }
    ctx.log.append("pre_compact", with_fields(input.raw(), fields));

    let backup = match transcript {
        Some(path) if options.backup => match backup_transcript(path, trigger_name, ctx.log.dir()) {
            Ok(backup) => backup,
            Err(e) => {
                tracing::debug!("Transcript backup failed: {e:#}");
                None
            }
        },
        _ => None,
    };

    if options.quiet {
        return Ok(HookOutput::Silent);
    }

    let stats = stats.filter(|s| s.exists);
    let session = format!("  Session: {}...", preview(session_id, 8));
    let mut lines = Vec::new();
    match trigger {
        Trigger::Manual => {
            lines.push("[PreCompact] Manual compaction initiated".to_string());
            lines.push(session);
            if let Some(stats) = &stats {
                lines.push(format!(
                    "  Transcript: {} lines, {} KB",
                    stats.line_count, stats.file_size_kb
                ));
            }
            let instructions = input.str_or("custom_instructions", "");
            if !instructions.is_empty() {
                let mut shown = preview(instructions, CUSTOM_PREVIEW_CHARS).to_string();
                if shown.len() < instructions.len() {
                    shown.push_str("...");
                }
                lines.push(format!("  Custom instructions: {shown}"));
            }
            match &backup {
                Some(path) => lines.push(format!("  Backup created: {}", path.display())),
                None if options.backup => {
                    lines.push("  Backup requested but transcript not found".to_string())
                }
                None => {}
            }
        }
        Trigger::Auto if options.verbose => {
            lines.push("[PreCompact] Auto-compaction triggered (context window full)".to_string());
            lines.push(session);
            if let Some(stats) = &stats {
                lines.push(format!("  Transcript size: {} KB", stats.file_size_kb));
            }
            if let Some(path) = &backup {
                lines.push(format!("  Backup: {}", path.display()));
            }
        }
        Trigger::Other if options.verbose => {
            lines.push(format!("[PreCompact] Unknown trigger type: {trigger_name}"));
            lines.push(session);
        }
        Trigger::Auto | Trigger::Other => {}
    }

    Ok(HookOutput::lines(lines))
}

/// Copy the transcript to `<logs_dir>/transcript_backups/`.
///
/// Returns `None` when the transcript does not exist.
fn backup_transcript(transcript: &str, trigger: &str, logs_dir: &Path) -> Result<Option<PathBuf>> {
    let source = expand_home(transcript);
    if !source.exists() {
        return Ok(None);
    }

    let backup_dir = logs_dir.join("transcript_backups");
    std::fs::create_dir_all(&backup_dir)
        .with_context(|| format!("creating {}", backup_dir.display()))?;

    let stem = Path::new(transcript)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let target = backup_dir.join(format!("{stem}_pre_compact_{trigger}_{stamp}.jsonl"));

    std::fs::copy(&source, &target)
        .with_context(|| format!("copying {} to {}", source.display(), target.display()))?;
    Ok(Some(target))
}

/// At most `max` characters of `text`.
fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
