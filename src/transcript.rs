//! Reading the host's JSONL session transcripts.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

/// Maximum characters kept from an extracted task description.
const TASK_PREVIEW_CHARS: usize = 200;

pub const DEFAULT_TASK: &str = "completed a task";

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            match directories::BaseDirs::new() {
                Some(dirs) => dirs.home_dir().join(rest.trim_start_matches('/')),
                None => PathBuf::from(path),
            }
        }
        _ => PathBuf::from(path),
    }
}

/// Parse every valid JSON line of a transcript, skipping blank and invalid lines.
pub fn read_jsonl(path: &Path) -> io::Result<Vec<Value>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Ok(entry) = serde_json::from_str(line) {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Describe what a subagent was asked to do, from its transcript.
///
/// Uses the first user message (plain string or first text block), or a
/// `prompt` field on any earlier entry. Falls back to [`DEFAULT_TASK`].
pub fn extract_task(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return DEFAULT_TASK.to_string();
    };
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!(path = %path.display(), "Transcript unavailable: {e}");
            return DEFAULT_TASK.to_string();
        }
    };

    for line in BufReader::new(file).lines().map_while(Result::ok) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(entry) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if let Some(task) = task_from_entry(&entry) {
            return truncate_task(task);
        }
    }
    DEFAULT_TASK.to_string()
}

fn task_from_entry(entry: &Value) -> Option<&str> {
    if entry.get("type").and_then(Value::as_str) == Some("user") {
        let content = entry
            .get("message")
            .and_then(|m| m.get("content"))
            .filter(|c| !is_empty_content(c))
            .or_else(|| entry.get("content"));

        match content {
            Some(Value::String(text)) if !text.is_empty() => return Some(text.as_str()),
            Some(Value::Array(blocks)) => {
                let text = blocks.iter().find_map(|block| {
                    (block.get("type").and_then(Value::as_str) == Some("text"))
                        .then(|| block.get("text").and_then(Value::as_str))
                        .flatten()
                        .filter(|t| !t.is_empty())
                });
                if text.is_some() {
                    return text;
                }
            }
            _ => {}
        }
    }

    entry
        .get("prompt")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
}

fn is_empty_content(content: &Value) -> bool {
    match content {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn truncate_task(text: &str) -> String {
    if text.chars().count() > TASK_PREVIEW_CHARS {
        let head: String = text.chars().take(TASK_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Size and length of a transcript file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranscriptStats {
    pub line_count: usize,
    pub file_size_kb: f64,
    pub exists: bool,
}

impl TranscriptStats {
    pub fn for_path(path: &Path) -> Self {
        let Ok(metadata) = fs::metadata(path) else {
            return Self::default();
        };
        let file_size_kb = (metadata.len() as f64 / 1024.0 * 100.0).round() / 100.0;
        let line_count = File::open(path)
            .map(|f| BufReader::new(f).lines().count())
            .unwrap_or(0);
        Self {
            line_count,
            file_size_kb,
            exists: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn transcript(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn string_content_from_first_user_message() {
        let file = transcript(&[
            r#"{"type":"system","content":"boot"}"#,
            "not json",
            r#"{"type":"user","message":{"content":"Refactor the parser"}}"#,
            r#"{"type":"user","message":{"content":"second"}}"#,
        ]);
        assert_eq!(extract_task(Some(file.path())), "Refactor the parser");
    }

    #[test]
    fn first_text_block_of_list_content() {
        let file = transcript(&[
            r#"{"type":"user","message":{"content":[{"type":"image"},{"type":"text","text":"Fix the tests"}]}}"#,
        ]);
        assert_eq!(extract_task(Some(file.path())), "Fix the tests");
    }

    #[test]
    fn falls_back_to_prompt_field() {
        let file = transcript(&[r#"{"type":"meta","prompt":"Write docs"}"#]);
        assert_eq!(extract_task(Some(file.path())), "Write docs");
    }

    #[test]
    fn long_tasks_are_truncated() {
        let long = "x".repeat(250);
        let line = format!(r#"{{"type":"user","content":"{long}"}}"#);
        let file = transcript(&[&line]);
        let task = extract_task(Some(file.path()));
        assert_eq!(task.len(), 203);
        assert!(task.ends_with("..."));
    }

    #[test]
    fn missing_transcript_gives_default() {
        assert_eq!(extract_task(None), DEFAULT_TASK);
        assert_eq!(
            extract_task(Some(Path::new("/nonexistent/transcript.jsonl"))),
            DEFAULT_TASK
        );
    }

    #[test]
    fn jsonl_skips_invalid_lines() {
        let file = transcript(&[r#"{"a":1}"#, "", "garbage", r#"{"b":2}"#]);
        let entries = read_jsonl(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn stats_count_lines() {
        let file = transcript(&["{}", "{}", "{}"]);
        let stats = TranscriptStats::for_path(file.path());
        assert!(stats.exists);
        assert_eq!(stats.line_count, 3);
        assert!(!TranscriptStats::for_path(Path::new("/nonexistent")).exists);
    }
}
