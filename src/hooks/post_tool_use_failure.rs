use anyhow::Result;
use serde_json::{Value, json};

use super::{HookContext, HookInput, HookOutput};
use crate::event_log::{now_iso, with_fields};

pub fn run(input: &HookInput, ctx: &HookContext) -> Result<HookOutput> {
    let logged_at = now_iso();
    let raw = with_fields(input.raw(), [("logged_at", Value::from(logged_at.as_str()))]);

    let entry = json!({
        "timestamp": logged_at,
        "session_id": input.str_or("session_id", ""),
        "hook_event_name": input.str_or("hook_event_name", "PostToolUseFailure"),
        "tool_name": input.str_or("tool_name", "unknown"),
        "tool_use_id": input.str_or("tool_use_id", "unknown"),
        "tool_input": input.tool_input(),
        "error": input.field("error").cloned().unwrap_or_else(|| json!({})),
        "cwd": input.str_or("cwd", ""),
        "permission_mode": input.str_or("permission_mode", ""),
        "transcript_path": input.str_or("transcript_path", ""),
        "raw_input": raw,
    });
    ctx.log.append("post_tool_use_failure", entry);
    Ok(HookOutput::Silent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = HookContext::scratch(dir.path());
        let input = HookInput::parse(r#"{"error": "exit status 1"}"#).unwrap();

        run(&input, &ctx).unwrap();

        let entries = ctx.logged("post_tool_use_failure");
        let entry = &entries[0];
        assert_eq!(entry["hook_event_name"], "PostToolUseFailure");
        assert_eq!(entry["tool_name"], "unknown");
        assert_eq!(entry["tool_use_id"], "unknown");
        assert_eq!(entry["error"], "exit status 1");
        assert_eq!(entry["timestamp"], entry["raw_input"]["logged_at"]);
    }
}
