use anyhow::Result;
use serde_json::{Value, json};

use super::{HookContext, HookInput, HookOutput};

pub fn run(input: &HookInput, ctx: &HookContext) -> Result<HookOutput> {
    let entry = json!({
        "tool_name": input.tool_name(),
        "tool_input": input.tool_input(),
        "tool_response": input.field("tool_response").cloned().unwrap_or_else(|| json!({})),
        "tool_use_id": input.str_or("tool_use_id", ""),
        "session_id": input.str_or("session_id", ""),
        "cwd": input.str_or("cwd", ""),
        "permission_mode": input.str_or("permission_mode", ""),
        "raw_input": Value::clone(input.raw()),
    });
    ctx.log.append("post_tool_use", entry);
    Ok(HookOutput::Silent)
}
