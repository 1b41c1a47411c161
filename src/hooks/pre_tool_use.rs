use anyhow::Result;

use super::{HookContext, HookInput, HookOutput, HookSpecificOutput, PermissionDecision};
use crate::safety::SafetyPolicy;

/// Deny tool calls matching the deny table; log everything that passes.
pub fn run(input: &HookInput, ctx: &HookContext) -> Result<HookOutput> {
    let policy = SafetyPolicy::new(&ctx.config)?;

    if let Some(denial) = policy.check_denied(input.tool_name(), &input.tool_input()) {
        return Ok(HookOutput::specific(HookSpecificOutput::PreToolUse {
            permission_decision: PermissionDecision::Deny,
            permission_decision_reason: Some(denial.reason),
            additional_context: denial.context,
        }));
    }

    ctx.log.append("pre_tool_use", input.raw().clone());
    Ok(HookOutput::Silent)
}
