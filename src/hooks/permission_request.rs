use anyhow::Result;

use super::{HookContext, HookInput, HookOutput, HookSpecificOutput, PermissionBehavior};
use crate::safety::SafetyPolicy;

/// How the permission hook was invoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionMode {
    pub log_only: bool,
    pub auto_allow: bool,
    pub deny_dangerous: bool,
}

pub fn run(input: &HookInput, ctx: &HookContext, mode: PermissionMode) -> Result<HookOutput> {
    if input.str_field("hook_event_name") != Some("PermissionRequest") {
        return Ok(HookOutput::Silent);
    }

    ctx.log.append("permission_request", input.raw().clone());

    if mode.log_only {
        return Ok(HookOutput::Silent);
    }

    let policy = SafetyPolicy::new(&ctx.config)?;
    let tool_name = input.tool_name();
    let tool_input = input.tool_input();

    if mode.deny_dangerous {
        if let Some(denial) = policy.check_denied(tool_name, &tool_input) {
            return Ok(decide(PermissionBehavior::Deny {
                message: denial.reason,
                interrupt: false,
            }));
        }
    }

    if mode.auto_allow {
        if let Some(reason) = policy.auto_allow_reason(tool_name, &tool_input) {
            tracing::debug!(tool_name, %reason, "Auto-allowing permission request");
            return Ok(decide(PermissionBehavior::Allow));
        }
    }

    Ok(HookOutput::Silent)
}

fn decide(decision: PermissionBehavior) -> HookOutput {
    HookOutput::specific(HookSpecificOutput::PermissionRequest { decision })
}
