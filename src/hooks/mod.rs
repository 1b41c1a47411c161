//! Lifecycle hook handlers.
//!
//! Every hook reads one JSON object from stdin and answers with nothing,
//! one JSON object, or plain text. Handlers receive the parsed input and a
//! [`HookContext`]; they never decide the exit code.

pub mod permission_request;
pub mod post_tool_use;
pub mod post_tool_use_failure;
pub mod pre_compact;
pub mod pre_tool_use;
pub mod session_end;
pub mod setup;
pub mod subagent_start;
pub mod subagent_stop;
pub mod tsc_validator;

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::AppConfig;
use crate::error::HookError;
use crate::event_log::EventLog;

/// Parsed hook payload. Always a JSON object.
#[derive(Debug, Clone)]
pub struct HookInput {
    raw: Value,
}

impl HookInput {
    /// Parse a payload, rejecting anything that is not a JSON object.
    pub fn parse(text: &str) -> Result<Self, HookError> {
        let raw: Value = serde_json::from_str(text)?;
        let kind = match &raw {
            Value::Object(_) => return Ok(Self { raw }),
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
        };
        Err(HookError::NotAnObject { kind })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }

    /// String field, or `default` when missing or not a string.
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.str_field(key).unwrap_or(default)
    }

    /// Non-empty string field as a path.
    pub fn path_field(&self, key: &str) -> Option<PathBuf> {
        self.str_field(key)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }

    pub fn tool_name(&self) -> &str {
        self.str_or("tool_name", "")
    }

    /// `tool_input`, or an empty object when absent.
    pub fn tool_input(&self) -> Value {
        self.field("tool_input")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }
}

/// Shared state for one hook invocation.
pub struct HookContext {
    pub config: AppConfig,
    pub log: EventLog,
}

impl HookContext {
    pub fn new(config: AppConfig) -> Self {
        let log = EventLog::new(config.logs_dir.clone());
        Self { config, log }
    }

    /// Default config with logs and data rooted in a scratch directory.
    #[cfg(test)]
    pub(crate) fn scratch(dir: &std::path::Path) -> Self {
        let config = crate::config::PartialConfig {
            logs_dir: Some(dir.join("logs")),
            data_dir: Some(dir.join("data")),
            ..Default::default()
        }
        .finalize();
        Self::new(config)
    }

    /// Entries currently stored in `<logs_dir>/<name>.json`.
    #[cfg(test)]
    pub(crate) fn logged(&self, name: &str) -> Vec<Value> {
        std::fs::read_to_string(self.log.path_for(name))
            .ok()
            .and_then(|body| serde_json::from_str(&body).ok())
            .unwrap_or_default()
    }
}

/// What a hook writes to stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutput {
    /// No output: the host applies its default behavior.
    Silent,
    Json(HookResponse),
    Text(String),
}

impl HookOutput {
    pub fn block(reason: impl Into<String>) -> Self {
        HookOutput::Json(HookResponse {
            decision: Some("block"),
            reason: Some(reason.into()),
            hook_specific_output: None,
        })
    }

    pub fn specific(output: HookSpecificOutput) -> Self {
        HookOutput::Json(HookResponse {
            decision: None,
            reason: None,
            hook_specific_output: Some(output),
        })
    }

    /// Text lines joined with newlines, or silence when there are none.
    pub fn lines(lines: Vec<String>) -> Self {
        if lines.is_empty() {
            HookOutput::Silent
        } else {
            HookOutput::Text(lines.join("\n"))
        }
    }

    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        match self {
            HookOutput::Silent => Ok(()),
            HookOutput::Json(response) => {
                serde_json::to_writer(&mut *out, response)?;
                writeln!(out)
            }
            HookOutput::Text(text) => writeln!(out, "{text}"),
        }
    }
}

/// Top-level JSON answer to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
}

/// Event-specific decision or context, tagged by `hookEventName`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "hookEventName", rename_all_fields = "camelCase")]
pub enum HookSpecificOutput {
    PreToolUse {
        permission_decision: PermissionDecision,
        #[serde(skip_serializing_if = "Option::is_none")]
        permission_decision_reason: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        additional_context: Option<String>,
    },
    PermissionRequest {
        decision: PermissionBehavior,
    },
    Setup {
        additional_context: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    Allow,
    Deny,
    Ask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "behavior", rename_all = "lowercase")]
pub enum PermissionBehavior {
    Allow,
    Deny { message: String, interrupt: bool },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rendered(output: &HookOutput) -> Value {
        let mut buf = Vec::new();
        output.write_to(&mut buf).unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn rejects_non_objects() {
        assert!(matches!(
            HookInput::parse("[1, 2]"),
            Err(HookError::NotAnObject { kind: "an array" })
        ));
        assert!(matches!(
            HookInput::parse("not json"),
            Err(HookError::MalformedInput(_))
        ));
    }

    #[test]
    fn field_helpers_default_sensibly() {
        let input = HookInput::parse(r#"{"tool_name": "Bash", "cwd": ""}"#).unwrap();
        assert_eq!(input.tool_name(), "Bash");
        assert_eq!(input.tool_input(), json!({}));
        assert_eq!(input.str_or("session_id", "unknown"), "unknown");
        assert_eq!(input.path_field("cwd"), None);
    }

    #[test]
    fn pre_tool_use_deny_shape() {
        let output = HookOutput::specific(HookSpecificOutput::PreToolUse {
            permission_decision: PermissionDecision::Deny,
            permission_decision_reason: Some("no".into()),
            additional_context: None,
        });
        assert_eq!(
            rendered(&output),
            json!({"hookSpecificOutput": {
                "hookEventName": "PreToolUse",
                "permissionDecision": "deny",
                "permissionDecisionReason": "no"
            }})
        );
    }

    #[test]
    fn permission_request_shapes() {
        let allow = HookOutput::specific(HookSpecificOutput::PermissionRequest {
            decision: PermissionBehavior::Allow,
        });
        assert_eq!(
            rendered(&allow),
            json!({"hookSpecificOutput": {
                "hookEventName": "PermissionRequest",
                "decision": {"behavior": "allow"}
            }})
        );

        let deny = HookOutput::specific(HookSpecificOutput::PermissionRequest {
            decision: PermissionBehavior::Deny {
                message: "stop".into(),
                interrupt: false,
            },
        });
        assert_eq!(
            rendered(&deny)["hookSpecificOutput"]["decision"],
            json!({"behavior": "deny", "message": "stop", "interrupt": false})
        );
    }

    #[test]
    fn block_shape() {
        assert_eq!(
            rendered(&HookOutput::block("type errors")),
            json!({"decision": "block", "reason": "type errors"})
        );
    }

    #[test]
    fn silent_writes_nothing() {
        let mut buf = Vec::new();
        HookOutput::Silent.write_to(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert_eq!(HookOutput::lines(Vec::new()), HookOutput::Silent);
    }
}
