//! Ordered deny-rule table for tool calls.
//!
//! Each rule names the part of the tool call it inspects, a regex, and the
//! reason reported when it fires. The first matching rule wins. The regex
//! engine has no look-around, so "match unless followed by X" is expressed
//! with `allow_suffix`, and "match only together with Y" with `requires`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Which part of a tool call a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTarget {
    /// `tool_input.command` of a Bash call.
    Command,
    /// `tool_input.file_path` of a Read, Edit, MultiEdit, or Write call.
    FilePath,
}

/// A deny rule as written in config or in the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub target: RuleTarget,
    pub pattern: String,
    pub reason: String,
    /// Extra context shown to the assistant alongside the denial.
    #[serde(default)]
    pub context: Option<String>,
    /// A match immediately followed by this text is ignored.
    #[serde(default)]
    pub allow_suffix: Option<String>,
    /// A second pattern that must also match somewhere in the subject.
    #[serde(default)]
    pub requires: Option<String>,
    /// Lowercase and collapse whitespace before matching.
    #[serde(default)]
    pub normalize: bool,
}

/// The part of a tool call that rules can inspect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolAction {
    pub command: Option<String>,
    pub file_path: Option<String>,
}

impl ToolAction {
    /// Extract the inspectable fields for a given tool.
    /// Tools other than Bash and the file tools yield an empty action.
    pub fn from_tool(tool_name: &str, tool_input: &Value) -> Self {
        let field = |name: &str| {
            tool_input
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        match tool_name {
            "Bash" => Self {
                command: field("command"),
                file_path: None,
            },
            "Read" | "Edit" | "MultiEdit" | "Write" => Self {
                command: None,
                file_path: field("file_path"),
            },
            _ => Self::default(),
        }
    }
}

/// A rule that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: String,
    pub context: Option<String>,
}

struct CompiledRule {
    target: RuleTarget,
    pattern: Regex,
    requires: Option<Regex>,
    allow_suffix: Option<String>,
    normalize: bool,
    reason: String,
    context: Option<String>,
}

impl CompiledRule {
    fn matches(&self, subject: &str) -> bool {
        let hit = self.pattern.find_iter(subject).any(|m| {
            self.allow_suffix
                .as_deref()
                .is_none_or(|suffix| !subject[m.end()..].starts_with(suffix))
        });
        hit && self.requires.as_ref().is_none_or(|r| r.is_match(subject))
    }
}

/// Compiled, ordered deny table.
pub struct RuleTable {
    rules: Vec<CompiledRule>,
}

impl RuleTable {
    /// Compile a list of rule specs, preserving order.
    pub fn new(specs: &[RuleSpec]) -> Result<Self, ConfigError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
        };

        let rules = specs
            .iter()
            .map(|spec| {
                Ok(CompiledRule {
                    target: spec.target,
                    pattern: compile(&spec.pattern)?,
                    requires: spec.requires.as_deref().map(compile).transpose()?,
                    allow_suffix: spec.allow_suffix.clone(),
                    normalize: spec.normalize,
                    reason: spec.reason.clone(),
                    context: spec.context.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { rules })
    }

    /// Build the table from the built-in defaults.
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::new(&super::defaults::default_deny_rules())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Return the first rule that fires for this action, if any.
    pub fn check(&self, action: &ToolAction) -> Option<Denial> {
        self.rules.iter().find_map(|rule| {
            let subject = match rule.target {
                RuleTarget::Command => action.command.as_deref(),
                RuleTarget::FilePath => action.file_path.as_deref(),
            }?;

            let fired = if rule.normalize {
                rule.matches(&normalize_command(subject))
            } else {
                rule.matches(subject)
            };

            fired.then(|| Denial {
                reason: rule.reason.clone(),
                context: rule.context.clone(),
            })
        })
    }
}

/// Lowercase and collapse runs of whitespace to single spaces.
pub fn normalize_command(command: &str) -> String {
    command
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
