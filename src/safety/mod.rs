pub mod defaults;
pub mod read_only;
pub mod rules;

use read_only::ReadOnlyFilter;
use rules::{Denial, RuleTable, ToolAction};
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::ConfigError;

/// Combined decision policy: the ordered deny table plus the read-only
/// allow list, both compiled once from the resolved configuration.
pub struct SafetyPolicy {
    deny_rules: RuleTable,
    read_only: ReadOnlyFilter,
}

impl SafetyPolicy {
    /// Build the policy from `config.deny_rules` and `config.safe_bash_patterns`.
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            deny_rules: RuleTable::new(&config.deny_rules)?,
            read_only: ReadOnlyFilter::new(&config.safe_bash_patterns)?,
        })
    }

    /// First deny rule that fires for this tool call.
    pub fn check_denied(&self, tool_name: &str, tool_input: &Value) -> Option<Denial> {
        let action = ToolAction::from_tool(tool_name, tool_input);
        let denial = self.deny_rules.check(&action);
        if let Some(d) = &denial {
            tracing::info!(tool_name, reason = %d.reason, "Tool call matched deny rule");
        }
        denial
    }

    /// Reason the call may be auto-allowed, when it is read-only.
    pub fn auto_allow_reason(&self, tool_name: &str, tool_input: &Value) -> Option<String> {
        self.read_only.allow_reason(tool_name, tool_input)
    }
}
