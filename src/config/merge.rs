use super::schema::{AppConfig, PartialConfig};
use crate::safety::defaults::{default_deny_rules, default_safe_bash_patterns};
use std::path::PathBuf;

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    /// For deny_rules and safe_bash_patterns: REPLACE semantics (if self has Some, use it entirely).
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            logs_dir: self.logs_dir.or(fallback.logs_dir),
            data_dir: self.data_dir.or(fallback.data_dir),
            debug_log: self.debug_log.or(fallback.debug_log),
            lock_timeout_secs: self.lock_timeout_secs.or(fallback.lock_timeout_secs),
            stale_lock_secs: self.stale_lock_secs.or(fallback.stale_lock_secs),
            narration_timeout_secs: self
                .narration_timeout_secs
                .or(fallback.narration_timeout_secs),
            tts_scripts_dir: self.tts_scripts_dir.or(fallback.tts_scripts_dir),
            script_runner: self.script_runner.or(fallback.script_runner),
            anthropic_model: self.anthropic_model.or(fallback.anthropic_model),
            openai_model: self.openai_model.or(fallback.openai_model),
            user_name: self.user_name.or(fallback.user_name),
            deny_rules: self.deny_rules.or(fallback.deny_rules),
            safe_bash_patterns: self.safe_bash_patterns.or(fallback.safe_bash_patterns),
        }
    }

    /// Convert to AppConfig, filling any remaining gaps with defaults.
    pub fn finalize(self) -> AppConfig {
        let data_dir = self
            .data_dir
            .unwrap_or_else(|| PathBuf::from(".claude/data"));

        AppConfig {
            logs_dir: self.logs_dir.unwrap_or_else(|| PathBuf::from("logs")),
            data_dir,
            debug_log: self.debug_log,
            lock_timeout_secs: self.lock_timeout_secs.unwrap_or(30),
            stale_lock_secs: self.stale_lock_secs.unwrap_or(60),
            narration_timeout_secs: self.narration_timeout_secs.unwrap_or(10),
            tts_scripts_dir: self
                .tts_scripts_dir
                .unwrap_or_else(|| PathBuf::from(".claude/hooks/utils/tts")),
            script_runner: self
                .script_runner
                .unwrap_or_else(|| vec!["uv".to_string(), "run".to_string()]),
            anthropic_model: self
                .anthropic_model
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            openai_model: self
                .openai_model
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            user_name: self.user_name,
            deny_rules: self.deny_rules.unwrap_or_else(default_deny_rules),
            safe_bash_patterns: self
                .safe_bash_patterns
                .unwrap_or_else(default_safe_bash_patterns),
        }
    }
}
