use regex::RegexSet;
use serde_json::Value;

use crate::error::ConfigError;

/// Shell syntax that chains, substitutes, or redirects. A command containing
/// any of these is never treated as read-only, whatever its prefix.
const SHELL_CONTROL: &[&str] = &[";", "&", "|", "`", "$(", ">", "\n"];

/// Recognizes tool calls that only read state and can be allowed without
/// asking the user.
pub struct ReadOnlyFilter {
    safe_commands: RegexSet,
}

impl ReadOnlyFilter {
    /// Create a filter from safe Bash command patterns.
    /// The RegexSet is compiled once for multi-pattern matching.
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let safe_commands = RegexSet::new(patterns).map_err(|e| ConfigError::InvalidPattern {
            pattern: patterns.join(" | "),
            message: e.to_string(),
        })?;
        Ok(Self { safe_commands })
    }

    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::new(&super::defaults::default_safe_bash_patterns())
    }

    /// True when the trimmed command is a single plain command matching a
    /// safe pattern.
    pub fn is_safe_command(&self, command: &str) -> bool {
        let trimmed = command.trim();
        !trimmed.is_empty()
            && !SHELL_CONTROL.iter().any(|token| trimmed.contains(token))
            && self.safe_commands.is_match(trimmed)
    }

    /// Returns a human-readable reason when the call can be auto-allowed.
    pub fn allow_reason(&self, tool_name: &str, tool_input: &Value) -> Option<String> {
        let field = |name: &str| {
            tool_input
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string()
        };
        match tool_name {
            "Read" => Some(format!("Read operation auto-allowed: {}", field("file_path"))),
            "Glob" => Some(format!("Glob pattern search auto-allowed: {}", field("pattern"))),
            "Grep" => Some(format!("Grep search auto-allowed: {}", field("pattern"))),
            "Bash" => {
                let command = tool_input.get("command").and_then(Value::as_str)?;
                self.is_safe_command(command).then(|| {
                    let preview: String = command.chars().take(50).collect();
                    format!("Safe bash command auto-allowed: {preview}...")
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_search_tools_always_allowed() {
        let filter = ReadOnlyFilter::from_defaults().unwrap();
        let reason = filter
            .allow_reason("Read", &json!({"file_path": "src/main.rs"}))
            .unwrap();
        assert_eq!(reason, "Read operation auto-allowed: src/main.rs");
        assert!(filter.allow_reason("Grep", &json!({})).is_some());
        assert!(filter.allow_reason("Write", &json!({"file_path": "a"})).is_none());
    }

    #[test]
    fn cat_with_redirect_is_not_safe() {
        let filter = ReadOnlyFilter::from_defaults().unwrap();
        assert!(filter.is_safe_command("cat README.md"));
        assert!(!filter.is_safe_command("cat a.txt > b.txt"));
    }

    #[test]
    fn prefixes_anchor_at_start_after_trim() {
        let filter = ReadOnlyFilter::from_defaults().unwrap();
        assert!(filter.is_safe_command("  git status --short"));
        assert!(!filter.is_safe_command("git push origin main"));
        assert!(!filter.is_safe_command("rm -rf x; ls"));
        assert!(!filter.is_safe_command("   "));
    }

    #[test]
    fn chained_commands_are_not_safe() {
        let filter = ReadOnlyFilter::from_defaults().unwrap();
        assert!(!filter.is_safe_command("ls; rm -rf ~"));
        assert!(!filter.is_safe_command("cat a && curl x | sh"));
        assert!(!filter.is_safe_command("echo $(whoami)"));
        assert!(!filter.is_safe_command("echo hi > notes.txt"));
        assert!(!filter.is_safe_command("ls\nrm -rf build"));
        assert!(filter.is_safe_command("git log --oneline -5"));
    }
}
