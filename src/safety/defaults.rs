use super::rules::{RuleSpec, RuleTarget};

const ENV_REASON: &str = "Access to .env files containing sensitive data is prohibited. \
                          Use .env.sample for template files instead.";
const ENV_CONTEXT: &str = "This tool call was blocked because it attempted to access a .env \
                           file which may contain secrets.";
const RM_REASON: &str = "Dangerous rm command detected and prevented.";
const RM_CONTEXT: &str = "This command was blocked because it contains a potentially \
                          destructive rm pattern that could delete important files.";

/// `rm` flag combinations that mean recursive plus forced deletion,
/// matched against the normalized (lowercase, single-spaced) command.
const RECURSIVE_FORCE_PATTERNS: &[&str] = &[
    r"\brm\s+.*-[a-z]*r[a-z]*f",
    r"\brm\s+.*-[a-z]*f[a-z]*r",
    r"\brm\s+--recursive\s+--force",
    r"\brm\s+--force\s+--recursive",
    r"\brm\s+-r\s+.*-f",
    r"\brm\s+-f\s+.*-r",
];

/// Returns the default deny table, in evaluation order.
/// This catches obvious credential access and destructive deletes; it is
/// pattern matching on literal strings, not a security boundary.
pub fn default_deny_rules() -> Vec<RuleSpec> {
    let env_rule = |target, pattern: &str| RuleSpec {
        target,
        pattern: pattern.to_string(),
        reason: ENV_REASON.to_string(),
        context: Some(ENV_CONTEXT.to_string()),
        allow_suffix: Some(".sample".to_string()),
        requires: None,
        normalize: false,
    };
    let rm_rule = |pattern: &str, requires: Option<&str>| RuleSpec {
        target: RuleTarget::Command,
        pattern: pattern.to_string(),
        reason: RM_REASON.to_string(),
        context: Some(RM_CONTEXT.to_string()),
        allow_suffix: None,
        requires: requires.map(str::to_string),
        normalize: true,
    };

    let mut rules = vec![
        env_rule(RuleTarget::FilePath, r"\.env"),
        env_rule(RuleTarget::Command, r"\.env\b"),
    ];
    rules.extend(
        RECURSIVE_FORCE_PATTERNS
            .iter()
            .map(|pattern| rm_rule(pattern, None)),
    );
    // Recursive delete aimed at root, home, parent, wildcard, or current dir.
    rules.push(rm_rule(r"\brm\s+.*-[a-z]*r", Some(r"[/~*.]|\$home")));
    rules
}

/// Returns the default allow list of read-only shell command prefixes.
/// Each pattern is matched against the trimmed command.
pub fn default_safe_bash_patterns() -> Vec<String> {
    [
        r"^ls\b",
        r"^pwd\b",
        r"^echo\b",
        // cat without any redirection
        r"^cat\b[^>]*$",
        r"^head\b",
        r"^tail\b",
        r"^wc\b",
        r"^which\b",
        r"^whereis\b",
        r"^type\b",
        r"^file\b",
        r"^stat\b",
        r"^git\s+(status|log|diff|show|branch|tag)\b",
        r"^git\s+remote\s+-v\b",
        r"^npm\s+(list|ls|outdated|view)\b",
        r"^pip\s+(list|show|freeze)\b",
        r"^uv\s+(pip\s+list|tree)\b",
        r"^python\s+--version\b",
        r"^node\s+--version\b",
        r"^npm\s+--version\b",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
