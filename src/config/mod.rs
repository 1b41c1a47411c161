pub mod merge;
pub mod schema;

pub use schema::*;

use crate::cli::Cli;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Load configuration by merging global, project, and CLI sources.
/// Precedence: CLI > explicit or project config > global config > defaults.
///
/// Missing config files are handled gracefully (defaults apply).
pub fn load_config(cli: &Cli) -> AppConfig {
    // Layer 1: Global config (~/.config/cc-hooks/hooks.toml or platform equivalent)
    let global = load_global_config();

    // Layer 2: explicit --config, else .claude/hooks.toml under the project dir
    let project_path = cli.config.clone().unwrap_or_else(project_config_path);
    let project = load_toml_file(&project_path).unwrap_or_default();

    // Layer 3: CLI args
    let cli_partial = PartialConfig {
        logs_dir: cli.logs_dir.clone(),
        data_dir: cli.data_dir.clone(),
        ..Default::default()
    };

    cli_partial
        .with_fallback(project)
        .with_fallback(global)
        .finalize()
}

/// Load global config from the platform-specific config directory.
/// Returns empty PartialConfig if file not found.
fn load_global_config() -> PartialConfig {
    match global_config_path() {
        Some(p) => load_toml_file(&p).unwrap_or_default(),
        None => {
            tracing::debug!("Could not determine global config directory");
            PartialConfig::default()
        }
    }
}

/// `$CLAUDE_PROJECT_DIR/.claude/hooks.toml`, relative to cwd when unset.
fn project_config_path() -> PathBuf {
    let root = std::env::var_os("CLAUDE_PROJECT_DIR")
        .map(PathBuf::from)
        .unwrap_or_default();
    root.join(".claude").join("hooks.toml")
}

/// Load and parse a TOML config file into a PartialConfig.
/// Returns None on file-not-found or parse failure; failures are logged.
fn load_toml_file(path: &Path) -> Option<PartialConfig> {
    match parse_config_file(path) {
        Ok(partial) => partial,
        Err(e) => {
            tracing::warn!("{e}");
            None
        }
    }
}

fn parse_config_file(path: &Path) -> Result<Option<PartialConfig>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let config_file =
        toml::from_str::<ConfigFile>(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config_file.to_partial()))
}

/// Resolve the platform-specific global config path.
/// Linux: ~/.config/cc-hooks/hooks.toml
/// macOS: ~/Library/Application Support/cc-hooks/hooks.toml
fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "cc-hooks")
        .map(|dirs| dirs.config_dir().join("hooks.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::rules::RuleTarget;

    #[test]
    fn parses_sectioned_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hooks.toml");
        std::fs::write(
            &path,
            r#"
[general]
logs_dir = "/var/tmp/hook-logs"

[tts]
lock_timeout_secs = 5
script_runner = ["python3"]

[llm]
user_name = "Sam"

[[safety.deny_rules]]
target = "command"
pattern = "\\bshutdown\\b"
reason = "No shutting down."
"#,
        )
        .unwrap();

        let config = parse_config_file(&path).unwrap().unwrap().finalize();
        assert_eq!(config.logs_dir, PathBuf::from("/var/tmp/hook-logs"));
        assert_eq!(config.lock_timeout_secs, 5);
        assert_eq!(config.script_runner, vec!["python3"]);
        assert_eq!(config.user_name.as_deref(), Some("Sam"));
        assert_eq!(config.deny_rules.len(), 1);
        assert_eq!(config.deny_rules[0].target, RuleTarget::Command);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = parse_config_file(&dir.path().join("absent.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hooks.toml");
        std::fs::write(&path, "[tts\nlock_timeout_secs = ").unwrap();
        let err = parse_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(load_toml_file(&path).is_none());
    }
}
