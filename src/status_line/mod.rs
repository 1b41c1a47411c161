//! Single-line session status renderers.
//!
//! Rendering is a pure function of [`Telemetry`] plus an optional git
//! branch; only [`render_from_json`] touches the environment.

pub mod format;
pub mod styles;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::style::Stylize;
use serde::Deserialize;

use crate::cli::StatusStyle;
use crate::exec::run_program;

const BRANCH_TIMEOUT: Duration = Duration::from_secs(1);

/// Session telemetry sent by the host. Every field is optional and
/// null-tolerant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Telemetry {
    pub model: Option<ModelInfo>,
    pub cost: Option<CostInfo>,
    pub context_window: Option<ContextWindow>,
    pub workspace: Option<Workspace>,
    pub output_style: Option<OutputStyle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelInfo {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CostInfo {
    pub total_cost_usd: Option<f64>,
    pub total_duration_ms: Option<f64>,
    pub total_api_duration_ms: Option<f64>,
    pub total_lines_added: Option<i64>,
    pub total_lines_removed: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContextWindow {
    pub used_percentage: Option<f64>,
    pub total_input_tokens: Option<u64>,
    pub total_output_tokens: Option<u64>,
    pub current_usage: Option<CurrentUsage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CurrentUsage {
    pub cache_creation_input_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub current_dir: Option<String>,
    pub project_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputStyle {
    pub name: Option<String>,
}

impl Telemetry {
    pub fn model_name(&self) -> &str {
        self.model
            .as_ref()
            .and_then(|m| m.display_name.as_deref())
            .unwrap_or("Claude")
    }

    fn cost_info(&self) -> CostInfo {
        self.cost.clone().unwrap_or_default()
    }

    pub fn total_cost(&self) -> f64 {
        self.cost_info().total_cost_usd.unwrap_or(0.0)
    }

    pub fn duration_ms(&self) -> f64 {
        self.cost_info().total_duration_ms.unwrap_or(0.0)
    }

    pub fn api_duration_ms(&self) -> f64 {
        self.cost_info().total_api_duration_ms.unwrap_or(0.0)
    }

    pub fn lines_added(&self) -> i64 {
        self.cost_info().total_lines_added.unwrap_or(0)
    }

    pub fn lines_removed(&self) -> i64 {
        self.cost_info().total_lines_removed.unwrap_or(0)
    }

    pub fn used_percentage(&self) -> f64 {
        self.context_window
            .as_ref()
            .and_then(|c| c.used_percentage)
            .unwrap_or(0.0)
    }

    pub fn input_tokens(&self) -> u64 {
        self.context_window
            .as_ref()
            .and_then(|c| c.total_input_tokens)
            .unwrap_or(0)
    }

    pub fn output_tokens(&self) -> u64 {
        self.context_window
            .as_ref()
            .and_then(|c| c.total_output_tokens)
            .unwrap_or(0)
    }

    fn usage(&self) -> CurrentUsage {
        self.context_window
            .as_ref()
            .and_then(|c| c.current_usage.clone())
            .unwrap_or_default()
    }

    pub fn cache_creation_tokens(&self) -> u64 {
        self.usage().cache_creation_input_tokens.unwrap_or(0)
    }

    pub fn cache_read_tokens(&self) -> u64 {
        self.usage().cache_read_input_tokens.unwrap_or(0)
    }

    pub fn project_dir(&self) -> Option<&str> {
        self.workspace.as_ref().and_then(|w| w.project_dir.as_deref())
    }

    pub fn current_dir(&self) -> Option<&str> {
        self.workspace.as_ref().and_then(|w| w.current_dir.as_deref())
    }

    pub fn output_style_name(&self) -> &str {
        self.output_style
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .unwrap_or("default")
    }
}

/// Render a status line from raw stdin. Never fails: invalid input yields
/// a red error line.
pub async fn render_from_json(input: &str, style: StatusStyle) -> String {
    let telemetry: Telemetry = match serde_json::from_str(input) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            tracing::debug!("Invalid status line input: {e}");
            return "[Error] Invalid JSON input".red().to_string();
        }
    };

    let branch = match style {
        StatusStyle::Segments => {
            let dir = telemetry
                .current_dir()
                .or(telemetry.project_dir())
                .map(PathBuf::from);
            git_branch(dir.as_deref()).await
        }
        _ => None,
    };

    styles::render(style, &telemetry, branch.as_deref())
}

/// Current branch via git, falling back to `.git/HEAD`.
async fn git_branch(dir: Option<&Path>) -> Option<String> {
    match run_program("git", &["branch", "--show-current"], dir, BRANCH_TIMEOUT).await {
        Ok(result) if result.success() && !result.stdout.trim().is_empty() => {
            return Some(result.stdout.trim().to_string());
        }
        Ok(_) => {}
        Err(e) => tracing::debug!("git branch lookup failed: {e}"),
    }

    let head = dir.unwrap_or(Path::new(".")).join(".git").join("HEAD");
    let content = std::fs::read_to_string(head).ok()?;
    content
        .trim()
        .strip_prefix("ref: refs/heads/")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_and_missing_fields_default() {
        let telemetry: Telemetry = serde_json::from_str(
            r#"{"model": null, "cost": {"total_cost_usd": null}, "context_window": {}}"#,
        )
        .unwrap();
        assert_eq!(telemetry.model_name(), "Claude");
        assert_eq!(telemetry.total_cost(), 0.0);
        assert_eq!(telemetry.cache_read_tokens(), 0);
        assert_eq!(telemetry.output_style_name(), "default");
    }

    #[tokio::test]
    async fn invalid_json_renders_error_line() {
        let line = render_from_json("{not json", StatusStyle::Pulse).await;
        assert!(line.contains("[Error] Invalid JSON input"));
    }

    #[tokio::test]
    async fn head_file_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/feature/x\n").unwrap();
        // git itself rejects this fake repository, so the HEAD file decides.
        assert_eq!(
            git_branch(Some(dir.path())).await.as_deref(),
            Some("feature/x")
        );
    }
}
