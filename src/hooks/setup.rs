use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;

use super::{HookContext, HookInput, HookOutput, HookSpecificOutput};
use crate::event_log::now_iso;
use crate::exec::run_program;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const GIT_MAINTENANCE_TIMEOUT: Duration = Duration::from_secs(10);
const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);
const LOGS_WARN_MB: f64 = 10.0;
const ERROR_PREVIEW_CHARS: usize = 200;

const PROJECT_MARKERS: &[(&str, &str)] = &[
    ("package.json", "Node.js project"),
    ("pyproject.toml", "Python project (pyproject.toml)"),
    ("requirements.txt", "Python project (requirements.txt)"),
    ("Cargo.toml", "Rust project"),
    ("go.mod", "Go project"),
    ("Makefile", "Makefile present"),
];

/// Tools whose versions are reported, with the label shown for each.
const TOOL_PROBES: &[(&str, &str)] = &[
    ("node", "node"),
    ("python", "python3"),
    ("uv", "uv"),
    ("git", "git"),
];

#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    pub install_deps: bool,
    /// File that receives `export NAME="value"` lines for the session.
    pub env_file: Option<PathBuf>,
}

pub async fn run(input: &HookInput, ctx: &HookContext, options: &SetupOptions) -> Result<HookOutput> {
    let mut entry = serde_json::Map::new();
    entry.insert("timestamp".into(), Value::from(now_iso()));
    if let Value::Object(fields) = input.raw() {
        entry.extend(fields.clone());
    }
    ctx.log.append("setup", Value::Object(entry));

    let session_id = input.str_or("session_id", "unknown");
    let trigger = input.str_or("trigger", "init");
    let cwd = match input.path_field("cwd") {
        Some(cwd) => cwd,
        None => std::env::current_dir()?,
    };

    let mut parts = vec![
        format!("Setup triggered: {trigger}"),
        format!("Session: {}...", session_id.chars().take(8).collect::<String>()),
        format!("Working directory: {}", cwd.display()),
    ];

    let project = project_info(&cwd).await;
    if !project.is_empty() {
        parts.push("\n--- Project Information ---".to_string());
        parts.extend(project);
    }

    let tools = tool_versions().await;
    if !tools.is_empty() {
        parts.push("\n--- Available Tools ---".to_string());
        parts.extend(tools);
    }

    match trigger {
        "init" => {
            parts.push("\n--- Repository Initialization ---".to_string());
            if let Some(env_file) = &options.env_file {
                if let Err(e) = persist_env(env_file, "PROJECT_ROOT", &cwd.to_string_lossy()) {
                    tracing::warn!(path = %env_file.display(), "Failed to persist PROJECT_ROOT: {e}");
                }
            }
            if options.install_deps {
                parts.push("Installing dependencies...".to_string());
                let report = install_dependencies(&cwd).await;
                if !report.installed.is_empty() {
                    parts.push(format!("Installed: {}", report.installed.join(", ")));
                }
                if !report.errors.is_empty() {
                    parts.push(format!("Errors: {}", report.errors.join("; ")));
                }
            }
            parts.push("Repository initialized with custom configuration".to_string());
        }
        "maintenance" => {
            parts.push("\n--- Maintenance Tasks ---".to_string());
            parts.extend(maintenance(&cwd, ctx.log.dir()).await);
            parts.push("Maintenance tasks completed".to_string());
        }
        _ => {}
    }

    Ok(HookOutput::specific(HookSpecificOutput::Setup {
        additional_context: parts.join("\n"),
    }))
}

/// Trimmed stdout of a successful run, `None` on any failure.
async fn probe(program: &str, args: &[&str], cwd: Option<&Path>, timeout: Duration) -> Option<String> {
    match run_program(program, args, cwd, timeout).await {
        Ok(result) if result.success() => Some(result.stdout.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(program, "Probe failed: {e}");
            None
        }
    }
}

async fn project_info(cwd: &Path) -> Vec<String> {
    let mut info = Vec::new();

    if let Some(branch) = probe(
        "git",
        &["rev-parse", "--abbrev-ref", "HEAD"],
        Some(cwd),
        PROBE_TIMEOUT,
    )
    .await
    {
        info.push(format!("Git branch: {branch}"));
    }

    for (file, description) in PROJECT_MARKERS {
        if cwd.join(file).exists() {
            info.push(format!("Detected: {description}"));
        }
    }

    let claude_dir = cwd.join(".claude");
    if claude_dir.exists() {
        info.push("Claude Code configuration directory present".to_string());
        for context_file in ["CLAUDE.md", "CONTEXT.md"] {
            if claude_dir.join(context_file).exists() {
                info.push(format!("Found {context_file} in .claude/"));
            }
        }
    }

    info
}

async fn tool_versions() -> Vec<String> {
    let mut versions = Vec::new();
    for (label, program) in TOOL_PROBES {
        if let Some(version) = probe(program, &["--version"], None, PROBE_TIMEOUT).await {
            if !version.is_empty() {
                versions.push(format!("{label}: {version}"));
            }
        }
    }
    versions
}

fn persist_env(env_file: &Path, name: &str, value: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(env_file)?;
    writeln!(file, "export {name}=\"{value}\"")
}

#[derive(Debug, Default)]
struct InstallReport {
    installed: Vec<String>,
    errors: Vec<String>,
}

/// Run one installer, returning a short error description on failure.
async fn install(cwd: &Path, program: &str, args: &[&str]) -> Result<(), String> {
    match run_program(program, args, Some(cwd), INSTALL_TIMEOUT).await {
        Ok(result) if result.success() => Ok(()),
        Ok(result) if result.timed_out => Err("timed out".to_string()),
        Ok(result) => Err(result.stderr.chars().take(ERROR_PREVIEW_CHARS).collect()),
        Err(e) => Err(e.to_string()),
    }
}

async fn install_dependencies(cwd: &Path) -> InstallReport {
    let mut report = InstallReport::default();

    if cwd.join("package.json").exists() {
        let args: &[&str] = if cwd.join("package-lock.json").exists() {
            &["ci"]
        } else {
            &["install"]
        };
        match install(cwd, "npm", args).await {
            Ok(()) => report.installed.push("npm dependencies".to_string()),
            Err(e) => report.errors.push(format!("npm: {e}")),
        }
    }

    let has_requirements = cwd.join("requirements.txt").exists();
    if has_requirements {
        match install(cwd, "pip", &["install", "-r", "requirements.txt"]).await {
            Ok(()) => report.installed.push("pip dependencies".to_string()),
            Err(e) => report.errors.push(format!("pip: {e}")),
        }
    }

    if cwd.join("pyproject.toml").exists() && !has_requirements {
        if install(cwd, "uv", &["sync"]).await.is_ok() {
            report.installed.push("uv dependencies".to_string());
        } else {
            match install(cwd, "pip", &["install", "-e", "."]).await {
                Ok(()) => report.installed.push("pip (pyproject.toml)".to_string()),
                Err(e) => report.errors.push(format!("pyproject.toml: {e}")),
            }
        }
    }

    report
}

async fn maintenance(cwd: &Path, logs_dir: &Path) -> Vec<String> {
    let mut results = Vec::new();

    if logs_dir.exists() {
        let size_mb = dir_size(logs_dir) as f64 / (1024.0 * 1024.0);
        if size_mb > LOGS_WARN_MB {
            results.push(format!("Warning: logs directory is {size_mb:.2}MB"));
        } else {
            results.push(format!("Logs directory size: {size_mb:.2}MB"));
        }
    }

    if probe("git", &["count-objects", "-v"], Some(cwd), GIT_MAINTENANCE_TIMEOUT)
        .await
        .is_some()
    {
        results.push("Git repository status checked".to_string());
    }

    results
}

/// Total size in bytes of all files below `dir`.
fn dir_size(dir: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| match entry.file_type() {
            Ok(ft) if ft.is_dir() => dir_size(&entry.path()),
            Ok(ft) if ft.is_file() => entry.metadata().map(|m| m.len()).unwrap_or(0),
            _ => 0,
        })
        .sum()
}
