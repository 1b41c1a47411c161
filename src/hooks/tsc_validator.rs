use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use super::{HookContext, HookInput, HookOutput};
use crate::error::ExecError;
use crate::exec::run_program;

const TSC_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_RELEVANT_LINES: usize = 10;
const MAX_FALLBACK_LINES: usize = 15;
const MAX_SUMMARY_CHARS: usize = 1000;

/// Type-check the project owning an edited TypeScript file.
///
/// Blocks on type errors or timeout. A missing compiler is a silent pass.
pub async fn run(input: &HookInput, _ctx: &HookContext) -> Result<HookOutput> {
    let tool_input = input.tool_input();
    let file_path = tool_input
        .get("file_path")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    if !is_checked_source(file_path) {
        tracing::debug!(file_path, "Skipping file outside the type check");
        return Ok(HookOutput::Silent);
    }

    let absolute = match input.path_field("cwd") {
        Some(cwd) => cwd.join(file_path),
        None => PathBuf::from(file_path),
    };
    let Some(project_dir) = find_project_dir(&absolute) else {
        tracing::debug!(file_path, "No tsconfig.json found, skipping type check");
        return Ok(HookOutput::Silent);
    };

    let (program, args) = tsc_command(&project_dir);
    tracing::debug!(project = %project_dir.display(), %program, ?args, "Running tsc");

    let result = match run_program(&program, &args, Some(&project_dir), TSC_TIMEOUT).await {
        Ok(result) => result,
        Err(ExecError::NotFound(program)) => {
            tracing::debug!(%program, "Type checker not installed, skipping");
            return Ok(HookOutput::Silent);
        }
        Err(e) => {
            tracing::warn!("Type check could not run: {e}");
            return Ok(HookOutput::Silent);
        }
    };

    if result.timed_out {
        return Ok(HookOutput::block(format!(
            "TypeScript type check timed out after {} seconds",
            TSC_TIMEOUT.as_secs()
        )));
    }
    if result.success() {
        tracing::debug!("TypeScript type check passed");
        return Ok(HookOutput::Silent);
    }

    tracing::info!(exit_code = ?result.exit_code, file_path, "TypeScript type check failed");
    let summary = error_summary(file_path, result.stdout.trim(), result.stderr.trim());
    Ok(HookOutput::block(format!(
        "TypeScript type errors found:\n{summary}\n\nPlease fix these type errors before continuing."
    )))
}

/// `.ts`/`.tsx` sources, excluding declarations and dependencies.
fn is_checked_source(file_path: &str) -> bool {
    (file_path.ends_with(".ts") || file_path.ends_with(".tsx"))
        && !file_path.ends_with(".d.ts")
        && !file_path.contains("node_modules")
}

/// Directory of the nearest `tsconfig.json` above the file.
fn find_project_dir(file: &Path) -> Option<PathBuf> {
    file.ancestors()
        .skip(1)
        .filter(|dir| dir.parent().is_some())
        .find(|dir| dir.join("tsconfig.json").exists())
        .map(Path::to_path_buf)
}

/// Local compiler if installed, otherwise the package manager's runner.
fn tsc_command(project_dir: &Path) -> (String, Vec<String>) {
    let local = project_dir.join("node_modules").join(".bin").join("tsc");
    if local.exists() {
        return (
            local.to_string_lossy().into_owned(),
            vec!["--noEmit".to_string()],
        );
    }

    let has = |name: &str| project_dir.join(name).exists();
    let (program, prefix): (&str, &[&str]) = if has("bun.lockb") || has("bun.lock") {
        ("bunx", &[])
    } else if has("pnpm-lock.yaml") {
        ("pnpm", &["exec"])
    } else if has("yarn.lock") {
        ("yarn", &[])
    } else {
        ("npx", &[])
    };

    let args = prefix
        .iter()
        .chain(&["tsc", "--noEmit"])
        .map(|s| s.to_string())
        .collect();
    (program.to_string(), args)
}

/// Lines mentioning the file or a TS error code, else the head of the output.
fn error_summary(file_path: &str, stdout: &str, stderr: &str) -> String {
    let output = [stdout, stderr]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or("TypeScript type check failed");

    let lines: Vec<&str> = output.lines().collect();
    let relevant: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| line.contains(file_path) || line.contains("error TS"))
        .take(MAX_RELEVANT_LINES)
        .collect();

    let summary = if relevant.is_empty() {
        lines
            .into_iter()
            .take(MAX_FALLBACK_LINES)
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        relevant.join("\n")
    };
    summary.chars().take(MAX_SUMMARY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::os::unix::fs::PermissionsExt;

    fn edit(path: &Path) -> HookInput {
        HookInput::parse(
            &json!({"tool_name": "Edit", "tool_input": {"file_path": path.to_string_lossy()}})
                .to_string(),
        )
        .unwrap()
    }

    fn fake_tsc(project: &Path, script: &str) {
        let bin = project.join("node_modules/.bin");
        std::fs::create_dir_all(&bin).unwrap();
        let tsc = bin.join("tsc");
        std::fs::write(&tsc, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&tsc, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn filters_sources() {
        assert!(is_checked_source("src/app.ts"));
        assert!(is_checked_source("src/App.tsx"));
        assert!(!is_checked_source("src/types.d.ts"));
        assert!(!is_checked_source("node_modules/x/index.ts"));
        assert!(!is_checked_source("main.rs"));
    }

    #[test]
    fn picks_runner_from_lock_files() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(tsc_command(dir.path()).0, "npx");

        std::fs::write(dir.path().join("pnpm-lock.yaml"), "").unwrap();
        let (program, args) = tsc_command(dir.path());
        assert_eq!(program, "pnpm");
        assert_eq!(args, vec!["exec", "tsc", "--noEmit"]);

        fake_tsc(dir.path(), "exit 0");
        assert!(tsc_command(dir.path()).0.ends_with("node_modules/.bin/tsc"));
    }

    #[test]
    fn summary_prefers_relevant_lines() {
        let stdout = "src/a.ts(1,1): error TS2322: bad\nnoise\nsrc/b.ts(2,2): error TS1005: worse";
        assert_eq!(
            error_summary("src/a.ts", stdout, ""),
            "src/a.ts(1,1): error TS2322: bad\nsrc/b.ts(2,2): error TS1005: worse"
        );
        assert_eq!(error_summary("x.ts", "", "boom"), "boom");
        assert_eq!(error_summary("x.ts", "", ""), "TypeScript type check failed");
    }

    #[tokio::test]
    async fn blocks_on_type_errors() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("web");
        std::fs::create_dir_all(project.join("src")).unwrap();
        std::fs::write(project.join("tsconfig.json"), "{}").unwrap();
        fake_tsc(&project, "echo 'src/a.ts(3,7): error TS2322: nope'; exit 2");

        let ctx = HookContext::scratch(dir.path());
        let output = run(&edit(&project.join("src/a.ts")), &ctx).await.unwrap();
        let HookOutput::Json(response) = output else {
            panic!("expected a block decision");
        };
        assert_eq!(response.decision, Some("block"));
        let reason = response.reason.unwrap();
        assert!(reason.starts_with("TypeScript type errors found:\n"));
        assert!(reason.contains("error TS2322"));
    }

    #[tokio::test]
    async fn passes_clean_projects_and_files_without_tsconfig() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("web");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("tsconfig.json"), "{}").unwrap();
        fake_tsc(&project, "exit 0");

        let ctx = HookContext::scratch(dir.path());
        let output = run(&edit(&project.join("a.ts")), &ctx).await.unwrap();
        assert_eq!(output, HookOutput::Silent);

        let stray = dir.path().join("elsewhere/b.ts");
        assert_eq!(run(&edit(&stray), &ctx).await.unwrap(), HookOutput::Silent);
    }
}
