use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cc_hooks::cli::{Cli, Commands, TtsQueueAction};
use cc_hooks::config::{self, AppConfig};
use cc_hooks::docs;
use cc_hooks::hooks::{
    self, HookContext, HookInput, HookOutput, permission_request::PermissionMode,
    pre_compact::CompactOptions, setup::SetupOptions, subagent_stop::StopOptions,
};
use cc_hooks::llm::{Summarizer, review};
use cc_hooks::session_store::SessionStore;
use cc_hooks::status_line;
use cc_hooks::tts::TtsQueueLock;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Stderr by default; the configured debug log file when one is set.
fn init_tracing(config: &AppConfig) {
    if let Some(path) = &config.debug_log {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter())
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .init();
                return;
            }
            Err(e) => eprintln!("cc-hooks: cannot open debug log {}: {e}", path.display()),
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Hosts treat a non-zero hook exit as failure, so bad arguments
            // only print usage.
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    // Config problems are reported on stderr before the real subscriber exists.
    let startup = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .finish();
    let config = tracing::subscriber::with_default(startup, || config::load_config(&cli));
    init_tracing(&config);

    if cli.command.is_hook() {
        run_hook(cli.command, config).await;
        return ExitCode::SUCCESS;
    }

    match run_tool(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run one hook. Every failure is logged and swallowed.
async fn run_hook(command: Commands, config: AppConfig) {
    let mut stdin = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut stdin) {
        tracing::debug!("Failed to read stdin: {e}");
        return;
    }

    if let Commands::StatusLine { style } = command {
        println!("{}", status_line::render_from_json(&stdin, style).await);
        return;
    }

    let input = match HookInput::parse(&stdin) {
        Ok(input) => input,
        Err(e) => {
            tracing::debug!("Ignoring hook input: {e}");
            return;
        }
    };

    let ctx = HookContext::new(config);
    let result = dispatch_hook(command, &input, &ctx).await;
    match result {
        Ok(output) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = output.write_to(&mut stdout).and_then(|_| stdout.flush()) {
                tracing::debug!("Failed to write hook output: {e}");
            }
        }
        Err(e) => tracing::warn!("Hook failed: {e:#}"),
    }
}

async fn dispatch_hook(
    command: Commands,
    input: &HookInput,
    ctx: &HookContext,
) -> anyhow::Result<HookOutput> {
    match command {
        Commands::PreToolUse => hooks::pre_tool_use::run(input, ctx),
        Commands::PostToolUse => hooks::post_tool_use::run(input, ctx),
        Commands::PostToolUseFailure => hooks::post_tool_use_failure::run(input, ctx),
        Commands::PermissionRequest {
            log_only,
            auto_allow,
            deny_dangerous,
        } => hooks::permission_request::run(
            input,
            ctx,
            PermissionMode {
                log_only,
                auto_allow,
                deny_dangerous,
            },
        ),
        Commands::SubagentStart { notify } => hooks::subagent_start::run(input, ctx, notify).await,
        Commands::SubagentStop {
            chat,
            notify,
            no_summarize,
        } => {
            let options = StopOptions {
                chat,
                notify,
                summarize: !no_summarize,
            };
            hooks::subagent_stop::run(input, ctx, options).await
        }
        Commands::SessionEnd { cleanup } => hooks::session_end::run(input, ctx, cleanup),
        Commands::PreCompact {
            backup,
            verbose,
            quiet,
        } => hooks::pre_compact::run(
            input,
            ctx,
            CompactOptions {
                backup,
                verbose,
                quiet,
            },
        ),
        Commands::Setup { install_deps, .. } => {
            let options = SetupOptions {
                install_deps,
                env_file: std::env::var_os("CLAUDE_ENV_FILE")
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from),
            };
            hooks::setup::run(input, ctx, &options).await
        }
        Commands::TscValidator => hooks::tsc_validator::run(input, ctx).await,
        other => anyhow::bail!("{other:?} is not a hook"),
    }
}

/// Maintenance commands. Errors become exit code 1, except for
/// `session-extras`, which reports failures on stdout and succeeds.
async fn run_tool(command: Commands, config: &AppConfig) -> anyhow::Result<ExitCode> {
    match command {
        Commands::SessionExtras {
            session_id,
            key,
            value,
        } => {
            // Status-line helpers are called from scripts; report and exit 0.
            match SessionStore::new(config.sessions_dir()).set_extra(
                &session_id,
                &key,
                &value.join(" "),
            ) {
                Ok(update) => println!("{update}"),
                Err(e) => println!("Error: {e}"),
            }
        }
        Commands::Summarize {
            task_description,
            agent_name,
        } => {
            let summary = Summarizer::from_config(config)
                .summarize(&task_description, agent_name.as_deref())
                .await;
            println!("{summary}");
        }
        Commands::Review {
            plan,
            reviewer,
            review_type,
        } => {
            let project_dir = project_dir()?;
            let markdown =
                review::run_review(reviewer, &plan, review_type.as_deref(), &project_dir).await?;
            println!("{markdown}");
        }
        Commands::UpdateDocs { page, all, list } => {
            if list {
                println!("{}", docs::page_listing());
                return Ok(ExitCode::SUCCESS);
            }
            let pages: Vec<&docs::DocPage> = match (page, all) {
                (_, true) => docs::PAGES.iter().collect(),
                (Some(name), false) => vec![docs::find_page(&name)?],
                (None, false) => {
                    eprintln!("Nothing to do: pass --page <name>, --all, or --list");
                    return Ok(ExitCode::SUCCESS);
                }
            };
            let updated = docs::update_pages(&pages, Path::new("ai_docs")).await;
            if updated < pages.len() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::TtsQueue { action } => return tts_queue(action, config).await,
        hook => anyhow::bail!("{hook:?} is a hook, not a tool"),
    }
    Ok(ExitCode::SUCCESS)
}

async fn tts_queue(action: TtsQueueAction, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let mut lock = TtsQueueLock::new(config.tts_lock_path());
    match action {
        TtsQueueAction::Status => {
            if !lock.is_locked() {
                println!("Available");
            } else if let Some(record) = lock.read_record() {
                println!("Locked by: {}", record.agent_id);
                println!("Since: {}", record.timestamp);
                println!("PID: {}", record.pid);
            } else {
                println!("Locked (no info available)");
            }
        }
        TtsQueueAction::Acquire { agent_id, timeout } => {
            let wait = Duration::from_secs(timeout);
            let holder = agent_id.clone();
            let (_lock, acquired) = tokio::task::spawn_blocking(move || {
                let acquired = lock.acquire(&holder, wait);
                (lock, acquired)
            })
            .await
            .context("lock acquisition task panicked")?;
            if !acquired {
                println!("Failed to acquire lock within {timeout}s");
                return Ok(ExitCode::FAILURE);
            }
            println!("Lock acquired for {agent_id}");
        }
        TtsQueueAction::Release { agent_id } => {
            lock.release(&agent_id);
            println!("Lock released for {agent_id}");
        }
        TtsQueueAction::Cleanup { max_age } => {
            lock.cleanup_stale(Duration::from_secs(max_age));
            println!("Cleaned up locks older than {max_age}s");
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// `$CLAUDE_PROJECT_DIR`, else the working directory.
fn project_dir() -> anyhow::Result<PathBuf> {
    match std::env::var_os("CLAUDE_PROJECT_DIR").filter(|v| !v.is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => std::env::current_dir().context("resolving the working directory"),
    }
}
