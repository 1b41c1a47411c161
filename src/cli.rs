use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cc-hooks",
    version,
    about = "Lifecycle hooks and status lines for an AI coding assistant"
)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for per-event JSON logs
    #[arg(long, global = true)]
    pub logs_dir: Option<PathBuf>,

    /// Directory for lock files and session records
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deny dangerous tool calls, log the rest
    PreToolUse,

    /// Log a completed tool call
    PostToolUse,

    /// Log a failed tool call
    PostToolUseFailure,

    /// Log permission requests and optionally decide them
    PermissionRequest {
        /// Only log the request, never emit a decision
        #[arg(long)]
        log_only: bool,

        /// Allow read-only tools and inert shell commands
        #[arg(long)]
        auto_allow: bool,

        /// Deny requests that match the dangerous-action rules
        #[arg(long)]
        deny_dangerous: bool,
    },

    /// Log a subagent start
    SubagentStart {
        /// Announce the start via text-to-speech
        #[arg(long)]
        notify: bool,
    },

    /// Log a subagent completion and optionally announce it
    SubagentStop {
        /// Copy the transcript to logs/chat.json
        #[arg(long)]
        chat: bool,

        /// Announce completion via text-to-speech
        #[arg(long)]
        notify: bool,

        /// Announce a fixed message instead of an LLM summary
        #[arg(long)]
        no_summarize: bool,
    },

    /// Log a session end
    SessionEnd {
        /// Remove temporary files and stale chat copies
        #[arg(long)]
        cleanup: bool,
    },

    /// Log a compaction and optionally back up the transcript
    PreCompact {
        /// Copy the transcript before compaction
        #[arg(long)]
        backup: bool,

        /// Report automatic compactions too
        #[arg(long)]
        verbose: bool,

        /// Print nothing
        #[arg(long)]
        quiet: bool,
    },

    /// Gather project context on init or maintenance
    Setup {
        /// Install project dependencies on init
        #[arg(long)]
        install_deps: bool,

        /// Accepted for compatibility, output is unchanged
        #[arg(long)]
        verbose: bool,
    },

    /// Type-check edited TypeScript files
    TscValidator,

    /// Render a status line from session telemetry
    StatusLine {
        #[arg(long, value_enum, default_value_t = StatusStyle::Pulse)]
        style: StatusStyle,
    },

    /// Set one key in a session record's extras
    SessionExtras {
        session_id: String,
        key: String,
        #[arg(required = true, num_args = 1..)]
        value: Vec<String>,
    },

    /// Summarize a finished task in one sentence
    Summarize {
        task_description: String,

        #[arg(short, long)]
        agent_name: Option<String>,
    },

    /// Review a plan file with an LLM
    Review {
        plan: PathBuf,

        #[arg(long, value_enum, default_value_t = Reviewer::Codex)]
        reviewer: Reviewer,

        /// Review focus; defaults depend on the reviewer
        #[arg(long)]
        review_type: Option<String>,
    },

    /// Refresh local copies of documentation pages
    UpdateDocs {
        #[arg(long, conflicts_with_all = ["all", "list"])]
        page: Option<String>,

        #[arg(long)]
        all: bool,

        #[arg(long)]
        list: bool,
    },

    /// Inspect or manipulate the TTS queue lock
    TtsQueue {
        #[command(subcommand)]
        action: TtsQueueAction,
    },
}

impl Commands {
    /// Hook subcommands must never fail the host; tools may exit non-zero.
    pub fn is_hook(&self) -> bool {
        !matches!(
            self,
            Commands::SessionExtras { .. }
                | Commands::Summarize { .. }
                | Commands::Review { .. }
                | Commands::UpdateDocs { .. }
                | Commands::TtsQueue { .. }
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum TtsQueueAction {
    Status,
    Acquire {
        agent_id: String,
        #[arg(default_value_t = 30)]
        timeout: u64,
    },
    Release {
        agent_id: String,
    },
    Cleanup {
        #[arg(default_value_t = 60)]
        max_age: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusStyle {
    Pulse,
    Cost,
    Tokens,
    ApiTime,
    Changes,
    Segments,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reviewer {
    Codex,
    Kimi,
    Ollama,
}
