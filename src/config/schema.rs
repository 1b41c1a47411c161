use serde::Deserialize;
use std::path::PathBuf;

use crate::safety::rules::RuleSpec;

/// The TOML file structure for hooks.toml.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub general: Option<GeneralConfig>,
    pub tts: Option<TtsConfig>,
    pub llm: Option<LlmConfig>,
    pub safety: Option<SafetyConfig>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub logs_dir: Option<String>,
    pub data_dir: Option<String>,
    /// When set, tracing output is appended here instead of stderr.
    pub debug_log: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TtsConfig {
    pub lock_timeout_secs: Option<u64>,
    pub stale_lock_secs: Option<u64>,
    pub narration_timeout_secs: Option<u64>,
    pub scripts_dir: Option<String>,
    /// Program plus leading args used to run narration scripts, e.g. `["uv", "run"]`.
    pub script_runner: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    pub anthropic_model: Option<String>,
    pub openai_model: Option<String>,
    /// Name the summarizer may address the user by.
    pub user_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SafetyConfig {
    /// If specified, fully replaces the default deny table.
    pub deny_rules: Option<Vec<RuleSpec>>,
    /// If specified, fully replaces the default read-only Bash allow list.
    pub safe_bash_patterns: Option<Vec<String>>,
}

/// Fully-resolved runtime configuration. All fields have values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub logs_dir: PathBuf,
    pub data_dir: PathBuf,
    pub debug_log: Option<PathBuf>,
    pub lock_timeout_secs: u64,
    pub stale_lock_secs: u64,
    pub narration_timeout_secs: u64,
    pub tts_scripts_dir: PathBuf,
    pub script_runner: Vec<String>,
    pub anthropic_model: String,
    pub openai_model: String,
    pub user_name: Option<String>,
    pub deny_rules: Vec<RuleSpec>,
    pub safe_bash_patterns: Vec<String>,
}

impl AppConfig {
    /// Path of the TTS queue lock file.
    pub fn tts_lock_path(&self) -> PathBuf {
        self.data_dir.join("tts_queue").join("tts.lock")
    }

    /// Directory holding per-session records.
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub logs_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub debug_log: Option<PathBuf>,
    pub lock_timeout_secs: Option<u64>,
    pub stale_lock_secs: Option<u64>,
    pub narration_timeout_secs: Option<u64>,
    pub tts_scripts_dir: Option<PathBuf>,
    pub script_runner: Option<Vec<String>>,
    pub anthropic_model: Option<String>,
    pub openai_model: Option<String>,
    pub user_name: Option<String>,
    pub deny_rules: Option<Vec<RuleSpec>>,
    pub safe_bash_patterns: Option<Vec<String>>,
}

impl ConfigFile {
    /// Flatten the sectioned file layout into a PartialConfig.
    pub fn to_partial(self) -> PartialConfig {
        let general = self.general;
        let tts = self.tts;
        let llm = self.llm;
        let safety = self.safety;

        let (logs_dir, data_dir, debug_log) = match general {
            Some(g) => (
                g.logs_dir.map(PathBuf::from),
                g.data_dir.map(PathBuf::from),
                g.debug_log.map(PathBuf::from),
            ),
            None => (None, None, None),
        };

        let mut partial = PartialConfig {
            logs_dir,
            data_dir,
            debug_log,
            ..Default::default()
        };

        if let Some(t) = tts {
            partial.lock_timeout_secs = t.lock_timeout_secs;
            partial.stale_lock_secs = t.stale_lock_secs;
            partial.narration_timeout_secs = t.narration_timeout_secs;
            partial.tts_scripts_dir = t.scripts_dir.map(PathBuf::from);
            partial.script_runner = t.script_runner.filter(|r| !r.is_empty());
        }

        if let Some(l) = llm {
            partial.anthropic_model = l.anthropic_model;
            partial.openai_model = l.openai_model;
            partial.user_name = l.user_name;
        }

        if let Some(s) = safety {
            partial.deny_rules = s.deny_rules;
            partial.safe_bash_patterns = s.safe_bash_patterns;
        }

        partial
    }
}
