//! Narration backend selection and invocation.
//!
//! Backends are tried in priority order as capability probes; the first
//! probe that yields a command wins. Narration failures never propagate:
//! a missed announcement is acceptable, a failed hook is not.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::AppConfig;
use crate::exec::run_program;

/// Programs tried, in order, when no narration script is usable.
const SYSTEM_SPEECH_PROGRAMS: &[&str] = &["say", "espeak", "spd-say"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationBackend {
    ElevenLabs,
    OpenAi,
    Pyttsx3,
    System,
}

/// A ready-to-run narration invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationCommand {
    pub backend: NarrationBackend,
    pub program: String,
    pub args: Vec<String>,
}

/// Which provider credentials are present. Captured once so selection is
/// a pure function of this snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NarrationEnv {
    pub elevenlabs_key: bool,
    pub openai_key: bool,
}

impl NarrationEnv {
    pub fn from_env() -> Self {
        let present = |name: &str| std::env::var(name).is_ok_and(|v| !v.is_empty());
        Self {
            elevenlabs_key: present("ELEVENLABS_API_KEY"),
            openai_key: present("OPENAI_API_KEY"),
        }
    }
}

type Probe = fn(&Narrator, &str) -> Option<NarrationCommand>;

const PROBES: &[Probe] = &[
    probe_elevenlabs,
    probe_openai,
    probe_pyttsx3,
    probe_system_speech,
];

pub struct Narrator {
    scripts_dir: PathBuf,
    runner: Vec<String>,
    env: NarrationEnv,
    timeout: Duration,
}

impl Narrator {
    pub fn new(
        scripts_dir: impl Into<PathBuf>,
        runner: Vec<String>,
        env: NarrationEnv,
        timeout: Duration,
    ) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            runner,
            env,
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.tts_scripts_dir.clone(),
            config.script_runner.clone(),
            NarrationEnv::from_env(),
            Duration::from_secs(config.narration_timeout_secs),
        )
    }

    /// First available backend for this message.
    pub fn select(&self, message: &str) -> Option<NarrationCommand> {
        PROBES.iter().find_map(|probe| probe(self, message))
    }

    /// Speak `message` with the best available backend, bounded by the
    /// narration timeout. Output is discarded and failures are only logged.
    pub async fn narrate(&self, message: &str) {
        let Some(command) = self.select(message) else {
            tracing::debug!("No narration backend available, skipping");
            return;
        };

        tracing::debug!(backend = ?command.backend, "Narrating");
        match run_program(&command.program, &command.args, None, self.timeout).await {
            Ok(result) if result.timed_out => {
                tracing::debug!(backend = ?command.backend, "Narration timed out");
            }
            Ok(result) if !result.success() => {
                tracing::debug!(
                    backend = ?command.backend,
                    exit_code = ?result.exit_code,
                    stderr = %result.stderr.trim(),
                    "Narration exited unsuccessfully"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(backend = ?command.backend, "Narration failed: {e}"),
        }
    }

    fn script_command(
        &self,
        backend: NarrationBackend,
        script: &str,
        message: &str,
    ) -> Option<NarrationCommand> {
        let script_path = self.scripts_dir.join(script);
        if !script_path.is_file() {
            return None;
        }
        Some(self.run_script(backend, &script_path, message))
    }

    fn run_script(&self, backend: NarrationBackend, script: &Path, message: &str) -> NarrationCommand {
        let script = script.to_string_lossy().into_owned();
        match self.runner.split_first() {
            Some((program, leading)) => {
                let mut args = leading.to_vec();
                args.push(script);
                args.push(message.to_string());
                NarrationCommand {
                    backend,
                    program: program.clone(),
                    args,
                }
            }
            None => NarrationCommand {
                backend,
                program: script,
                args: vec![message.to_string()],
            },
        }
    }
}

fn probe_elevenlabs(narrator: &Narrator, message: &str) -> Option<NarrationCommand> {
    if !narrator.env.elevenlabs_key {
        return None;
    }
    narrator.script_command(NarrationBackend::ElevenLabs, "elevenlabs_tts.py", message)
}

fn probe_openai(narrator: &Narrator, message: &str) -> Option<NarrationCommand> {
    if !narrator.env.openai_key {
        return None;
    }
    narrator.script_command(NarrationBackend::OpenAi, "openai_tts.py", message)
}

fn probe_pyttsx3(narrator: &Narrator, message: &str) -> Option<NarrationCommand> {
    narrator.script_command(NarrationBackend::Pyttsx3, "pyttsx3_tts.py", message)
}

fn probe_system_speech(_narrator: &Narrator, message: &str) -> Option<NarrationCommand> {
    SYSTEM_SPEECH_PROGRAMS.iter().find_map(|name| {
        which::which(name).ok().map(|path| NarrationCommand {
            backend: NarrationBackend::System,
            program: path.to_string_lossy().into_owned(),
            args: vec![message.to_string()],
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripts(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), "# stub").unwrap();
        }
        dir
    }

    fn narrator(dir: &tempfile::TempDir, env: NarrationEnv) -> Narrator {
        Narrator::new(
            dir.path(),
            vec!["uv".into(), "run".into()],
            env,
            Duration::from_secs(1),
        )
    }

    const ALL: &[&str] = &["elevenlabs_tts.py", "openai_tts.py", "pyttsx3_tts.py"];

    #[test]
    fn elevenlabs_wins_when_key_and_script_present() {
        let dir = scripts(ALL);
        let env = NarrationEnv {
            elevenlabs_key: true,
            openai_key: true,
        };
        let command = narrator(&dir, env).select("done").unwrap();
        assert_eq!(command.backend, NarrationBackend::ElevenLabs);
        assert_eq!(command.program, "uv");
        assert_eq!(command.args[0], "run");
        assert!(command.args[1].ends_with("elevenlabs_tts.py"));
        assert_eq!(command.args[2], "done");
    }

    #[test]
    fn key_without_script_falls_through() {
        let dir = scripts(&["openai_tts.py", "pyttsx3_tts.py"]);
        let env = NarrationEnv {
            elevenlabs_key: true,
            openai_key: true,
        };
        let command = narrator(&dir, env).select("done").unwrap();
        assert_eq!(command.backend, NarrationBackend::OpenAi);
    }

    #[test]
    fn local_script_used_without_keys() {
        let dir = scripts(ALL);
        let command = narrator(&dir, NarrationEnv::default()).select("done").unwrap();
        assert_eq!(command.backend, NarrationBackend::Pyttsx3);
    }

    #[test]
    fn without_scripts_only_system_speech_remains() {
        let dir = scripts(&[]);
        let env = NarrationEnv {
            elevenlabs_key: true,
            openai_key: true,
        };
        if let Some(command) = narrator(&dir, env).select("done") {
            assert_eq!(command.backend, NarrationBackend::System);
        }
    }

    #[test]
    fn empty_runner_executes_script_directly() {
        let dir = scripts(&["pyttsx3_tts.py"]);
        let narrator = Narrator::new(
            dir.path(),
            Vec::new(),
            NarrationEnv::default(),
            Duration::from_secs(1),
        );
        let command = narrator.select("hi").unwrap();
        assert!(command.program.ends_with("pyttsx3_tts.py"));
        assert_eq!(command.args, vec!["hi"]);
    }
}
