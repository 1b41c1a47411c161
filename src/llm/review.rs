//! Headless plan reviews by a second model.
//!
//! Each reviewer has a fixed table of review types. The plan file is wrapped
//! in the chosen reviewer instructions, sent as one chat request, and the
//! answer is printed under a markdown header. Local reviewers also append a
//! telemetry line to `logs/review_telemetry.jsonl` in the project dir.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use serde::Serialize;

use super::prompts;
use crate::cli::Reviewer;
use crate::error::LlmError;
use crate::event_log::EventLog;

const CODEX_MODEL: &str = "codex-mini-latest";
const DEFAULT_LOCAL_MODEL: &str = "llama3.2:3b";
const OLLAMA_URL: &str = "http://localhost:11434/";

/// Static description of one reviewer.
struct ReviewerProfile {
    title: &'static str,
    default_type: &'static str,
    types: &'static [(&'static str, &'static str)],
    system_prompt: &'static str,
    closing: &'static str,
    temperature: Option<f64>,
    max_tokens: u32,
    /// Telemetry id; reviewers without one write no telemetry.
    review_id: Option<&'static str>,
    local: bool,
}

const GENERAL_CLOSING: &str = "Provide your review now. Be specific, actionable, and reference \
                               exact sections/task IDs from the plan.";

const CODEX: ReviewerProfile = ReviewerProfile {
    title: "Codex Review",
    default_type: "architecture",
    types: &[
        ("architecture", prompts::ARCHITECTURE),
        ("implementation", prompts::IMPLEMENTATION),
        ("quality", prompts::QUALITY),
    ],
    system_prompt: "You are a senior software engineer conducting a thorough plan review. \
                    Be specific, actionable, and critical. Reference exact sections and task IDs.",
    closing: GENERAL_CLOSING,
    temperature: None,
    max_tokens: 16384,
    review_id: None,
    local: false,
};

const KIMI: ReviewerProfile = ReviewerProfile {
    title: "Kimi Review",
    default_type: "simplicity",
    types: &[
        ("simplicity", prompts::SIMPLICITY),
        ("architecture", prompts::ARCHITECTURE),
    ],
    system_prompt: "You are a senior software engineer conducting a thorough plan review focused \
                    on simplicity and developer experience. Be specific, actionable, and critical. \
                    Reference exact sections and task IDs. Prefer the simplest solution that works.",
    closing: GENERAL_CLOSING,
    temperature: Some(0.3),
    max_tokens: 4096,
    review_id: Some("0A"),
    local: true,
};

const OLLAMA: ReviewerProfile = ReviewerProfile {
    title: "Ollama Security Review",
    default_type: "security",
    types: &[
        ("security", prompts::SECURITY),
        ("architecture", prompts::SECURE_ARCHITECTURE),
    ],
    system_prompt: "You are a security engineer conducting a thorough security review of a \
                    software implementation plan. Focus on exploitable vulnerabilities, missing \
                    security controls, and hardening opportunities. Be specific and reference \
                    exact sections.",
    closing: "Provide your security review now. Be specific about attack vectors and reference \
              exact sections/task IDs from the plan.",
    temperature: Some(0.2),
    max_tokens: 4096,
    review_id: Some("0B"),
    local: true,
};

fn profile(reviewer: Reviewer) -> &'static ReviewerProfile {
    match reviewer {
        Reviewer::Codex => &CODEX,
        Reviewer::Kimi => &KIMI,
        Reviewer::Ollama => &OLLAMA,
    }
}

/// Model a reviewer uses, from the environment where applicable.
pub fn reviewer_model(reviewer: Reviewer) -> String {
    let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    match reviewer {
        Reviewer::Codex => CODEX_MODEL.to_string(),
        Reviewer::Kimi => env("KIMI_MODEL").unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string()),
        Reviewer::Ollama => env("OLLAMA_SECURITY_MODEL")
            .or_else(|| env("OLLAMA_MODEL"))
            .unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string()),
    }
}

/// A resolved review request.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub reviewer: Reviewer,
    pub review_type: String,
    pub model: String,
    pub plan_path: PathBuf,
    pub plan_content: String,
}

impl ReviewRequest {
    /// Validate the review type and load the plan.
    pub fn prepare(
        reviewer: Reviewer,
        plan_path: &Path,
        review_type: Option<&str>,
    ) -> Result<Self, LlmError> {
        let profile = profile(reviewer);
        let review_type = review_type.unwrap_or(profile.default_type);
        if !profile.types.iter().any(|(name, _)| *name == review_type) {
            return Err(LlmError::UnknownReviewType {
                review_type: review_type.to_string(),
                available: available_types(reviewer).join(", "),
            });
        }

        let plan_content =
            std::fs::read_to_string(plan_path).map_err(|_| LlmError::PlanNotFound {
                path: plan_path.to_path_buf(),
            })?;

        Ok(Self {
            reviewer,
            review_type: review_type.to_string(),
            model: reviewer_model(reviewer),
            plan_path: plan_path.to_path_buf(),
            plan_content,
        })
    }

    /// Full user prompt: instructions, the plan, and the closing request.
    pub fn prompt(&self) -> String {
        let profile = profile(self.reviewer);
        let instructions = profile
            .types
            .iter()
            .find(|(name, _)| *name == self.review_type)
            .map(|(_, text)| *text)
            .unwrap_or_default();
        format!(
            "{instructions}\n\n## The Plan to Review\n\n{}\n\n---\n\n{}",
            self.plan_content, profile.closing
        )
    }

    /// Markdown header plus the review body.
    pub fn render(&self, review_text: &str) -> String {
        let profile = profile(self.reviewer);
        let model = if profile.local {
            format!("{} (local via Ollama)", self.model)
        } else {
            self.model.clone()
        };
        format!(
            "## {} ({})\n**Model**: {}\n**Review Type**: {}\n**Plan File**: {}\n\n---\n\n{}",
            profile.title,
            title_case(&self.review_type),
            model,
            self.review_type,
            self.plan_path.display(),
            review_text
        )
    }

    /// Telemetry entry for this review, when the reviewer records telemetry.
    pub fn telemetry(&self, duration: Duration, review_text: &str) -> Option<ReviewTelemetry> {
        let review_id = profile(self.reviewer).review_id?;
        let file_name = self
            .plan_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Some(ReviewTelemetry {
            plan_id: file_name.replace(".md", ""),
            review_id: review_id.to_string(),
            model_name: self.model.clone(),
            review_type: self.review_type.clone(),
            duration_ms: duration.as_millis() as u64,
            raw_markdown: review_text.to_string(),
            timestamp: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        })
    }
}

/// One line of `review_telemetry.jsonl`.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewTelemetry {
    pub plan_id: String,
    pub review_id: String,
    pub model_name: String,
    pub review_type: String,
    pub duration_ms: u64,
    pub raw_markdown: String,
    pub timestamp: String,
}

pub fn available_types(reviewer: Reviewer) -> Vec<&'static str> {
    profile(reviewer).types.iter().map(|(name, _)| *name).collect()
}

/// Run a complete review and return the rendered markdown.
/// Telemetry failures are reported on stderr and do not fail the review.
pub async fn run_review(
    reviewer: Reviewer,
    plan_path: &Path,
    review_type: Option<&str>,
    project_dir: &Path,
) -> Result<String, LlmError> {
    let request = ReviewRequest::prepare(reviewer, plan_path, review_type)?;
    let profile = profile(reviewer);

    if profile.local {
        check_ollama_running().await?;
    } else if std::env::var("OPENAI_API_KEY").map_or(true, |k| k.is_empty()) {
        return Err(LlmError::MissingCredentials {
            checked: "OPENAI_API_KEY".to_string(),
        });
    }

    eprintln!(
        "Calling {} for {} review...",
        request.model, request.review_type
    );

    let chat = ChatRequest::new(vec![
        ChatMessage::system(profile.system_prompt),
        ChatMessage::user(request.prompt()),
    ]);
    let mut options = ChatOptions::default().with_max_tokens(profile.max_tokens);
    if let Some(temperature) = profile.temperature {
        options = options.with_temperature(temperature);
    }

    let started = Instant::now();
    let response = Client::default()
        .exec_chat(&request.model, chat, Some(&options))
        .await
        .map_err(|e| LlmError::RequestFailed(e.to_string()))?;
    let review_text = response
        .first_text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(LlmError::EmptyResponse)?
        .to_string();

    if let Some(entry) = request.telemetry(started.elapsed(), &review_text) {
        let log = EventLog::new(project_dir.join("logs"));
        let result = serde_json::to_value(&entry)
            .map_err(std::io::Error::from)
            .and_then(|value| log.append_line("review_telemetry.jsonl", &value));
        if let Err(e) = result {
            eprintln!("Warning: Failed to write telemetry: {e}");
        }
    }

    Ok(request.render(&review_text))
}

/// Quick reachability probe so a stopped Ollama fails with a clear message.
async fn check_ollama_running() -> Result<(), LlmError> {
    reqwest::Client::new()
        .get(OLLAMA_URL)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .map_err(|e| LlmError::OllamaUnavailable {
            url: OLLAMA_URL.to_string(),
            message: format!("Is Ollama running? {e}"),
        })?;
    Ok(())
}

fn title_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn plan_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        writeln!(file, "# Plan\n\n1. Build the thing").unwrap();
        file
    }

    #[test]
    fn defaults_per_reviewer() {
        let plan = plan_file();
        let codex = ReviewRequest::prepare(Reviewer::Codex, plan.path(), None).unwrap();
        assert_eq!(codex.review_type, "architecture");
        assert_eq!(codex.model, "codex-mini-latest");

        let kimi = ReviewRequest::prepare(Reviewer::Kimi, plan.path(), None).unwrap();
        assert_eq!(kimi.review_type, "simplicity");

        let ollama = ReviewRequest::prepare(Reviewer::Ollama, plan.path(), None).unwrap();
        assert_eq!(ollama.review_type, "security");
    }

    #[test]
    fn unknown_type_lists_available() {
        let plan = plan_file();
        let err = ReviewRequest::prepare(Reviewer::Kimi, plan.path(), Some("quality")).unwrap_err();
        match err {
            LlmError::UnknownReviewType { available, .. } => {
                assert_eq!(available, "simplicity, architecture");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_plan_is_reported() {
        let err = ReviewRequest::prepare(Reviewer::Codex, Path::new("/no/such/plan.md"), None)
            .unwrap_err();
        assert!(matches!(err, LlmError::PlanNotFound { .. }));
    }

    #[test]
    fn prompt_embeds_plan_between_instructions_and_closing() {
        let plan = plan_file();
        let request =
            ReviewRequest::prepare(Reviewer::Ollama, plan.path(), Some("security")).unwrap();
        let prompt = request.prompt();
        assert!(prompt.starts_with("You are a security engineer"));
        assert!(prompt.contains("## The Plan to Review\n\n# Plan"));
        assert!(prompt.ends_with("exact sections/task IDs from the plan."));
    }

    #[test]
    fn render_has_header_and_body() {
        let plan = plan_file();
        let request =
            ReviewRequest::prepare(Reviewer::Codex, plan.path(), Some("quality")).unwrap();
        let rendered = request.render("### VERDICT: PASS");
        assert!(rendered.starts_with("## Codex Review (Quality)\n**Model**: codex-mini-latest\n"));
        assert!(rendered.ends_with("---\n\n### VERDICT: PASS"));
    }

    #[test]
    fn telemetry_only_for_local_reviewers() {
        let plan = plan_file();
        let codex = ReviewRequest::prepare(Reviewer::Codex, plan.path(), None).unwrap();
        assert!(codex.telemetry(Duration::from_millis(5), "x").is_none());

        let kimi = ReviewRequest::prepare(Reviewer::Kimi, plan.path(), None).unwrap();
        let entry = kimi.telemetry(Duration::from_millis(1500), "review").unwrap();
        assert_eq!(entry.review_id, "0A");
        assert_eq!(entry.duration_ms, 1500);
        assert!(!entry.plan_id.ends_with(".md"));
    }

    #[test]
    fn title_case_capitalizes_first_letter() {
        assert_eq!(title_case("architecture"), "Architecture");
        assert_eq!(title_case(""), "");
    }
}
