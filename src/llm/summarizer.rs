//! One-sentence spoken summaries of finished subagent tasks.

use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};

use super::retry::RetryPolicy;
use crate::config::AppConfig;
use crate::error::LlmError;

pub const FALLBACK_SUMMARY: &str = "Subagent task completed";

/// Which provider credentials are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryEnv {
    pub anthropic_key: bool,
    pub openai_key: bool,
}

impl SummaryEnv {
    pub fn from_env() -> Self {
        let present = |name: &str| std::env::var(name).is_ok_and(|v| !v.is_empty());
        Self {
            anthropic_key: present("ANTHROPIC_API_KEY"),
            openai_key: present("OPENAI_API_KEY"),
        }
    }
}

/// A provider chosen for this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryProvider {
    pub name: &'static str,
    pub model: String,
}

type ProviderProbe = fn(&Summarizer) -> Option<SummaryProvider>;

const PROVIDERS: &[ProviderProbe] = &[probe_anthropic, probe_openai];

pub struct Summarizer {
    anthropic_model: String,
    openai_model: String,
    user_name: Option<String>,
    env: SummaryEnv,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(
        anthropic_model: impl Into<String>,
        openai_model: impl Into<String>,
        user_name: Option<String>,
        env: SummaryEnv,
    ) -> Self {
        Self {
            anthropic_model: anthropic_model.into(),
            openai_model: openai_model.into(),
            user_name,
            env,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.anthropic_model.clone(),
            config.openai_model.clone(),
            config.user_name.clone(),
            SummaryEnv::from_env(),
        )
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// First provider whose credentials are present.
    pub fn provider(&self) -> Option<SummaryProvider> {
        PROVIDERS.iter().find_map(|probe| probe(self))
    }

    /// Summarize a finished task. Never fails: any problem yields
    /// [`FALLBACK_SUMMARY`].
    pub async fn summarize(&self, task: &str, agent_name: Option<&str>) -> String {
        let Some(provider) = self.provider() else {
            tracing::debug!("No summarizer credentials, using fallback");
            return FALLBACK_SUMMARY.to_string();
        };

        let prompt = build_prompt(task, agent_name, self.user_name.as_deref());
        let client = Client::default();
        let summary = self
            .retry
            .run(|_| request_summary(&client, &provider.model, &prompt))
            .await;

        match summary {
            Some(text) => {
                tracing::debug!(provider = provider.name, summary = %text, "Generated summary");
                text
            }
            None => FALLBACK_SUMMARY.to_string(),
        }
    }
}

fn probe_anthropic(summarizer: &Summarizer) -> Option<SummaryProvider> {
    summarizer.env.anthropic_key.then(|| SummaryProvider {
        name: "anthropic",
        model: summarizer.anthropic_model.clone(),
    })
}

fn probe_openai(summarizer: &Summarizer) -> Option<SummaryProvider> {
    summarizer.env.openai_key.then(|| SummaryProvider {
        name: "openai",
        model: summarizer.openai_model.clone(),
    })
}

async fn request_summary(client: &Client, model: &str, prompt: &str) -> Result<String, LlmError> {
    let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);
    let options = ChatOptions::default()
        .with_max_tokens(100)
        .with_temperature(0.7);

    let response = client
        .exec_chat(model, request, Some(&options))
        .await
        .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

    clean_response(response.first_text().unwrap_or_default()).ok_or(LlmError::EmptyResponse)
}

/// Prompt asking for a short, conversational announcement.
pub fn build_prompt(task: &str, agent_name: Option<&str>, user_name: Option<&str>) -> String {
    let (agent_context, agent_instruction) = match agent_name {
        Some(name) => (
            format!("The agent named '{name}' completed this task."),
            format!("You can reference the agent by name ('{name}') naturally."),
        ),
        None => (
            "A subagent completed this task.".to_string(),
            "Refer to it as 'your agent' or similar.".to_string(),
        ),
    };

    let address = match user_name {
        Some(name) => format!("- Address the user as \"{name}\" directly (but not always at the start)\n"),
        None => String::new(),
    };

    format!(
        "Generate a brief, conversational summary of a completed task for audio announcement.

Task completed: {task}

Context: {agent_context}

Requirements:
{address}- Keep it under 20 words
- Focus on the outcome and value delivered
- Be conversational and personalized
- {agent_instruction}
- Do NOT include quotes, formatting, or explanations
- Return ONLY the summary text

Example styles:
- \"Authentication is ready with secure JWT token support.\"
- \"Your file watcher is now monitoring for changes.\"
- \"Builder finished setting up the TTS queue with file locks.\"

Generate ONE summary:"
    )
}

/// Strip surrounding quotes and keep only the first line.
pub fn clean_response(raw: &str) -> Option<String> {
    let stripped = raw
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim();
    let first_line = stripped.lines().next().unwrap_or_default().trim();
    (!first_line.is_empty()).then(|| first_line.to_string())
}
