use std::path::PathBuf;

/// Errors related to configuration loading and parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config at {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid rule pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Errors related to reading hook input from the host.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Hook input is not valid JSON: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("Hook input must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}

/// Errors related to external program execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Program not found: {0}")]
    NotFound(String),

    #[error("Failed to spawn process: {0}")]
    SpawnFailed(String),

    #[error("Process execution failed: {0}")]
    ProcessFailed(String),
}

/// Errors related to LLM calls (summaries and plan reviews).
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("No API key available (checked {checked})")]
    MissingCredentials { checked: String },

    #[error("Ollama not reachable at {url}: {message}")]
    OllamaUnavailable { url: String, message: String },

    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("Unknown review type '{review_type}' (available: {available})")]
    UnknownReviewType {
        review_type: String,
        available: String,
    },

    #[error("Plan file not found: {path}")]
    PlanNotFound { path: PathBuf },
}

/// Errors related to refreshing documentation pages.
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    #[error("Unknown page: {page} (available: {available})")]
    UnknownPage { page: String, available: String },

    #[error("Failed to fetch {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("Could not extract content from {url}")]
    NoContent { url: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors related to editing session records.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session file not found at {path}")]
    NotFound { path: PathBuf },

    #[error("Error reading JSON from {path}: {message}")]
    InvalidJson { path: PathBuf, message: String },

    #[error("Session record at {path} is not a JSON object")]
    NotAnObject { path: PathBuf },

    #[error("Error writing to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
