pub mod prompts;
pub mod retry;
pub mod review;
pub mod summarizer;

pub use retry::RetryPolicy;
pub use summarizer::{FALLBACK_SUMMARY, Summarizer};
