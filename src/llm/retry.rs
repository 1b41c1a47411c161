use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Bounded retry with linear backoff: attempt `n` failing sleeps
/// `backoff * n` before the next attempt. No sleep after the last attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or attempts run out. The closure receives
    /// the 1-based attempt number. Errors are logged and swallowed.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        for attempt in 1..=self.max_attempts {
            match op(attempt).await {
                Ok(value) => return Some(value),
                Err(e) => tracing::debug!(attempt, "LLM attempt failed: {e}"),
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.backoff * attempt).await;
            }
        }
        None
    }
}
