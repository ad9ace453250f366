//! Bounded exponential backoff for commit-host requests.

use crate::error::PipelineError;
use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const MAX_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
}

/// Runs `attempt` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is used up. The last error is returned unchanged.
pub async fn retry_transient<T, Fut, F>(policy: RetryPolicy, mut attempt: F) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = ExponentialBackoff {
        initial_interval: policy.initial_interval,
        current_interval: policy.initial_interval,
        max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 0;
    loop {
        attempts += 1;

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempts < max_attempts => {
                let wait = backoff.next_backoff().unwrap_or(policy.initial_interval);
                warn!(
                    error = %error,
                    attempt = attempts,
                    wait_ms = wait.as_millis() as u64,
                    "commit fetch failed, retrying"
                );
                tokio::time::sleep(wait).await;
            }
            Err(error) => return Err(error),
        }
    }
}
