//! Exponential backoff for calls to the inference service.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::EmbeddingError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    #[serde(with = "crate::serde_millis")]
    pub base_delay: Duration,
    #[serde(with = "crate::serde_millis")]
    pub max_delay: Duration,
    /// Add up to 50% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A config that makes exactly one attempt.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Outcome of [`execute_with_retry`].
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, EmbeddingError>,
    /// Attempts made (1 = no retry was needed).
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent.
pub async fn execute_with_retry<T, F, Fut>(config: &RetryConfig, mut operation: F) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, EmbeddingError>>,
{
    let start = Instant::now();
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt + 1,
                    elapsed: start.elapsed(),
                }
            }
            Err(err) if err.is_retryable() && attempt < config.max_retries => {
                let delay = calculate_delay(config, attempt);
                tracing::warn!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, error = %err, "retrying embedding request");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                return RetryOutcome {
                    result: Err(err),
                    attempts: attempt + 1,
                    elapsed: start.elapsed(),
                }
            }
        }
    }
}

fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let base = config.base_delay.as_millis() as u64;
    let exponential = base.saturating_mul(2_u64.saturating_pow(attempt));
    let delay = exponential.min(config.max_delay.as_millis() as u64);

    if config.jitter {
        let jitter = fastrand::u64(0..=delay / 2);
        Duration::from_millis(delay + jitter)
    } else {
        Duration::from_millis(delay)
    }
}

/// Whether an HTTP status from the inference service is worth retrying.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429) || ((500..600).contains(&status) && status != 501)
}
