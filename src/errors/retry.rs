use std::time::Duration;
use std::future::Future;

use super::classification::ErrorClassification;
use super::types::DangleError;
use tracing::warn;

const MAX_DELAY_SECS: f64 = 30.0;

impl ErrorClassification {
    /// Calculate the retry delay for the given attempt (0-indexed).
    ///
    /// Exponential backoff `base * 2^attempt` plus up to one `base` of random
    /// jitter, capped at 30s. A zero base disables waiting entirely.
    pub fn retry_delay(&self, attempt: u32, base: Duration) -> Duration {
        if base.is_zero() {
            return Duration::ZERO;
        }
        let base_secs = base.as_secs_f64();
        let factor: f64 = 2.0_f64.powi(attempt as i32);
        let jitter: f64 = rand::random::<f64>() * base_secs;
        let secs = (base_secs * factor + jitter).min(MAX_DELAY_SECS);
        Duration::from_secs_f64(secs)
    }
}

/// Retry configuration for batched network operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// Retry budget without any waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self { max_retries, base_delay: Duration::ZERO }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Execute an async operation with retry logic.
///
/// Retries only if the error is classified as retryable and we haven't
/// exceeded max_retries.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut factory: F,
) -> Result<T, DangleError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DangleError>>,
{
    let max_attempts = config.max_retries + 1;
    let mut last_error = None;

    for attempt in 0..max_attempts {
        match factory().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let classification = e.classify();

                if !classification.retryable || attempt + 1 >= max_attempts {
                    if !classification.retryable {
                        warn!(
                            operation = operation_name,
                            error_type = classification.error_type,
                            "Non-retryable error, failing immediately"
                        );
                    } else {
                        warn!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            max = max_attempts,
                            "Max retries exhausted"
                        );
                    }
                    return Err(e);
                }

                let delay = classification.retry_delay(attempt, config.base_delay);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max = max_attempts,
                    error_type = classification.error_type,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after error"
                );

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| DangleError::Internal("Retry loop exited unexpectedly".into())))
}
