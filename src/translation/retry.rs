use crate::utils::{JsonTranslatorError, Result, TranslationSessionConfig};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded exponential backoff: attempt `n` (0-based) waits `base_delay * 2^n` before retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &TranslationSessionConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    pub fn no_delay(max_attempts: usize) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    pub fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16) as u32);
        self.base_delay.saturating_mul(factor)
    }

    /// Runs `op` until it succeeds or the attempts are used up; returns the last error.
    pub async fn run<F, Fut, T>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(attempt = attempt, error = %e, "Translation request failed");
                    last_error = Some(e);

                    if attempt + 1 < self.max_attempts {
                        let delay = self.delay_for(attempt);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            JsonTranslatorError::TranslationFailed("Unknown error".to_string())
        }))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}
