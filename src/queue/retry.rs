//! Bounded retry helper for render attempts

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::SchedulerConfig;
use crate::error::Result;

/// Retry policy: total attempts plus an optional fixed backoff with jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first; never less than 1
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff_ms: 0,
            jitter_ms: 0,
        }
    }
}

impl From<&SchedulerConfig> for RetryPolicy {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_ms: config.retry_backoff_ms,
            jitter_ms: config.retry_jitter_ms,
        }
    }
}

impl RetryPolicy {
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Run `op` until it succeeds or the attempts are exhausted.
    /// `op` receives the 1-based attempt number; the last error is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts => {
                    warn!(
                        operation = %label,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    let delay = self.delay();
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn delay(&self) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.backoff_ms + jitter)
    }
}
