use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{error, warn};

use crate::config::RetryConfig;

/// Classification the retry loop needs from an error type.
pub trait Transient {
    fn is_transient(&self) -> bool;
    fn deadline_exceeded(limit: Duration) -> Self;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
    pub attempt_timeout: Option<Duration>,
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::from_secs(1),
            attempt_timeout: None,
            deadline: None,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
            attempt_timeout: config.attempt_timeout_secs.map(Duration::from_secs),
            deadline: config.deadline_secs.map(Duration::from_secs),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay, ..Self::default() }
    }

    /// Policy that never sleeps between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
            attempt_timeout: None,
            deadline: None,
        }
    }

    /// Delay before retrying after the zero-based `attempt`, without jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u32 << exponent;
        self.base_delay.saturating_mul(multiplier)
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay_for(attempt).saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        let fraction: f64 = rand::thread_rng().gen_range(0.0..1.0);
        self.max_jitter.mul_f64(fraction)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let started = Instant::now();
        let max_attempts = self.attempts();
        let mut attempt = 0;

        loop {
            let outcome = match self.attempt_timeout {
                Some(limit) => match tokio::time::timeout(limit, op()).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(E::deadline_exceeded(limit)),
                },
                None => op().await,
            };

            let failure = match outcome {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };
            attempt += 1;

            if !failure.is_transient() {
                warn!(
                    event_name = "integration.retry.not_retryable",
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms = 0_u64,
                    error = %failure,
                    "operation failed with a non-retryable error"
                );
                return Err(failure);
            }

            if attempt >= max_attempts {
                error!(
                    event_name = "integration.retry.exhausted",
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms = 0_u64,
                    error = %failure,
                    "operation failed; retries exhausted"
                );
                return Err(failure);
            }

            let delay = self.backoff(attempt - 1);
            if let Some(deadline) = self.deadline {
                if started.elapsed().saturating_add(delay) > deadline {
                    error!(
                        event_name = "integration.retry.deadline_reached",
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        deadline_ms = deadline.as_millis() as u64,
                        error = %failure,
                        "operation failed; next retry would pass the deadline"
                    );
                    return Err(failure);
                }
            }

            warn!(
                event_name = "integration.retry.attempt_failed",
                operation,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "operation failed; retrying"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

pub async fn with_retry<T, E, F, Fut>(
    op: F,
    max_attempts: u32,
    base_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    RetryPolicy::new(max_attempts, base_delay).run("operation", op).await
}
