//! Retry with exponential backoff and jitter
//!
//! Transient failures (5xx, 429, timeouts, connection resets) are
//! retried up to the configured attempt count; permanent failures abort
//! immediately. Jitter spreads concurrent workers so they do not hammer
//! a recovering upstream in lockstep.

use crate::{ClientError, ClientResult};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const MAX_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, base_delay: Duration::from_millis(250) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay }
    }

    /// Delay before the retry following `attempt` (1-based): exponential
    /// in the attempt number, capped, scaled by a random factor in
    /// [0.5, 1.5).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1u32 << (attempt - 1).min(16));
        let capped = exp.min(MAX_DELAY);
        capped.mul_f64(0.5 + rand::thread_rng().gen::<f64>())
    }
}

/// How a single attempt ended.
pub enum Attempt<T> {
    Success(T),
    /// Worth retrying: 5xx, 429, timeout, connection failure.
    Transient(String),
    /// Not worth retrying: other 4xx, malformed request.
    Permanent(String),
}

/// Run `op` until it succeeds, fails permanently, or the policy's
/// attempts are exhausted.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut last_message = String::new();

    for attempt in 1..=policy.max_attempts {
        match op().await {
            Attempt::Success(value) => return Ok(value),
            Attempt::Permanent(message) => {
                warn!("{label}: permanent failure, not retrying: {message}");
                return Err(ClientError::Permanent(message));
            }
            Attempt::Transient(message) => {
                last_message = message;
                if attempt < policy.max_attempts {
                    let delay = policy.delay_after(attempt);
                    warn!(
                        "{label}: attempt {attempt}/{} failed ({last_message}), retrying in {:.2}s",
                        policy.max_attempts,
                        delay.as_secs_f64(),
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(ClientError::Exhausted { attempts: policy.max_attempts, message: last_message })
}

/// Classify an HTTP status for retry purposes.
pub fn classify_status(status: reqwest::StatusCode) -> Option<bool> {
    if status.is_success() {
        None
    } else if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Some(true)
    } else {
        Some(false)
    }
}
