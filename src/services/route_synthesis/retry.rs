use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Source of backoff delays, injectable so tests never sleep.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Exponential backoff: the delay before attempt `n + 1` is `base × 2^(n-1)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Run `op` until it succeeds, `should_retry` rejects its error, or the
/// policy's attempts are spent. Returns the last error.
pub async fn with_retry<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    label: &str,
    mut op: F,
    should_retry: R,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= max_attempts || !should_retry(&e) {
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        "{} failed on attempt {}/{}, giving up: {}",
                        label, attempt, max_attempts, e
                    );
                    return Err(e);
                }

                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt = attempt,
                    max_attempts = max_attempts,
                    backoff_ms = delay.as_millis() as u64,
                    "{} failed on attempt {}/{}, retrying in {}ms: {}",
                    label, attempt, max_attempts, delay.as_millis(), e
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records requested delays instead of sleeping.
    #[derive(Default)]
    pub struct RecordingSleeper {
        pub delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }
}
