use crate::http_handler::http_response::response_common::Transient;
use crate::warn;
use rand::Rng;
use std::fmt::Debug;
use std::time::Duration;

/// Bounded retry with exponential backoff and jitter for one-shot REST calls.
/// Only transient failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub attempts: u32,
    /// Delay before the second attempt; doubled for every further one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Cap on the number of doublings of `base_delay`.
    const MAX_DOUBLINGS: u32 = 10;

    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut attempt_once: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Debug,
    {
        let mut attempt = 1;
        loop {
            match attempt_once().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts && e.is_transient() => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "{operation} failed on attempt {attempt}/{}: {e:?}. Retrying in {}ms.",
                        self.attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.saturating_mul(1u32 << (attempt - 1).min(Self::MAX_DOUBLINGS));
        let jitter_ms = u64::try_from(self.base_delay.as_millis() / 2).unwrap_or(u64::MAX);
        exponential + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}
