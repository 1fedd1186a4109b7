//! Retry policy for streamed completions.
//!
//! [`with_retry`] wraps a stream factory and re-invokes it when the stream
//! fails before producing its first event. Once an event has reached the
//! consumer, later errors are passed through untouched so nothing is
//! delivered twice.

use std::time::Duration;

use futures::StreamExt;
use tracing::warn;

use super::error::LlmError;
use super::types::ApiStream;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// Base duration for exponential backoff
    pub initial_retry_delay: Duration,
    /// Cap on the backoff duration
    pub max_retry_delay: Duration,
    /// Retry every failure instead of only rate limits
    pub retry_all_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(10),
            retry_all_errors: false,
        }
    }
}

impl RetryConfig {
    /// Never re-invoke the factory.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn should_retry(&self, error: &LlmError) -> bool {
        self.retry_all_errors || error.is_rate_limited()
    }

    /// Delay before retry number `attempt` (zero based), never longer than
    /// `max_retry_delay`.
    pub fn backoff(&self, attempt: u32, error: &LlmError) -> Duration {
        if let Some(hint) = error.retry_after() {
            return hint.min(self.max_retry_delay);
        }

        let base_delay = self.initial_retry_delay.as_millis() as f64 * 2_f64.powi(attempt as i32);

        // +/- 10% jitter (0.9 to 1.1)
        let jitter_factor = rand::random::<f64>() * 0.2 + 0.9;
        let delay_ms = (base_delay * jitter_factor) as u64;

        Duration::from_millis(delay_ms).min(self.max_retry_delay)
    }
}

/// Wrap `factory` so failed attempts are re-run according to `config`.
pub fn with_retry<F>(factory: F, config: RetryConfig) -> ApiStream
where
    F: Fn() -> ApiStream + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut attempt = 0u32;

        'attempts: loop {
            let mut inner = factory();
            let mut has_yielded = false;

            while let Some(item) = inner.next().await {
                match item {
                    Ok(event) => {
                        has_yielded = true;
                        yield Ok(event);
                    }
                    Err(err) => {
                        if has_yielded
                            || attempt >= config.max_retries
                            || !config.should_retry(&err)
                        {
                            yield Err(err);
                            break 'attempts;
                        }

                        let delay = config.backoff(attempt, &err);
                        attempt += 1;
                        warn!(
                            attempt,
                            max_retries = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Completion failed, retrying"
                        );

                        drop(inner);
                        tokio::time::sleep(delay).await;
                        continue 'attempts;
                    }
                }
            }

            break;
        }
    })
}
