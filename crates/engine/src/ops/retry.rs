//! Bounded retries for transient conflicts, plus the per-attempt timeout.

use std::{future::Future, time::Duration};

use backon::{ExponentialBuilder, Retryable};

use crate::{EngineError, ResultEngine};

use super::Engine;

/// Exponential backoff for `ConcurrencyConflict` retries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = no retries).
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Jittered `base * 2^n` delays, capped at `max_delay`.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries as usize)
            .with_jitter()
    }
}

impl Engine {
    /// Runs `attempt` under the operation timeout, retrying conflicts.
    ///
    /// Each attempt must open its own DB transaction: a failed or timed-out
    /// attempt drops it, which rolls every write of that attempt back.
    pub(crate) async fn run_guarded<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> ResultEngine<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ResultEngine<T>>,
    {
        let timeout = self.config.operation_timeout;

        let timed_attempt = || {
            let fut = attempt();
            async move {
                match tokio::time::timeout(timeout, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(EngineError::Timeout(format!(
                        "{operation} exceeded {}ms",
                        timeout.as_millis()
                    ))),
                }
            }
        };

        let result = timed_attempt
            .retry(self.config.retry.backoff())
            .sleep(tokio::time::sleep)
            .when(EngineError::is_retryable)
            .notify(|err: &EngineError, delay: Duration| {
                tracing::warn!(
                    operation,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after conflict: {err}"
                );
            })
            .await;

        if let Err(err @ EngineError::Persistence(_)) = &result {
            tracing::error!(operation, "persistence failure: {err:?}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use backon::BackoffBuilder;

    use super::*;

    #[test]
    fn backoff_respects_retry_budget() {
        let policy = RetryPolicy {
            max_retries: 5,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff().build().count(), 5);

        let none = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(none.backoff().build().count(), 0);
    }

    #[test]
    fn first_delay_starts_at_base() {
        let policy = RetryPolicy::default();
        let first = policy.backoff().build().next().unwrap();
        assert!(first >= policy.base_delay);
    }
}
