use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GridResult;
use crate::observer::{GridEvent, GridObserver};

/// Bounded retry for provider calls. Only `ProviderUnavailable` is retried;
/// the last error is returned once attempts run out.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause before attempt n is `(n - 1) * backoff_ms`.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_ms: u64) -> Self {
        RetryPolicy {
            max_attempts,
            backoff_ms,
        }
    }

    /// Pause before `attempt`; the first attempt never waits.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let n = u64::from(attempt.saturating_sub(1));
        Duration::from_millis(self.backoff_ms.saturating_mul(n))
    }

    pub fn run<T>(
        &self,
        provider: &str,
        observer: &dyn GridObserver,
        mut call: impl FnMut() -> GridResult<T>,
    ) -> GridResult<T> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    observer.on_event(&GridEvent::ProviderRetry {
                        provider: provider.to_string(),
                        attempt,
                        reason: err.to_string(),
                    });
                    attempt += 1;
                    let pause = self.backoff(attempt);
                    if !pause.is_zero() {
                        thread::sleep(pause);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridError;
    use crate::observer::RecordingObserver;

    #[test]
    fn recovers_after_transient_failures() {
        let observer = RecordingObserver::new();
        let mut calls = 0;
        let value = RetryPolicy::new(3, 0)
            .run("flaky", &observer, || {
                calls += 1;
                if calls < 3 {
                    Err(GridError::unavailable("flaky", "timeout"))
                } else {
                    Ok(42)
                }
            })
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls, 3);
        assert_eq!(
            observer.count(|e| matches!(e, GridEvent::ProviderRetry { .. })),
            2
        );
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let observer = RecordingObserver::new();
        let mut calls = 0;
        let result: GridResult<()> = RetryPolicy::new(2, 0).run("down", &observer, || {
            calls += 1;
            Err(GridError::unavailable("down", "connection refused"))
        });

        assert!(matches!(result, Err(GridError::ProviderUnavailable { .. })));
        assert_eq!(calls, 2);
    }

    #[test]
    fn final_errors_are_not_retried() {
        let observer = RecordingObserver::new();
        let mut calls = 0;
        let result: GridResult<()> = RetryPolicy::new(5, 0).run("model", &observer, || {
            calls += 1;
            Err(GridError::UnsupportedModel("tsyganenko".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert!(observer.events().is_empty());
    }

    #[test]
    fn zero_attempts_still_calls_once() {
        let observer = RecordingObserver::new();
        let value = RetryPolicy::new(0, 0).run("p", &observer, || Ok(1)).unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn backoff_grows_linearly_and_saturates() {
        let policy = RetryPolicy::new(5, 250);
        assert_eq!(policy.backoff(1), Duration::ZERO);
        assert_eq!(policy.backoff(2), Duration::from_millis(250));
        assert_eq!(policy.backoff(4), Duration::from_millis(750));

        let huge = RetryPolicy::new(u32::MAX, u64::MAX);
        assert_eq!(huge.backoff(3), Duration::from_millis(u64::MAX));
        assert_eq!(RetryPolicy::new(3, 0).backoff(3), Duration::ZERO);
    }
}
