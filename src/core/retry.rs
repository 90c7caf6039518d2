//! Rate-limit-aware call executor.
//!
//! Wraps one tracker call with bounded retries. Only 429 responses are
//! retried; every other failure goes straight back to the caller. The wait
//! before retry `n` is `base_delay * 2^(n-1)`.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Result, SyncError};

use super::pacing::Sleeper;

/// Default number of attempts, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default wait before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,
    /// Wait before the first retry; doubles on each further retry.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryConfig {
    /// Wait after failed attempt number `attempt` (1-indexed).
    #[must_use]
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1_u32 << exponent)
    }
}

/// Outcome of a single attempt, classified for the retry decision.
#[derive(Debug)]
pub enum CallOutcome<T> {
    Ok(T),
    /// Rate limited; may be retried.
    RetryableFailure(SyncError),
    /// Anything else; returned to the caller unchanged.
    FatalFailure(SyncError),
}

impl<T> CallOutcome<T> {
    /// Classify a raw call result.
    pub fn classify(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) if err.is_rate_limited() => Self::RetryableFailure(err),
            Err(err) => Self::FatalFailure(err),
        }
    }
}

/// What the executor does after an attempt.
#[derive(Debug, PartialEq, Eq)]
enum Decision {
    Return,
    RetryAfter(Duration),
}

fn decide<T>(config: &RetryConfig, attempt: u32, outcome: &CallOutcome<T>) -> Decision {
    match outcome {
        CallOutcome::RetryableFailure(_) if attempt < config.max_attempts.max(1) => {
            Decision::RetryAfter(config.delay_after_attempt(attempt))
        }
        _ => Decision::Return,
    }
}

/// Execute a tracker call, retrying on 429 with exponential backoff.
pub fn call_with_retry<T, F>(config: &RetryConfig, sleeper: &dyn Sleeper, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 1;
    loop {
        let outcome = CallOutcome::classify(operation());
        match decide(config, attempt, &outcome) {
            Decision::RetryAfter(delay) => {
                if let CallOutcome::RetryableFailure(err) = &outcome {
                    warn!(
                        attempt = attempt,
                        delay_ms = delay.as_millis(),
                        error = %err,
                        "Rate limited, backing off"
                    );
                }
                sleeper.sleep(delay);
                attempt += 1;
            }
            Decision::Return => {
                return match outcome {
                    CallOutcome::Ok(value) => Ok(value),
                    CallOutcome::RetryableFailure(err) => {
                        debug!(attempts = attempt, "Retries exhausted");
                        Err(err)
                    }
                    CallOutcome::FatalFailure(err) => Err(err),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::core::pacing::RecordingSleeper;

    fn rate_limited() -> SyncError {
        SyncError::Mutation {
            issue_key: "PRJ-1".into(),
            status: Some(429),
            message: "Too Many Requests".into(),
        }
    }

    fn config(base_ms: u64) -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(base_ms),
        }
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let config = config(100);
        assert_eq!(config.delay_after_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_after_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_after_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn succeeds_first_try_without_waiting() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);
        let result = call_with_retry(&config(100), &sleeper, || {
            calls.set(calls.get() + 1);
            Ok(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
        assert!(sleeper.waits().is_empty());
    }

    #[test]
    fn two_rate_limits_then_success() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);
        let result = call_with_retry(&config(100), &sleeper, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 { Err(rate_limited()) } else { Ok("done") }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[test]
    fn exhausted_retries_return_last_error() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);
        let result: Result<()> = call_with_retry(&config(10), &sleeper, || {
            calls.set(calls.get() + 1);
            Err(rate_limited())
        });
        assert!(result.unwrap_err().is_rate_limited());
        assert_eq!(calls.get(), 3);
        assert_eq!(sleeper.waits().len(), 2);
    }

    #[test]
    fn non_rate_limit_errors_are_not_retried() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);
        let result: Result<()> = call_with_retry(&config(10), &sleeper, || {
            calls.set(calls.get() + 1);
            Err(SyncError::Mutation {
                issue_key: "PRJ-1".into(),
                status: Some(500),
                message: "oops".into(),
            })
        });
        assert_eq!(result.unwrap_err().status(), Some(500));
        assert_eq!(calls.get(), 1);
        assert!(sleeper.waits().is_empty());
    }

    #[test]
    fn zero_attempts_still_calls_once() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);
        let config = RetryConfig {
            max_attempts: 0,
            base_delay: Duration::from_millis(10),
        };
        let result: Result<()> = call_with_retry(&config, &sleeper, || {
            calls.set(calls.get() + 1);
            Err(rate_limited())
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn classify_separates_rate_limits() {
        assert!(matches!(CallOutcome::classify(Ok(1)), CallOutcome::Ok(1)));
        assert!(matches!(
            CallOutcome::<()>::classify(Err(rate_limited())),
            CallOutcome::RetryableFailure(_)
        ));
        assert!(matches!(
            CallOutcome::<()>::classify(Err(SyncError::Http("reset".into()))),
            CallOutcome::FatalFailure(_)
        ));
    }
}
