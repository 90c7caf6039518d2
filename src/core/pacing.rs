//! Waiting, behind a trait so pacing and backoff can be observed in tests.

use std::cell::RefCell;
use std::time::Duration;

use tracing::trace;

/// Something that can block the current thread for a while.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        trace!(delay_ms = duration.as_millis(), "sleeping");
        std::thread::sleep(duration);
    }
}

/// Sleeper that only records the requested waits.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.borrow().clone()
    }

    pub fn total(&self) -> Duration {
        self.waits.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sleeper_keeps_order() {
        let sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_millis(5));
        sleeper.sleep(Duration::from_millis(10));
        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_millis(5), Duration::from_millis(10)]
        );
        assert_eq!(sleeper.total(), Duration::from_millis(15));
    }
}
