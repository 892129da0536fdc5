//! Time sources.
//!
//! Request freshness compares monotonic [`Instant`]s; the clipboard window
//! and debug trace keys use wall-clock milliseconds.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Monotonic now.
    fn now(&self) -> Instant;

    /// Milliseconds since the Unix epoch.
    fn wall_millis(&self) -> i64;
}

/// The process clocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|elapsed| i64::try_from(elapsed.as_millis()).ok())
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    wall_base_ms: i64,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Starts at the current instant and the given wall time.
    #[must_use]
    pub fn new(wall_base_ms: i64) -> Self {
        Self {
            base: Instant::now(),
            wall_base_ms,
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves both clocks forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }

    fn offset(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset()
    }

    fn wall_millis(&self) -> i64 {
        let elapsed = i64::try_from(self.offset().as_millis()).unwrap_or(i64::MAX);
        self.wall_base_ms.saturating_add(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn manual_clock_moves_only_when_advanced() {
        let clock = ManualClock::new(1_000);
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_millis(250));

        assert_eq!(clock.now() - start, Duration::from_millis(250));
        assert_eq!(clock.wall_millis(), 1_250);
    }

    #[rstest]
    fn system_clock_reports_post_epoch_time() {
        assert!(SystemClock.wall_millis() > 0);
    }
}
