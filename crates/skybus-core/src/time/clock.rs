//! Monotonic clock sources.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use super::duration::Duration;
use super::time_point::{SpacecraftElapsedTime, TimePoint};

/// Source of the current spacecraft-elapsed time.
///
/// All blocking primitives and the software bus take their notion of "now"
/// from a `Clock` so that tests can substitute a [`TestingClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> TimePoint<SpacecraftElapsedTime>;
}

/// Production clock backed by the host's monotonic tick counter.
///
/// Tick-to-microsecond conversion saturates instead of overflowing; with a
/// 64-bit microsecond range this happens after ~292000 years of uptime.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Create a clock whose epoch is the moment of construction.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> TimePoint<SpacecraftElapsedTime> {
        let elapsed = self.start.elapsed().as_micros();
        let micros = if elapsed > i64::MAX as u128 {
            i64::MAX
        } else {
            elapsed as i64
        };
        TimePoint::after_epoch(Duration::microseconds(micros))
    }
}

/// Deterministic clock for tests: time only moves when told to.
pub struct TestingClock {
    now_microseconds: AtomicI64,
}

impl TestingClock {
    pub fn new(start: TimePoint<SpacecraftElapsedTime>) -> Self {
        Self {
            now_microseconds: AtomicI64::new(
                start.duration_since_epoch().as_microseconds(),
            ),
        }
    }

    pub fn set_time(&self, now: TimePoint<SpacecraftElapsedTime>) {
        self.now_microseconds
            .store(now.duration_since_epoch().as_microseconds(), Ordering::SeqCst);
    }

    /// Advance the clock by the given amount.
    pub fn advance_by(&self, delta: Duration) {
        self.now_microseconds
            .fetch_add(delta.as_microseconds(), Ordering::SeqCst);
    }
}

impl Default for TestingClock {
    fn default() -> Self {
        Self::new(TimePoint::start_of_epoch())
    }
}

impl Clock for TestingClock {
    fn now(&self) -> TimePoint<SpacecraftElapsedTime> {
        TimePoint::after_epoch(Duration::microseconds(
            self.now_microseconds.load(Ordering::SeqCst),
        ))
    }
}
