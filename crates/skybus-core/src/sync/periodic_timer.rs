//! Periodic execution boundary for rate-group threads.

use std::time::Instant;

use crate::time::Duration;

/// Blocks a thread until the next multiple of a fixed period.
///
/// The period grid is anchored at construction. Each call to
/// [`next_period`](PeriodicTimer::next_period) sleeps until the next grid
/// point and reports whether that point had already passed when the call was
/// made (a missed deadline). After a miss the timer re-synchronizes to the
/// grid instead of trying to catch up, so one long cycle does not cause a
/// burst of immediate wakeups.
pub struct PeriodicTimer {
    period: Duration,
    start: Instant,
    cycle: u64,
}

impl PeriodicTimer {
    /// Create a timer with the given period. Zero or negative periods are
    /// normalized to one microsecond.
    pub fn new(period: Duration) -> Self {
        let period = if period <= Duration::zero() {
            Duration::microseconds(1)
        } else {
            period
        };
        Self {
            period,
            start: Instant::now(),
            cycle: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next period boundary.
    ///
    /// Returns `true` when the boundary this call was aiming for had already
    /// passed (the previous cycle overran its budget).
    pub fn next_period(&mut self) -> bool {
        self.cycle += 1;

        let period_us = self.period.as_microseconds() as u128;
        let elapsed_us = self.start.elapsed().as_micros();
        let target_us = period_us.saturating_mul(self.cycle as u128);

        if elapsed_us >= target_us {
            // Deadline missed: re-anchor on the next upcoming grid point.
            let current_cycle = elapsed_us / period_us;
            self.cycle = (current_cycle + 1) as u64;
            let next_target_us = period_us * (current_cycle + 1);
            std::thread::sleep(std::time::Duration::from_micros(
                (next_target_us - elapsed_us) as u64,
            ));
            true
        } else {
            std::thread::sleep(std::time::Duration::from_micros(
                (target_us - elapsed_us) as u64,
            ));
            false
        }
    }
}
