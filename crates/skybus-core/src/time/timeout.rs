//! Absolute deadlines.
//!
//! Blocking calls take relative [`Duration`] timeouts at the API surface but
//! track them internally as absolute deadlines, so a wait that is woken and
//! retried does not restart its timeout from scratch.

use super::clock::Clock;
use super::duration::Duration;
use super::time_point::{SpacecraftElapsedTime, TimePoint};

/// An absolute point after which an operation should give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    deadline: TimePoint<SpacecraftElapsedTime>,
}

impl Timeout {
    /// Deadline `relative` from now. A [`Duration::myriad`] timeout
    /// saturates to the end of time and therefore never expires.
    pub fn relative(clock: &dyn Clock, relative: Duration) -> Self {
        Self {
            deadline: clock.now() + relative,
        }
    }

    pub fn absolute(deadline: TimePoint<SpacecraftElapsedTime>) -> Self {
        Self { deadline }
    }

    /// A timeout that never expires.
    pub fn never() -> Self {
        Self {
            deadline: TimePoint::end_of_time(),
        }
    }

    pub fn deadline(&self) -> TimePoint<SpacecraftElapsedTime> {
        self.deadline
    }

    /// True once `clock.now()` has reached the deadline.
    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        clock.now() >= self.deadline
    }

    /// Time left until the deadline; zero once expired.
    pub fn remaining(&self, clock: &dyn Clock) -> Duration {
        let now = clock.now();
        if now >= self.deadline {
            Duration::zero()
        } else {
            self.deadline - now
        }
    }
}
