//! Signed microsecond durations with saturating arithmetic.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A span of time, stored as a signed 64-bit count of microseconds.
///
/// Arithmetic saturates at the representable limits instead of wrapping.
/// [`Duration::myriad`] is the saturation point and doubles as the
/// "effectively infinite" sentinel: blocking operations given a myriad
/// timeout wait forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration {
    microseconds: i64,
}

impl Duration {
    pub const MICROSECONDS_PER_MILLISECOND: i64 = 1_000;
    pub const MICROSECONDS_PER_SECOND: i64 = 1_000_000;
    pub const SECONDS_PER_MINUTE: i64 = 60;
    pub const MINUTES_PER_HOUR: i64 = 60;

    /// The zero-length duration; blocking operations return immediately.
    #[inline]
    pub const fn zero() -> Self {
        Self { microseconds: 0 }
    }

    /// The largest representable duration, used as the "wait forever"
    /// sentinel. All saturating arithmetic clamps here.
    #[inline]
    pub const fn myriad() -> Self {
        Self { microseconds: i64::MAX }
    }

    #[inline]
    pub const fn microseconds(value: i64) -> Self {
        Self { microseconds: value }
    }

    #[inline]
    pub const fn milliseconds(value: i64) -> Self {
        Self {
            microseconds: value.saturating_mul(Self::MICROSECONDS_PER_MILLISECOND),
        }
    }

    #[inline]
    pub const fn seconds(value: i64) -> Self {
        Self {
            microseconds: value.saturating_mul(Self::MICROSECONDS_PER_SECOND),
        }
    }

    #[inline]
    pub const fn minutes(value: i64) -> Self {
        Self::seconds(value.saturating_mul(Self::SECONDS_PER_MINUTE))
    }

    #[inline]
    pub const fn hours(value: i64) -> Self {
        Self::minutes(value.saturating_mul(Self::MINUTES_PER_HOUR))
    }

    #[inline]
    pub const fn as_microseconds(self) -> i64 {
        self.microseconds
    }

    #[inline]
    pub const fn as_milliseconds(self) -> i64 {
        self.microseconds / Self::MICROSECONDS_PER_MILLISECOND
    }

    #[inline]
    pub const fn as_seconds(self) -> i64 {
        self.microseconds / Self::MICROSECONDS_PER_SECOND
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.microseconds == 0
    }

    /// Whether this duration is the "wait forever" sentinel.
    #[inline]
    pub const fn is_myriad(self) -> bool {
        self.microseconds == i64::MAX
    }

    /// Clamp into `[min, max]`.
    #[inline]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        debug_assert!(min <= max);
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }

    #[inline]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self {
            microseconds: self.microseconds.saturating_add(rhs.microseconds),
        }
    }

    #[inline]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self {
            microseconds: self.microseconds.saturating_sub(rhs.microseconds),
        }
    }

    /// Convert to a `std::time::Duration` for the hosted backend.
    ///
    /// Negative durations clamp to zero; the myriad sentinel maps to the
    /// largest `std` duration.
    pub fn to_std(self) -> std::time::Duration {
        if self.microseconds <= 0 {
            std::time::Duration::ZERO
        } else {
            std::time::Duration::from_micros(self.microseconds as u64)
        }
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Duration {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl SubAssign for Duration {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = self.saturating_sub(rhs);
    }
}

impl Mul<i64> for Duration {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: i64) -> Self {
        Self {
            microseconds: self.microseconds.saturating_mul(rhs),
        }
    }
}

impl Div<i64> for Duration {
    type Output = Self;

    #[inline]
    fn div(self, rhs: i64) -> Self {
        Self {
            microseconds: self.microseconds / rhs,
        }
    }
}

impl Neg for Duration {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            microseconds: self.microseconds.saturating_neg(),
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_myriad() {
            write!(f, "myriad")
        } else {
            write!(f, "{} us", self.microseconds)
        }
    }
}
