//! Epoch-tagged points in time.
//!
//! A [`TimePoint`] is a [`Duration`] since a compile-time epoch tag. Points
//! of different epochs do not compare or subtract; crossing epochs requires
//! an explicit [`EpochConverter`]. This catches at compile time the class of
//! bug where a GPS timestamp is subtracted from a spacecraft-elapsed one.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use super::duration::Duration;

/// Marker trait for time epochs.
pub trait Epoch: Copy + 'static {
    /// Short label used in `Debug`/`Display` output.
    const NAME: &'static str;
}

/// Time since the on-board computer started counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpacecraftElapsedTime;

/// Time since the GPS epoch (1980-01-06T00:00:00Z, no leap seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpsTime;

/// Time since the Unix epoch (1970-01-01T00:00:00Z, with leap seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnixTime;

impl Epoch for SpacecraftElapsedTime {
    const NAME: &'static str = "SCET";
}

impl Epoch for GpsTime {
    const NAME: &'static str = "GPS";
}

impl Epoch for UnixTime {
    const NAME: &'static str = "Unix";
}

/// A duration since the epoch `E`.
pub struct TimePoint<E: Epoch> {
    since_epoch: Duration,
    epoch: PhantomData<E>,
}

impl<E: Epoch> TimePoint<E> {
    /// The epoch start itself.
    #[inline]
    pub const fn start_of_epoch() -> Self {
        Self {
            since_epoch: Duration::zero(),
            epoch: PhantomData,
        }
    }

    /// A point at the given offset after the epoch.
    #[inline]
    pub const fn after_epoch(since_epoch: Duration) -> Self {
        Self {
            since_epoch,
            epoch: PhantomData,
        }
    }

    /// The furthest representable point; additions saturate here.
    #[inline]
    pub const fn end_of_time() -> Self {
        Self {
            since_epoch: Duration::myriad(),
            epoch: PhantomData,
        }
    }

    #[inline]
    pub const fn duration_since_epoch(self) -> Duration {
        self.since_epoch
    }
}

// Manual impls: derived Copy/Eq/Ord would demand `E: Clone` etc. even though
// the epoch is phantom.
impl<E: Epoch> Clone for TimePoint<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Epoch> Copy for TimePoint<E> {}

impl<E: Epoch> PartialEq for TimePoint<E> {
    fn eq(&self, other: &Self) -> bool {
        self.since_epoch == other.since_epoch
    }
}

impl<E: Epoch> Eq for TimePoint<E> {}

impl<E: Epoch> PartialOrd for TimePoint<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E: Epoch> Ord for TimePoint<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.since_epoch.cmp(&other.since_epoch)
    }
}

impl<E: Epoch> Default for TimePoint<E> {
    fn default() -> Self {
        Self::start_of_epoch()
    }
}

impl<E: Epoch> fmt::Debug for TimePoint<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimePoint<{}>({})", E::NAME, self.since_epoch)
    }
}

impl<E: Epoch> Add<Duration> for TimePoint<E> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self::after_epoch(self.since_epoch.saturating_add(rhs))
    }
}

impl<E: Epoch> AddAssign<Duration> for TimePoint<E> {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl<E: Epoch> Sub<Duration> for TimePoint<E> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Duration) -> Self {
        Self::after_epoch(self.since_epoch.saturating_sub(rhs))
    }
}

impl<E: Epoch> SubAssign<Duration> for TimePoint<E> {
    #[inline]
    fn sub_assign(&mut self, rhs: Duration) {
        *self = *self - rhs;
    }
}

impl<E: Epoch> Sub for TimePoint<E> {
    type Output = Duration;

    /// Difference between two points of the *same* epoch. Subtraction across
    /// epochs does not type-check.
    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        self.since_epoch.saturating_sub(rhs.since_epoch)
    }
}

/// Explicit conversion between two epochs.
///
/// There is deliberately no blanket conversion: each pair of epochs needs a
/// dedicated converter that knows the correlation between them.
pub trait EpochConverter<From: Epoch, To: Epoch> {
    fn convert(&self, from: TimePoint<From>) -> TimePoint<To>;
}

/// Converter between spacecraft-elapsed and GPS time.
///
/// The correlation offset is established on ground (time packet exchange)
/// and updated whenever the clock correlation is refreshed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScetToGpsConverter {
    /// GPS time at the SCET epoch start.
    pub gps_at_epoch_start: Duration,
}

impl ScetToGpsConverter {
    pub const fn new(gps_at_epoch_start: Duration) -> Self {
        Self { gps_at_epoch_start }
    }
}

impl EpochConverter<SpacecraftElapsedTime, GpsTime> for ScetToGpsConverter {
    fn convert(&self, from: TimePoint<SpacecraftElapsedTime>) -> TimePoint<GpsTime> {
        TimePoint::after_epoch(
            self.gps_at_epoch_start
                .saturating_add(from.duration_since_epoch()),
        )
    }
}

impl EpochConverter<GpsTime, SpacecraftElapsedTime> for ScetToGpsConverter {
    fn convert(&self, from: TimePoint<GpsTime>) -> TimePoint<SpacecraftElapsedTime> {
        TimePoint::after_epoch(
            from.duration_since_epoch()
                .saturating_sub(self.gps_at_epoch_start),
        )
    }
}

/// Fixed converter between the GPS and Unix epochs.
///
/// GPS 0 corresponds to Unix 315964800 s. Leap seconds accumulated since the
/// GPS epoch are applied as a constant; update [`GPS_UTC_LEAP_SECONDS`] when
/// IERS announces a new one.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpsToUnixConverter;

/// Unix seconds at GPS epoch start (1980-01-06).
pub const UNIX_SECONDS_AT_GPS_EPOCH: i64 = 315_964_800;

/// Leap seconds between GPS time and UTC as of 2017-01-01.
pub const GPS_UTC_LEAP_SECONDS: i64 = 18;

impl EpochConverter<GpsTime, UnixTime> for GpsToUnixConverter {
    fn convert(&self, from: TimePoint<GpsTime>) -> TimePoint<UnixTime> {
        TimePoint::after_epoch(
            from.duration_since_epoch()
                .saturating_add(Duration::seconds(UNIX_SECONDS_AT_GPS_EPOCH))
                .saturating_sub(Duration::seconds(GPS_UTC_LEAP_SECONDS)),
        )
    }
}

impl EpochConverter<UnixTime, GpsTime> for GpsToUnixConverter {
    fn convert(&self, from: TimePoint<UnixTime>) -> TimePoint<GpsTime> {
        TimePoint::after_epoch(
            from.duration_since_epoch()
                .saturating_sub(Duration::seconds(UNIX_SECONDS_AT_GPS_EPOCH))
                .saturating_add(Duration::seconds(GPS_UTC_LEAP_SECONDS)),
        )
    }
}
