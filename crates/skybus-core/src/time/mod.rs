//! Time model: durations, epoch-tagged time points, clocks and deadlines.
//!
//! Everything above this module measures time through these types. The
//! production clock reads the host's monotonic counter; tests swap in the
//! [`TestingClock`] and move time by hand.

mod clock;
mod duration;
mod time_point;
mod timeout;

pub use clock::{Clock, SystemClock, TestingClock};
pub use duration::Duration;
pub use time_point::{
    Epoch, EpochConverter, GpsTime, GpsToUnixConverter, ScetToGpsConverter,
    SpacecraftElapsedTime, TimePoint, UnixTime, GPS_UTC_LEAP_SECONDS,
    UNIX_SECONDS_AT_GPS_EPOCH,
};
pub use timeout::Timeout;
