use std::time::{SystemTime, UNIX_EPOCH};

/// Review platform epoch: Sunday, January 1, 2023 00:00:00 UTC, in
/// milliseconds since the Unix epoch.
///
/// The 41-bit timestamp field counts milliseconds from here, which leaves
/// roughly 69 years of headroom.
pub const REVIEW_EPOCH: i64 = 1_672_531_200_000;

/// A trait for time sources that return a wall-clock timestamp.
///
/// This abstraction allows you to plug in the system clock or a mocked time
/// source in tests. The unit is **milliseconds since the Unix epoch**; the
/// generator subtracts [`REVIEW_EPOCH`] itself.
///
/// # Example
///
/// ```
/// use review_id::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> i64 {
///         1_700_000_000_000
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1_700_000_000_000);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> i64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> i64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_millis(&self) -> i64 {
        (**self).current_millis()
    }
}

/// The process wall clock.
///
/// Reads [`SystemTime`] on every call, so it follows NTP steps and manual
/// adjustments, including backward ones. The generator tolerates that by
/// clamping to the last timestamp it issued.
#[derive(Clone, Copy, Debug, Default)]
pub struct WallClock;

impl TimeSource for WallClock {
    fn current_millis(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
            // A clock set before 1970 is treated as the Unix epoch; the
            // generator clamps to its last timestamp anyway.
            Err(_) => 0,
        }
    }
}
