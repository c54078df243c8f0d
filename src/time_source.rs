//! The polled interface the reconciler reads network time through.
//!
//! Nothing here blocks: [`TimeSource::update`] and [`TimeSource::force_update`] only *ask* for
//! fresh time, and [`TimeSource::is_time_set`] reports whether any has arrived yet.

/// A network time client, polled once per cycle.
///
/// [`SyncedClock`](crate::synced_clock::SyncedClock) is the implementation used on the device.
pub trait TimeSource {
    /// Seconds since 1970-01-01T00:00:00Z, or `0` if the source has never synchronized.
    fn epoch_time(&self) -> u32;

    /// Whether the source has synchronized at least once.
    fn is_time_set(&self) -> bool;

    /// Local hour (offset applied), `0..=23`. Meaningful only when [`Self::is_time_set`].
    fn hours(&self) -> u8;

    /// Local minute, `0..=59`.
    fn minutes(&self) -> u8;

    /// Local second, `0..=59`.
    fn seconds(&self) -> u8;

    /// Refresh if the source's own update interval has elapsed. Returns whether a refresh
    /// was requested.
    fn update(&mut self) -> bool;

    /// Refresh now, bypassing the update interval.
    fn force_update(&mut self) -> bool;

    /// Set the offset applied to [`Self::hours`], [`Self::minutes`], and [`Self::seconds`].
    fn set_time_offset(&mut self, offset_seconds: i32);

    /// The current local time as one sample.
    fn sample(&self) -> TimeSample {
        TimeSample {
            hour: self.hours(),
            minute: self.minutes(),
            second: self.seconds(),
            epoch_seconds: self.epoch_time(),
        }
    }
}

/// Milliseconds from a monotonic clock that starts at boot.
pub trait Monotonic {
    fn now_millis(&self) -> u64;
}

/// One reading of the time source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeSample {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub epoch_seconds: u32,
}
