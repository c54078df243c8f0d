//! A [`TimeSource`] that extrapolates the last NTP result with a monotonic clock.
//!
//! The clock never talks to the network itself. [`update`](TimeSource::update) and
//! [`force_update`](TimeSource::force_update) raise a pending request, the main loop hands it
//! to the NTP task with [`SyncedClock::take_request`], and the answer comes back through
//! [`SyncedClock::apply_sync`]. Until the first answer, [`TimeSource::epoch_time`] is `0`.

use crate::calendar::SECONDS_PER_DAY;
use crate::time_source::{Monotonic, TimeSource};
use crate::unix_seconds::UnixSeconds;

/// How long after the last successful sync a cache-respecting [`TimeSource::update`] asks for
/// NTP time again (10 minutes). A failed fetch does not restart this interval.
pub const DEFAULT_UPDATE_INTERVAL_MILLIS: u64 = 10 * 60 * 1000;

#[derive(Debug, Clone, Copy)]
struct SyncPoint {
    unix_seconds: UnixSeconds,
    at_millis: u64,
}

/// NTP-backed time source. See the [module documentation](self).
pub struct SyncedClock<M: Monotonic> {
    monotonic: M,
    last_sync: Option<SyncPoint>,
    update_interval_millis: u64,
    offset_seconds: i32,
    pending_request: bool,
}

impl<M: Monotonic> SyncedClock<M> {
    /// Create an unsynchronized clock with a zero offset and the default update interval.
    #[must_use]
    pub const fn new(monotonic: M) -> Self {
        Self {
            monotonic,
            last_sync: None,
            update_interval_millis: DEFAULT_UPDATE_INTERVAL_MILLIS,
            offset_seconds: 0,
            pending_request: false,
        }
    }

    /// Change how often [`TimeSource::update`] requests NTP time.
    #[must_use]
    pub const fn with_update_interval_millis(mut self, update_interval_millis: u64) -> Self {
        self.update_interval_millis = update_interval_millis;
        self
    }

    /// Take the pending sync request, if any. At most one request is outstanding.
    pub const fn take_request(&mut self) -> bool {
        core::mem::replace(&mut self.pending_request, false)
    }

    /// Record a successful NTP result as of now.
    pub fn apply_sync(&mut self, unix_seconds: UnixSeconds) {
        let at_millis = self.monotonic.now_millis();
        #[cfg(feature = "defmt")]
        defmt::info!(
            "SyncedClock: synced to {} at {} ms",
            unix_seconds.as_i64(),
            at_millis
        );
        self.last_sync = Some(SyncPoint {
            unix_seconds,
            at_millis,
        });
    }

    const fn request(&mut self) -> bool {
        self.pending_request = true;
        true
    }

    #[expect(
        clippy::arithmetic_side_effects,
        clippy::integer_division_remainder_used,
        reason = "Elapsed time is saturating and divided by a non-zero constant"
    )]
    fn current_unix_seconds(&self) -> Option<i64> {
        let sync = self.last_sync?;
        let elapsed_millis = self.monotonic.now_millis().saturating_sub(sync.at_millis);
        let elapsed_seconds = i64::try_from(elapsed_millis / 1000).unwrap_or(i64::MAX);
        Some(sync.unix_seconds.as_i64().saturating_add(elapsed_seconds))
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "rem_euclid keeps the value in 0..86400"
    )]
    fn local_seconds_of_day(&self) -> u32 {
        let local = self
            .current_unix_seconds()
            .unwrap_or(0)
            .saturating_add(i64::from(self.offset_seconds));
        local.rem_euclid(i64::from(SECONDS_PER_DAY)) as u32
    }
}

impl<M: Monotonic> TimeSource for SyncedClock<M> {
    fn epoch_time(&self) -> u32 {
        self.current_unix_seconds()
            .map_or(0, |unix| UnixSeconds(unix).as_epoch_u32())
    }

    fn is_time_set(&self) -> bool {
        self.last_sync.is_some()
    }

    #[expect(
        clippy::integer_division_remainder_used,
        clippy::cast_possible_truncation,
        reason = "Seconds of day divided by 3600 is below 24"
    )]
    fn hours(&self) -> u8 {
        (self.local_seconds_of_day() / 3600) as u8
    }

    #[expect(
        clippy::integer_division_remainder_used,
        clippy::cast_possible_truncation,
        reason = "Result is below 60"
    )]
    fn minutes(&self) -> u8 {
        (self.local_seconds_of_day() % 3600 / 60) as u8
    }

    #[expect(
        clippy::integer_division_remainder_used,
        clippy::cast_possible_truncation,
        reason = "Result is below 60"
    )]
    fn seconds(&self) -> u8 {
        (self.local_seconds_of_day() % 60) as u8
    }

    fn update(&mut self) -> bool {
        let due = self.last_sync.is_none_or(|sync| {
            self.monotonic.now_millis().saturating_sub(sync.at_millis)
                >= self.update_interval_millis
        });
        due && self.request()
    }

    fn force_update(&mut self) -> bool {
        self.request()
    }

    fn set_time_offset(&mut self, offset_seconds: i32) {
        self.offset_seconds = offset_seconds;
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::{SyncedClock, DEFAULT_UPDATE_INTERVAL_MILLIS};
    use crate::time_source::{Monotonic, TimeSource};
    use crate::unix_seconds::UnixSeconds;

    struct FakeMonotonic<'a>(&'a Cell<u64>);

    impl Monotonic for FakeMonotonic<'_> {
        fn now_millis(&self) -> u64 {
            self.0.get()
        }
    }

    #[test]
    fn unsynced_clock_reports_zero() {
        let now = Cell::new(5_000);
        let clock = SyncedClock::new(FakeMonotonic(&now));
        assert_eq!(clock.epoch_time(), 0);
        assert!(!clock.is_time_set());
    }

    #[test]
    fn extrapolates_and_applies_offset() {
        let now = Cell::new(1_000);
        let mut clock = SyncedClock::new(FakeMonotonic(&now));
        // 2023-11-14 22:13:20 UTC
        clock.apply_sync(UnixSeconds(1_700_000_000));
        clock.set_time_offset(2 * 3600);
        now.set(1_000 + 61_500);
        assert_eq!(clock.epoch_time(), 1_700_000_061);
        assert_eq!((clock.hours(), clock.minutes(), clock.seconds()), (0, 14, 21));
    }

    #[test]
    fn negative_offset_wraps_to_previous_day() {
        let now = Cell::new(0);
        let mut clock = SyncedClock::new(FakeMonotonic(&now));
        // 1970-01-02 00:30:00 UTC
        clock.apply_sync(UnixSeconds(86_400 + 1_800));
        clock.set_time_offset(-3600);
        assert_eq!((clock.hours(), clock.minutes()), (23, 30));
    }

    #[test]
    fn update_respects_interval_but_force_does_not() {
        let now = Cell::new(0);
        let mut clock = SyncedClock::new(FakeMonotonic(&now));
        assert!(clock.update());
        assert!(clock.take_request());
        assert!(!clock.take_request());

        clock.apply_sync(UnixSeconds(1_700_000_000));
        now.set(1_000);
        assert!(!clock.update());
        assert!(!clock.take_request());

        assert!(clock.force_update());
        assert!(clock.take_request());

        now.set(1_000 + DEFAULT_UPDATE_INTERVAL_MILLIS);
        assert!(clock.update());
        assert!(clock.take_request());
    }

    #[test]
    fn keeps_requesting_until_first_sync() {
        let now = Cell::new(0);
        let mut clock = SyncedClock::new(FakeMonotonic(&now)).with_update_interval_millis(60_000);
        assert!(clock.take_request());
        // No answer came back.
        now.set(1_000);
        assert!(clock.update());
        assert!(clock.take_request());
    }

    #[test]
    fn failed_routine_sync_is_retried_on_the_next_update() {
        let now = Cell::new(0);
        let mut clock = SyncedClock::new(FakeMonotonic(&now));
        clock.apply_sync(UnixSeconds(1_700_000_000));

        now.set(DEFAULT_UPDATE_INTERVAL_MILLIS);
        assert!(clock.update());
        assert!(clock.take_request());

        // The fetch failed, so the interval still counts from the sync at t=0.
        now.set(DEFAULT_UPDATE_INTERVAL_MILLIS + 1_000);
        assert!(clock.update());
        assert!(clock.take_request());

        clock.apply_sync(UnixSeconds(1_700_000_601));
        now.set(DEFAULT_UPDATE_INTERVAL_MILLIS + 2_000);
        assert!(!clock.update());
        assert!(!clock.take_request());
    }
}
