//! Filters noisy network time before it reaches the display.
//!
//! NTP clients sometimes report "time is set" while handing back all-zero or stale fields. The
//! [`Reconciler`] only moves the displayed time forward by at most one hour and one minute per
//! sample (allowing for rollover at midnight and at the top of the hour). Anything else is
//! treated as suspect: the displayed time is kept and a hard resynchronization is requested on
//! the next polling cycle.
//!
//! The work is split in two so it can run at two cadences, like the firmware loop does:
//!
//! - [`Reconciler::poll`] talks to the [`TimeSource`] and runs once per [`PollGate`] opening;
//! - [`Reconciler::reconcile`] runs the continuity check on every loop iteration.
//!
//! [`Reconciler::step`] does both.
//!
//! [`PollGate`]: crate::poll_gate::PollGate
//!
//! # Example
//!
//! ```
//! use ntp_led_clock::dst::DstRegion;
//! use ntp_led_clock::reconcile::{Reconciler, Verdict};
//! use ntp_led_clock::settings::ClockSettings;
//! use ntp_led_clock::time_source::TimeSource;
//!
//! # struct Fixed(u8, u8, u8);
//! # impl TimeSource for Fixed {
//! #     fn epoch_time(&self) -> u32 { 1_700_000_000 }
//! #     fn is_time_set(&self) -> bool { true }
//! #     fn hours(&self) -> u8 { self.0 }
//! #     fn minutes(&self) -> u8 { self.1 }
//! #     fn seconds(&self) -> u8 { self.2 }
//! #     fn update(&mut self) -> bool { false }
//! #     fn force_update(&mut self) -> bool { true }
//! #     fn set_time_offset(&mut self, _offset_seconds: i32) {}
//! # }
//! let settings = ClockSettings::new(1, false, "pool.ntp.org")?;
//! let mut reconciler = Reconciler::new(DstRegion::Europe);
//! let mut source = Fixed(10, 59, 30);
//!
//! reconciler.mark_reachable();
//! assert_eq!(reconciler.step(&mut source, &settings, true), Verdict::Accepted);
//! assert_eq!(reconciler.displayed().hour, 10);
//!
//! // A jump backwards is refused and a hard resync is queued.
//! source = Fixed(9, 30, 0);
//! assert_eq!(reconciler.step(&mut source, &settings, true), Verdict::Rejected);
//! assert_eq!(reconciler.displayed().hour, 10);
//! assert!(reconciler.flags().force_update);
//! # Ok::<(), ntp_led_clock::Error>(())
//! ```

use crate::calendar::SECONDS_PER_HOUR;
use crate::dst::{dst_offset_hours, DstRegion};
use crate::settings::ClockSettings;
use crate::time_source::{TimeSample, TimeSource};

/// The time currently shown, owned by the [`Reconciler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayedTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Control flags of the reconciliation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReconciliationFlags {
    /// Latches once the time source is reachable; polling waits for it.
    pub can_update: bool,
    /// Accept the next candidate unconditionally.
    pub first_start: bool,
    /// Bypass the source's cache on the next poll.
    pub force_update: bool,
}

impl Default for ReconciliationFlags {
    fn default() -> Self {
        Self {
            can_update: false,
            first_start: true,
            force_update: false,
        }
    }
}

/// Outcome of one continuity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    /// The candidate replaced the displayed time.
    Accepted,
    /// The candidate jumped too far; a forced resync is queued.
    Rejected,
    /// No time available yet; nothing changed.
    Idle,
}

/// The two logical states of the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReconcilerState {
    AwaitingFirstSample,
    Tracking,
}

/// What one [`Reconciler::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollReport {
    /// A forced (cache-bypassing) resync was requested.
    pub forced: bool,
    /// DST result, when daylight saving is enabled.
    pub dst_active: Option<bool>,
    /// The offset applied to the source changed.
    pub offset_changed: bool,
    /// A candidate sample was read.
    pub sampled: bool,
}

/// The time reconciliation state machine. See the [module documentation](self).
#[derive(Debug, Clone)]
pub struct Reconciler {
    region: DstRegion,
    displayed: DisplayedTime,
    last_second: u8,
    candidate: Option<TimeSample>,
    flags: ReconciliationFlags,
    applied_offset_hours: Option<i32>,
    forced_sync_outstanding: bool,
}

impl Reconciler {
    /// A reconciler in [`ReconcilerState::AwaitingFirstSample`] showing `00:00:00`.
    #[must_use]
    pub fn new(region: DstRegion) -> Self {
        Self {
            region,
            displayed: DisplayedTime::default(),
            last_second: 0,
            candidate: None,
            flags: ReconciliationFlags::default(),
            applied_offset_hours: None,
            forced_sync_outstanding: false,
        }
    }

    #[must_use]
    pub const fn displayed(&self) -> DisplayedTime {
        self.displayed
    }

    #[must_use]
    pub const fn flags(&self) -> ReconciliationFlags {
        self.flags
    }

    /// The UTC offset (in hours, DST included) last pushed into the source.
    #[must_use]
    pub const fn applied_offset_hours(&self) -> Option<i32> {
        self.applied_offset_hours
    }

    #[must_use]
    pub const fn state(&self) -> ReconcilerState {
        if self.flags.first_start {
            ReconcilerState::AwaitingFirstSample
        } else {
            ReconcilerState::Tracking
        }
    }

    /// Record that the time source became reachable. Stays set.
    pub const fn mark_reachable(&mut self) {
        self.flags.can_update = true;
    }

    /// Tell the reconciler a fresh synchronization arrived from the network.
    ///
    /// If it answers a forced resync, the next candidate is trusted unconditionally: the source
    /// has just been corrected, so a large jump now reflects the network, not a stale read.
    pub fn resync_completed(&mut self) {
        if core::mem::replace(&mut self.forced_sync_outstanding, false) {
            #[cfg(feature = "defmt")]
            defmt::info!("Reconciler: forced resync completed, trusting next sample");
            self.flags.first_start = true;
        }
    }

    /// One polling cycle against `source`. Call when the poll gate opens.
    pub fn poll<S: TimeSource>(&mut self, source: &mut S, settings: &ClockSettings) -> PollReport {
        let mut report = PollReport::default();

        if source.epoch_time() == 0 {
            self.flags.force_update = true;
        }

        if self.flags.force_update {
            source.force_update();
            self.flags.force_update = false;
            self.forced_sync_outstanding = true;
            report.forced = true;
        } else {
            source.update();
        }

        let base_offset_hours = settings.base_offset_hours();
        let offset_hours = if settings.daylight_saving() {
            let dst_hours = dst_offset_hours(source.epoch_time(), self.region, base_offset_hours);
            report.dst_active = Some(dst_hours != 0);
            let offset_hours = base_offset_hours.saturating_add(dst_hours);
            source.set_time_offset(offset_hours.saturating_mul(SECONDS_PER_HOUR));
            source.update();
            offset_hours
        } else {
            if self.applied_offset_hours != Some(base_offset_hours) {
                source.set_time_offset(base_offset_hours.saturating_mul(SECONDS_PER_HOUR));
            }
            base_offset_hours
        };

        if self.applied_offset_hours.replace(offset_hours) != Some(offset_hours) {
            report.offset_changed = true;
            // The displayed hour is about to jump by the offset change.
            self.flags.first_start = true;
            #[cfg(feature = "defmt")]
            defmt::info!("Reconciler: applied UTC offset is now {} h", offset_hours);
        }

        if source.is_time_set() {
            self.candidate = Some(source.sample());
            report.sampled = true;
        }

        report
    }

    /// The continuity check. Runs every loop iteration whether or not `poll` ran.
    pub fn reconcile(&mut self, time_is_set: bool) -> Verdict {
        let Some(candidate) = self.candidate.filter(|_| time_is_set) else {
            return Verdict::Idle;
        };

        if self.flags.first_start || self.is_continuous(candidate) {
            self.displayed = DisplayedTime {
                hour: candidate.hour,
                minute: candidate.minute,
                second: candidate.second,
            };
            self.flags.first_start = false;
            self.flags.force_update = false;
            Verdict::Accepted
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Reconciler: rejected {:02}:{:02} while showing {:02}:{:02}, forcing resync",
                candidate.hour,
                candidate.minute,
                self.displayed.hour,
                self.displayed.minute
            );
            self.flags.force_update = true;
            Verdict::Rejected
        }
    }

    /// Poll when `gate_open` (and the source is reachable), then run the continuity check.
    pub fn step<S: TimeSource>(
        &mut self,
        source: &mut S,
        settings: &ClockSettings,
        gate_open: bool,
    ) -> Verdict {
        if gate_open && self.flags.can_update {
            self.poll(source, settings);
        }
        self.reconcile(source.is_time_set())
    }

    /// `Some(dot_on)` once each time the displayed second changes; `dot_on` is true on odd
    /// seconds.
    pub const fn second_edge(&mut self) -> Option<bool> {
        if self.displayed.second == self.last_second {
            return None;
        }
        self.last_second = self.displayed.second;
        Some(self.displayed.second & 1 == 1)
    }

    #[expect(
        clippy::arithmetic_side_effects,
        reason = "u8 fields widened to i16 cannot overflow"
    )]
    fn is_continuous(&self, candidate: TimeSample) -> bool {
        let hour_step = i16::from(candidate.hour) - i16::from(self.displayed.hour);
        let minute_step = i16::from(candidate.minute) - i16::from(self.displayed.minute);
        matches!(hour_step, 1 | 0 | -23) && matches!(minute_step, 1 | 0 | -59)
    }
}

#[cfg(test)]
mod tests {
    use super::{ReconcilerState, Reconciler, Verdict};
    use crate::dst::DstRegion;
    use crate::settings::ClockSettings;
    use crate::time_source::TimeSource;

    #[derive(Default)]
    struct ScriptedSource {
        epoch: u32,
        set: bool,
        hms: (u8, u8, u8),
        offset_seconds: i32,
        updates: u32,
        forced: u32,
    }

    impl TimeSource for ScriptedSource {
        fn epoch_time(&self) -> u32 {
            self.epoch
        }
        fn is_time_set(&self) -> bool {
            self.set
        }
        fn hours(&self) -> u8 {
            self.hms.0
        }
        fn minutes(&self) -> u8 {
            self.hms.1
        }
        fn seconds(&self) -> u8 {
            self.hms.2
        }
        fn update(&mut self) -> bool {
            self.updates += 1;
            false
        }
        fn force_update(&mut self) -> bool {
            self.forced += 1;
            true
        }
        fn set_time_offset(&mut self, offset_seconds: i32) {
            self.offset_seconds = offset_seconds;
        }
    }

    fn synced(hms: (u8, u8, u8)) -> ScriptedSource {
        ScriptedSource {
            epoch: 1_700_000_000,
            set: true,
            hms,
            ..ScriptedSource::default()
        }
    }

    fn no_dst() -> ClockSettings {
        ClockSettings::new(0, false, "pool.ntp.org").unwrap()
    }

    fn tracking_at(hms: (u8, u8, u8)) -> Reconciler {
        let mut reconciler = Reconciler::new(DstRegion::Europe);
        reconciler.mark_reachable();
        let mut source = synced(hms);
        assert_eq!(reconciler.step(&mut source, &no_dst(), true), Verdict::Accepted);
        reconciler
    }

    #[test]
    fn first_sample_is_accepted_unconditionally() {
        let reconciler = tracking_at((17, 42, 7));
        assert_eq!(reconciler.displayed().hour, 17);
        assert_eq!(reconciler.state(), ReconcilerState::Tracking);
        assert!(!reconciler.flags().first_start);
    }

    #[test]
    fn rollovers_are_continuous() {
        let mut reconciler = tracking_at((10, 59, 59));
        let mut source = synced((11, 0, 0));
        assert_eq!(reconciler.step(&mut source, &no_dst(), true), Verdict::Accepted);

        let mut reconciler = tracking_at((23, 59, 59));
        let mut source = synced((0, 0, 0));
        assert_eq!(reconciler.step(&mut source, &no_dst(), true), Verdict::Accepted);
        assert_eq!(reconciler.displayed().hour, 0);
    }

    #[test]
    fn minute_reset_within_same_hour_passes_the_table() {
        // 0 - 59 = -59 is an allowed minute step, and the hour did not change.
        let mut reconciler = tracking_at((10, 59, 0));
        let mut source = synced((10, 0, 0));
        assert_eq!(reconciler.step(&mut source, &no_dst(), true), Verdict::Accepted);
    }

    #[test]
    fn backwards_jump_is_rejected_and_forces_resync() {
        let mut reconciler = tracking_at((10, 59, 0));
        let mut source = synced((9, 30, 0));
        assert_eq!(reconciler.step(&mut source, &no_dst(), true), Verdict::Rejected);
        assert_eq!(reconciler.displayed().hour, 10);
        assert_eq!(reconciler.displayed().minute, 59);
        assert!(reconciler.flags().force_update);

        // The next gated poll bypasses the cache and clears the flag.
        reconciler.step(&mut source, &no_dst(), true);
        assert_eq!(source.forced, 1);
    }

    #[test]
    fn unset_time_touches_nothing() {
        let mut reconciler = Reconciler::new(DstRegion::Europe);
        reconciler.mark_reachable();
        let mut source = ScriptedSource {
            epoch: 1_700_000_000,
            ..ScriptedSource::default()
        };
        assert_eq!(reconciler.step(&mut source, &no_dst(), true), Verdict::Idle);
        assert_eq!(reconciler.state(), ReconcilerState::AwaitingFirstSample);
        assert!(!reconciler.flags().force_update);
    }

    #[test]
    fn no_polling_before_reachable() {
        let mut reconciler = Reconciler::new(DstRegion::Europe);
        let mut source = synced((1, 2, 3));
        assert_eq!(reconciler.step(&mut source, &no_dst(), true), Verdict::Idle);
        assert_eq!(source.updates, 0);
    }

    #[test]
    fn second_edge_fires_once_per_change() {
        let mut reconciler = tracking_at((8, 0, 5));
        assert_eq!(reconciler.second_edge(), Some(true));
        assert_eq!(reconciler.second_edge(), None);
        let mut source = synced((8, 0, 6));
        reconciler.step(&mut source, &no_dst(), true);
        assert_eq!(reconciler.second_edge(), Some(false));
    }

    #[test]
    fn dst_sets_offset_and_reupdates() {
        let mut reconciler = Reconciler::new(DstRegion::Europe);
        reconciler.mark_reachable();
        // 2023-06-15 12:00 UTC
        let mut source = ScriptedSource {
            epoch: 1_686_830_400,
            set: true,
            hms: (14, 0, 0),
            ..ScriptedSource::default()
        };
        let settings = ClockSettings::new(1, true, "pool.ntp.org").unwrap();
        let report = reconciler.poll(&mut source, &settings);
        assert_eq!(report.dst_active, Some(true));
        assert_eq!(source.offset_seconds, 2 * 3600);
        assert_eq!(source.updates, 2);
        assert_eq!(reconciler.applied_offset_hours(), Some(2));
    }

    #[test]
    fn forced_resync_completion_rearms_first_start() {
        let mut reconciler = tracking_at((10, 0, 0));
        let mut source = synced((12, 0, 0));
        assert_eq!(reconciler.step(&mut source, &no_dst(), true), Verdict::Rejected);
        assert_eq!(reconciler.step(&mut source, &no_dst(), true), Verdict::Rejected);
        reconciler.resync_completed();
        assert_eq!(reconciler.step(&mut source, &no_dst(), false), Verdict::Accepted);
        assert_eq!(reconciler.displayed().hour, 12);
    }

    #[test]
    fn routine_sync_does_not_rearm() {
        let mut reconciler = tracking_at((10, 0, 0));
        reconciler.resync_completed();
        assert!(!reconciler.flags().first_start);
    }
}
