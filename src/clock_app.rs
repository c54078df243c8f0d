//! The clock's main loop: one cooperative pass every [`TICK`].
//!
//! Each pass drains NTP events into the [`SyncedClock`], lets the [`Reconciler`] poll (at most
//! once per [`PollGate`] interval) and check the sample, forwards any sync request to the NTP
//! task, samples the reset button, and latches the resulting [`Frame`].

#![allow(clippy::future_not_send, reason = "single-threaded")]

use core::convert::Infallible;

use cortex_m::peripheral::SCB;
use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Ticker, Timer};

use crate::Result;
use crate::clock_face::Frame;
use crate::dst::DstRegion;
use crate::hardware::Hardware;
use crate::hold_reset::{ButtonEvent, HoldToReset};
use crate::poll_gate::PollGate;
use crate::reconcile::{Reconciler, ReconcilerState};
use crate::settings_store::SettingsStore;
use crate::synced_clock::SyncedClock;
use crate::time_source::Monotonic;
use crate::time_sync::{TimeSync, TimeSyncEvent, TimeSyncStatic};
use crate::wifi::{Wifi, WifiStatic};

/// Main loop period.
pub const TICK: Duration = Duration::from_millis(100);

/// [`Monotonic`] backed by the embassy time driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyMonotonic;

impl Monotonic for EmbassyMonotonic {
    fn now_millis(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Run the clock forever. Only returns on a hardware or spawn error.
///
/// # Errors
///
/// Flash, display, or task-spawn failures.
pub async fn run(hardware: Hardware, spawner: Spawner) -> Result<Infallible> {
    let Hardware {
        mut display,
        button,
        flash,
        wifi: wifi_peripherals,
    } = hardware;

    display.write(Frame::unsynced())?;

    let mut store = SettingsStore::new(flash);
    let settings = store.load_or_init()?;

    static WIFI_STATIC: WifiStatic = Wifi::new_static();
    let wifi = Wifi::new(&WIFI_STATIC, wifi_peripherals, spawner)?;

    static TIME_SYNC_STATIC: TimeSyncStatic = TimeSync::new_static();
    let time_sync = TimeSync::new(&TIME_SYNC_STATIC, wifi, &settings, spawner)?;

    let region = DstRegion::configured();
    info!(
        "Clock starting: UTC{=i8}, DST {} ({:?}), server {=str}",
        settings.timezone_offset_hours(),
        settings.daylight_saving(),
        region,
        settings.ntp_server()
    );

    let mut clock = SyncedClock::new(EmbassyMonotonic);
    let mut reconciler = Reconciler::new(region);
    let mut gate = PollGate::default();
    let mut hold = HoldToReset::new();
    let mut dot_on = true;
    let mut ticker = Ticker::every(TICK);

    loop {
        while let Some(event) = time_sync.try_event() {
            match event {
                TimeSyncEvent::NetworkReady => {
                    info!("Time source reachable");
                    reconciler.mark_reachable();
                }
                TimeSyncEvent::Success { unix_seconds } => {
                    clock.apply_sync(unix_seconds);
                    reconciler.resync_completed();
                }
                TimeSyncEvent::Failed(message) => {
                    // The next update retries; the interval counts from the last success.
                    warn!("Time sync failed: {}", message);
                }
            }
        }

        let gate_open = gate.try_open(EmbassyMonotonic.now_millis());
        reconciler.step(&mut clock, &settings, gate_open);
        if clock.take_request() {
            time_sync.request();
        }
        if let Some(odd_second) = reconciler.second_edge() {
            dot_on = odd_second;
        }

        let frame = match hold.sample(button.is_low()) {
            ButtonEvent::ResetRequested => {
                warn!("Reset requested, clearing settings");
                store.clear()?;
                Timer::after(TICK).await;
                SCB::sys_reset();
            }
            ButtonEvent::Pressed => Frame::reset_progress(0),
            ButtonEvent::Holding { cursor } => Frame::reset_progress(cursor),
            ButtonEvent::Idle | ButtonEvent::Released => match reconciler.state() {
                ReconcilerState::Tracking => {
                    let shown = reconciler.displayed();
                    Frame::time(shown.hour, shown.minute, dot_on)
                }
                ReconcilerState::AwaitingFirstSample => Frame::unsynced(),
            },
        };
        display.write(frame)?;

        ticker.next().await;
    }
}
