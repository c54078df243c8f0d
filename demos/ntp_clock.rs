//! NTP clock on a latched 4-digit display.
//!
//! Joins WiFi with the build-time credentials, keeps time from the NTP server stored in flash,
//! and shows `HH MM` with the centre dot blinking once a second. Hold the button for about five
//! seconds to erase the stored settings and restart.

#![no_std]
#![no_main]
#![allow(clippy::future_not_send, reason = "single-threaded")]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use ntp_led_clock::clock_app;
use ntp_led_clock::hardware::Hardware;
use panic_probe as _;

#[embassy_executor::main]
pub async fn main(spawner: Spawner) -> ! {
    info!("Starting NTP clock");
    let err = clock_app::run(Hardware::default(), spawner)
        .await
        .unwrap_err();
    core::panic!("{err}");
}
