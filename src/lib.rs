//! Firmware library for an NTP-synchronised 4-digit clock on the Raspberry Pi Pico W.
//!
//! The calendar, DST, and reconciliation logic is plain `no_std` code with no hardware types,
//! so it builds and tests on the host (`--no-default-features --features host`). The device
//! modules sit behind the `pico1`/`pico2`, `arm`, and `wifi` features.
#![cfg_attr(not(test), no_std)]

pub mod calendar;
pub mod clock_face;
pub mod dst;
mod error;
pub mod hold_reset;
pub mod poll_gate;
pub mod reconcile;
pub mod settings;
pub mod settings_record;
pub mod synced_clock;
pub mod time_source;
pub mod unix_seconds;

#[cfg(any(feature = "pico1", feature = "pico2"))]
pub mod hardware;
#[cfg(any(feature = "pico1", feature = "pico2"))]
pub mod latched_display;
#[cfg(any(feature = "pico1", feature = "pico2"))]
mod output_array;
#[cfg(any(feature = "pico1", feature = "pico2"))]
pub mod settings_store;

#[cfg(all(feature = "wifi", any(feature = "pico1", feature = "pico2")))]
pub mod time_sync;
#[cfg(all(feature = "wifi", any(feature = "pico1", feature = "pico2")))]
pub mod wifi;

#[cfg(all(feature = "wifi", feature = "arm", any(feature = "pico1", feature = "pico2")))]
pub mod clock_app;

// Re-export commonly used items
pub use error::{Error, Result};
pub use unix_seconds::UnixSeconds;
