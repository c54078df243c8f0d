//! Hold-to-reset button, sampled once per main-loop tick.
//!
//! Holding the button walks a cursor across the four digits; after more than
//! [`RESET_HOLD_TICKS`] ticks held (about five seconds at 100 ms per tick) a single
//! [`ButtonEvent::ResetRequested`] is emitted. Nothing here waits, so the time display keeps
//! being serviced while the button is down.

/// Consecutive samples a new level must be seen for before it counts.
pub const DEBOUNCE_SAMPLES: u8 = 2;
/// Held ticks per cursor step.
pub const CURSOR_STEP_TICKS: u16 = 8;
/// Held ticks that must be exceeded to request a reset.
pub const RESET_HOLD_TICKS: u16 = 50;
const DIGIT_COUNT: u16 = 4;

/// What the button did during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// Not pressed.
    Idle,
    /// The debounced level just went down.
    Pressed,
    /// Still down; `cursor` is the digit to highlight (`0..4`).
    Holding { cursor: u8 },
    /// The debounced level just went up.
    Released,
    /// Held long enough. Emitted once per hold.
    ResetRequested,
}

/// Debounced, non-blocking long-press detector.
#[derive(Debug, Clone, Default)]
pub struct HoldToReset {
    stable_down: bool,
    pending_count: u8,
    held_ticks: u16,
    reset_sent: bool,
}

impl HoldToReset {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stable_down: false,
            pending_count: 0,
            held_ticks: 0,
            reset_sent: false,
        }
    }

    /// Feed one raw sample (`true` = pressed) and get this tick's event.
    pub fn sample(&mut self, raw_down: bool) -> ButtonEvent {
        if raw_down == self.stable_down {
            self.pending_count = 0;
        } else {
            self.pending_count = self.pending_count.saturating_add(1);
            if self.pending_count >= DEBOUNCE_SAMPLES {
                self.pending_count = 0;
                self.stable_down = raw_down;
                self.held_ticks = 0;
                self.reset_sent = false;
                return if raw_down {
                    ButtonEvent::Pressed
                } else {
                    ButtonEvent::Released
                };
            }
        }

        if !self.stable_down {
            return ButtonEvent::Idle;
        }

        self.held_ticks = self.held_ticks.saturating_add(1);
        if self.held_ticks > RESET_HOLD_TICKS && !self.reset_sent {
            self.reset_sent = true;
            #[cfg(feature = "defmt")]
            defmt::info!("HoldToReset: held for {} ticks, reset requested", self.held_ticks);
            return ButtonEvent::ResetRequested;
        }
        ButtonEvent::Holding {
            cursor: cursor_for(self.held_ticks),
        }
    }
}

#[expect(
    clippy::integer_division_remainder_used,
    clippy::cast_possible_truncation,
    reason = "Divisors are non-zero constants and the result is below 4"
)]
const fn cursor_for(held_ticks: u16) -> u8 {
    (held_ticks / CURSOR_STEP_TICKS % DIGIT_COUNT) as u8
}
