//! What the four latched digits show, independent of the pins that show it.

/// Decoder code rendered as a blank digit.
pub const BLANK_GLYPH: u8 = 12;
/// Decoder code used while waiting for time and as the reset cursor.
pub const IDLE_GLYPH: u8 = 13;
/// Number of digits on the display.
pub const DIGIT_COUNT: usize = 4;

/// One display frame: four decoder codes (`0..=15`) and the centre dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    pub digits: [u8; DIGIT_COUNT],
    pub dot: bool,
}

impl Frame {
    /// `HH MM`, leading zeros kept.
    ///
    /// ```
    /// use ntp_led_clock::clock_face::Frame;
    ///
    /// assert_eq!(Frame::time(7, 5, true).digits, [0, 7, 0, 5]);
    /// ```
    #[must_use]
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "Splitting two-digit values into decimal digits"
    )]
    pub const fn time(hour: u8, minute: u8, dot: bool) -> Self {
        Self {
            digits: [hour / 10 % 10, hour % 10, minute / 10 % 10, minute % 10],
            dot,
        }
    }

    /// Shown until the first time is accepted.
    #[must_use]
    pub const fn unsynced() -> Self {
        Self {
            digits: [IDLE_GLYPH; DIGIT_COUNT],
            dot: true,
        }
    }

    /// Reset hold progress: the cursor digit lit, the rest blank.
    #[must_use]
    pub fn reset_progress(cursor: u8) -> Self {
        let cursor = usize::from(cursor);
        Self {
            digits: core::array::from_fn(|index| {
                if index == cursor {
                    IDLE_GLYPH
                } else {
                    BLANK_GLYPH
                }
            }),
            dot: false,
        }
    }
}
