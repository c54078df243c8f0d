//! Driver for a 4-digit display built from latched BCD decoder digits (HP 5082-7300 style).
//!
//! Every digit shares one 4-bit data bus. A digit copies the bus while its (active-low) enable
//! line is low and holds that value once the line goes high, so nothing needs refreshing. The
//! centre dot is latched together with digit 1 from its own active-low line.

use embassy_rp::gpio::{self, Level};

use crate::Result;
use crate::clock_face::{DIGIT_COUNT, Frame};
use crate::output_array::OutputArray;

/// Width of the BCD data bus.
pub const DATA_BIT_COUNT: usize = 4;
/// The digit whose latch also holds the dot.
const DOT_DIGIT: usize = 1;

/// A latched 4-digit display. Writes only the digits that changed.
pub struct LatchedDisplay<'a> {
    data: OutputArray<'a, DATA_BIT_COUNT>,
    enables: OutputArray<'a, DIGIT_COUNT>,
    dot: gpio::Output<'a>,
    shown: Option<Frame>,
}

impl<'a> LatchedDisplay<'a> {
    /// Take ownership of the bus, the enables (digit 0 first), and the dot line, and deselect
    /// every digit.
    #[must_use]
    pub fn new(
        data: OutputArray<'a, DATA_BIT_COUNT>,
        mut enables: OutputArray<'a, DIGIT_COUNT>,
        dot: gpio::Output<'a>,
    ) -> Self {
        enables.set_all(Level::High);
        Self {
            data,
            enables,
            dot,
            shown: None,
        }
    }

    /// Show `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::IndexOutOfBounds`] if a digit index is outside the enables.
    pub fn write(&mut self, frame: Frame) -> Result<()> {
        for (index, &code) in frame.digits.iter().enumerate() {
            let unchanged = self.shown.is_some_and(|shown| {
                shown.digits.get(index) == Some(&code) && (index != DOT_DIGIT || shown.dot == frame.dot)
            });
            if unchanged {
                continue;
            }
            self.latch(index, code, frame.dot)?;
        }
        #[cfg(feature = "clock-trace")]
        defmt::info!("LatchedDisplay: {:?}", frame);
        self.shown = Some(frame);
        Ok(())
    }

    fn latch(&mut self, index: usize, code: u8, dot_on: bool) -> Result<()> {
        self.data.set_from_bits(code);
        if index == DOT_DIGIT {
            self.dot.set_level(Level::from(!dot_on));
        }
        self.enables.set_level_at_index(index, Level::Low)?;
        self.enables.set_level_at_index(index, Level::High)
    }
}
