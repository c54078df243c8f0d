use embassy_rp::gpio::{self, Level};

use crate::Result;
use crate::error::Error::IndexOutOfBounds;

/// Array of GPIO output pins driven together, such as a BCD bus or a bank of latch enables.
pub struct OutputArray<'a, const N: usize>([gpio::Output<'a>; N]);

impl<'a, const N: usize> OutputArray<'a, N> {
    #[must_use]
    pub const fn new(outputs: [gpio::Output<'a>; N]) -> Self {
        Self(outputs)
    }

    #[inline]
    pub(crate) fn set_level_at_index(&mut self, index: usize, level: Level) -> Result<()> {
        self.0
            .get_mut(index)
            .ok_or(IndexOutOfBounds)?
            .set_level(level);
        Ok(())
    }

    #[inline]
    pub(crate) fn set_all(&mut self, level: Level) {
        for output in &mut self.0 {
            output.set_level(level);
        }
    }

    /// Drive pin `i` from bit `i` of `bits` (least significant bit first).
    #[inline]
    pub(crate) fn set_from_bits(&mut self, mut bits: u8) {
        for output in &mut self.0 {
            let level: Level = ((bits & 1) == 1).into();
            output.set_level(level);
            bits >>= 1;
        }
    }
}
