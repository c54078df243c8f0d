//! Unix timestamp type shared by the time source and the NTP task.

/// Units-safe wrapper for Unix timestamps (seconds since 1970-01-01 00:00:00 UTC)
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnixSeconds(pub i64);

impl UnixSeconds {
    /// Get the underlying i64 value
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Convert NTP seconds (since 1900-01-01) to Unix seconds (since 1970-01-01)
    #[must_use]
    pub const fn from_ntp_seconds(ntp: u32) -> Option<Self> {
        // 1900→1970: 70 years including 17 leap days
        const NTP_TO_UNIX_SECONDS: i64 = 2_208_988_800;
        #[expect(
            clippy::arithmetic_side_effects,
            reason = "u32 promoted to i64 cannot overflow"
        )]
        let s = (ntp as i64) - NTP_TO_UNIX_SECONDS;
        // Reject negative (pre-1970)
        if s >= 0 { Some(Self(s)) } else { None }
    }

    /// The 32-bit unsigned view used by the calendar engine.
    ///
    /// Values past 2106-02-07 wrap around, just like an unsigned 32-bit epoch counter.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Wrapping to 32 bits is the documented behavior"
    )]
    pub const fn as_epoch_u32(self) -> u32 {
        self.0 as u32
    }
}

#[cfg(test)]
mod tests {
    use super::UnixSeconds;

    #[test]
    fn ntp_era_offset() {
        assert_eq!(UnixSeconds::from_ntp_seconds(2_208_988_800), Some(UnixSeconds(0)));
        assert_eq!(
            UnixSeconds::from_ntp_seconds(3_908_988_800),
            Some(UnixSeconds(1_700_000_000))
        );
        assert_eq!(UnixSeconds::from_ntp_seconds(0), None);
    }

    #[test]
    fn epoch_u32_wraps() {
        assert_eq!(UnixSeconds(1_700_000_000).as_epoch_u32(), 1_700_000_000);
        assert_eq!(UnixSeconds(1_i64 << 32).as_epoch_u32(), 0);
    }
}
