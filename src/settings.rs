//! User settings: timezone, daylight saving, and NTP server.
//!
//! Persisted with [`crate::settings_record`]; on the device by [`SettingsStore`](crate::settings_store::SettingsStore).

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Smallest accepted UTC offset in hours.
pub const MIN_OFFSET_HOURS: i8 = -12;
/// Largest accepted UTC offset in hours.
pub const MAX_OFFSET_HOURS: i8 = 14;
/// Capacity of the NTP server name.
pub const NTP_SERVER_CAPACITY: usize = 128;
/// Server used until the user picks another one.
pub const DEFAULT_NTP_SERVER: &str = "pool.ntp.org";
/// Offset used until the user picks another one, unless `UTC_OFFSET_HOURS` is set at build time.
pub const FALLBACK_OFFSET_HOURS: i8 = 2;

/// Bounded NTP server hostname.
pub type NtpServerName = String<NTP_SERVER_CAPACITY>;

/// Clock settings, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockSettings {
    timezone_offset_hours: i8,
    daylight_saving: bool,
    ntp_server: NtpServerName,
}

impl ClockSettings {
    /// Build validated settings.
    ///
    /// # Errors
    ///
    /// [`Error::TimezoneOffsetOutOfRange`] if the offset is outside `-12..=14`;
    /// [`Error::NtpServerNameInvalid`] if the server name is empty or longer than 128 bytes.
    pub fn new(timezone_offset_hours: i8, daylight_saving: bool, ntp_server: &str) -> Result<Self> {
        validate_offset(timezone_offset_hours)?;
        let ntp_server = ntp_server.trim();
        if ntp_server.is_empty() {
            return Err(Error::NtpServerNameInvalid);
        }
        let ntp_server =
            NtpServerName::try_from(ntp_server).map_err(|()| Error::NtpServerNameInvalid)?;
        Ok(Self {
            timezone_offset_hours,
            daylight_saving,
            ntp_server,
        })
    }

    #[must_use]
    pub const fn timezone_offset_hours(&self) -> i8 {
        self.timezone_offset_hours
    }

    /// The base (non-DST) offset widened for offset arithmetic.
    #[must_use]
    pub fn base_offset_hours(&self) -> i32 {
        i32::from(self.timezone_offset_hours)
    }

    #[must_use]
    pub const fn daylight_saving(&self) -> bool {
        self.daylight_saving
    }

    #[must_use]
    pub fn ntp_server(&self) -> &str {
        self.ntp_server.as_str()
    }

    /// The bounded server name, for tasks that keep their own copy.
    #[must_use]
    pub const fn ntp_server_name(&self) -> &NtpServerName {
        &self.ntp_server
    }

    /// Re-check invariants on values that did not come through [`ClockSettings::new`],
    /// such as a decoded storage record.
    ///
    /// # Errors
    ///
    /// Same as [`ClockSettings::new`].
    pub fn validate(&self) -> Result<()> {
        validate_offset(self.timezone_offset_hours)?;
        if self.ntp_server.trim().is_empty() {
            return Err(Error::NtpServerNameInvalid);
        }
        Ok(())
    }
}

impl Default for ClockSettings {
    fn default() -> Self {
        let timezone_offset_hours = option_env!("UTC_OFFSET_HOURS")
            .and_then(|hours| hours.trim().parse::<i8>().ok())
            .filter(|&hours| validate_offset(hours).is_ok())
            .unwrap_or(FALLBACK_OFFSET_HOURS);
        Self {
            timezone_offset_hours,
            daylight_saving: true,
            ntp_server: default_ntp_server(),
        }
    }
}

const _: () = assert!(
    !DEFAULT_NTP_SERVER.is_empty() && DEFAULT_NTP_SERVER.len() <= NTP_SERVER_CAPACITY,
    "DEFAULT_NTP_SERVER must fit NtpServerName"
);

fn default_ntp_server() -> NtpServerName {
    // Length checked at compile time above.
    NtpServerName::try_from(DEFAULT_NTP_SERVER).unwrap_or_default()
}

const fn validate_offset(hours: i8) -> Result<()> {
    if hours < MIN_OFFSET_HOURS || hours > MAX_OFFSET_HOURS {
        return Err(Error::TimezoneOffsetOutOfRange(hours));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ClockSettings, DEFAULT_NTP_SERVER, NTP_SERVER_CAPACITY};
    use crate::Error;

    #[test]
    fn defaults_are_valid() {
        let settings = ClockSettings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.daylight_saving());
        assert_eq!(settings.ntp_server(), DEFAULT_NTP_SERVER);
        assert_eq!(settings.ntp_server_name().as_str(), DEFAULT_NTP_SERVER);
    }

    #[test]
    fn full_length_server_name_is_kept_whole() {
        let longest = "n".repeat(NTP_SERVER_CAPACITY);
        let settings = ClockSettings::new(1, true, &longest).unwrap();
        let copy = settings.ntp_server_name().clone();
        assert_eq!(copy.len(), NTP_SERVER_CAPACITY);
        assert_eq!(copy.as_str(), longest);
    }

    #[test]
    fn offset_range_is_enforced() {
        assert!(ClockSettings::new(-12, false, "time.nist.gov").is_ok());
        assert!(ClockSettings::new(14, false, "time.nist.gov").is_ok());
        assert!(matches!(
            ClockSettings::new(15, false, "time.nist.gov"),
            Err(Error::TimezoneOffsetOutOfRange(15))
        ));
        assert!(matches!(
            ClockSettings::new(-13, true, "time.nist.gov"),
            Err(Error::TimezoneOffsetOutOfRange(-13))
        ));
    }

    #[test]
    fn server_name_is_trimmed_and_bounded() {
        let settings = ClockSettings::new(0, true, "  de.pool.ntp.org ").unwrap();
        assert_eq!(settings.ntp_server(), "de.pool.ntp.org");
        assert!(matches!(
            ClockSettings::new(0, true, "   "),
            Err(Error::NtpServerNameInvalid)
        ));
        let long = "a".repeat(129);
        assert!(matches!(
            ClockSettings::new(0, true, &long),
            Err(Error::NtpServerNameInvalid)
        ));
    }
}
