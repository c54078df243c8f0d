//! Daylight-saving rules for the four supported regions.
//!
//! Each rule is evaluated to the calendar day using the "Sunday anchor": the day of the month
//! of the most recent Sunday on or before the date (`day - weekday`, which goes to zero or below
//! early in a month). "Last Sunday of a 31-day month" becomes `anchor >= 25`, "second Sunday"
//! becomes `anchor >= 8`, and "before the first Sunday" becomes `anchor <= 0`.
//!
//! The switch happens at local midnight of the transition day, not at the 01:00/02:00 clock
//! moment of the real rules.

use crate::calendar::{epoch_to_civil, CivilDate};

/// The regional DST rule set. Picked at build time, see [`DstRegion::configured`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DstRegion {
    /// Last Sunday of March to last Sunday of October.
    #[default]
    Europe,
    /// Second Sunday of March to first Sunday of November.
    NorthAmerica,
    /// First Sunday of October to first Sunday of April.
    Australia,
    /// First Sunday of September to first Sunday of April (Chile).
    SouthAmerica,
}

impl DstRegion {
    /// Parse a region name (`europe`, `north-america`, `australia`, `south-america`, with `_`
    /// or `-`, any case) or its numeric code `0..=3`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        let matches = |candidate: &str| {
            name.len() == candidate.len()
                && name
                    .bytes()
                    .zip(candidate.bytes())
                    .all(|(have, want)| have.to_ascii_lowercase() == want || (have == b'_' && want == b'-'))
        };
        if matches("europe") || name == "0" {
            Some(Self::Europe)
        } else if matches("north-america") || name == "1" {
            Some(Self::NorthAmerica)
        } else if matches("australia") || name == "2" {
            Some(Self::Australia)
        } else if matches("south-america") || name == "3" {
            Some(Self::SouthAmerica)
        } else {
            None
        }
    }

    /// The region chosen at build time through the `DST_REGION` environment variable.
    ///
    /// Unknown or missing values fall back to [`DstRegion::Europe`].
    #[must_use]
    pub fn configured() -> Self {
        option_env!("DST_REGION")
            .and_then(Self::parse)
            .unwrap_or_default()
    }

    /// Whether this region's rule says DST is in effect on `date`.
    #[must_use]
    pub const fn is_active_on(self, date: CivilDate) -> bool {
        let month = date.month;
        let anchor = sunday_anchor(date);
        match self {
            Self::Europe => {
                (month > 3 && month < 10)
                    || (month == 3 && anchor >= 25)
                    || (month == 10 && anchor <= 24)
            }
            Self::NorthAmerica => {
                (month > 3 && month < 11)
                    || (month == 3 && anchor >= 8)
                    || (month == 11 && anchor <= 0)
            }
            Self::Australia => {
                month > 10 || month < 4 || (month == 10 && anchor >= 1) || (month == 4 && anchor <= 0)
            }
            Self::SouthAmerica => {
                month > 9 || month < 4 || (month == 9 && anchor >= 1) || (month == 4 && anchor <= 0)
            }
        }
    }
}

/// Day of the month of the most recent Sunday on or before `date`. Can be zero or negative.
#[must_use]
#[expect(
    clippy::arithmetic_side_effects,
    reason = "day <= 31 and weekday <= 6 cannot overflow i16"
)]
pub const fn sunday_anchor(date: CivilDate) -> i16 {
    date.day as i16 - date.weekday as i16
}

/// Whether DST is active at `epoch` in `region`, judged on the local date at `utc_offset_hours`.
///
/// ```
/// use ntp_led_clock::dst::{is_dst_active, DstRegion};
///
/// // 2023-06-15 12:00 UTC
/// assert!(is_dst_active(1_686_830_400, DstRegion::Europe, 1));
/// // 2023-12-15 12:00 UTC
/// assert!(!is_dst_active(1_702_641_600, DstRegion::Europe, 1));
/// ```
#[must_use]
pub fn is_dst_active(epoch: u32, region: DstRegion, utc_offset_hours: i32) -> bool {
    let date = epoch_to_civil(epoch, utc_offset_hours);
    let active = region.is_active_on(date);
    #[cfg(feature = "clock-trace")]
    defmt::info!("DST check {:?} on {:?}: {}", region, date, active);
    active
}

/// `1` when DST is active, else `0`; the extra hours to add to the base UTC offset.
#[must_use]
pub fn dst_offset_hours(epoch: u32, region: DstRegion, utc_offset_hours: i32) -> i32 {
    i32::from(is_dst_active(epoch, region, utc_offset_hours))
}

#[cfg(test)]
mod tests {
    use super::{dst_offset_hours, is_dst_active, sunday_anchor, DstRegion};
    use crate::calendar::CivilDate;

    // 12:00 UTC on the named day
    const SAT_2023_03_25: u32 = 1_679_745_600;
    const SUN_2023_03_26: u32 = 1_679_832_000;
    const SAT_2023_10_28: u32 = 1_698_494_400;
    const SUN_2023_10_29: u32 = 1_698_580_800;

    #[test]
    fn anchor_goes_negative_early_in_month() {
        let date = CivilDate {
            year: 2023,
            month: 11,
            day: 1,
            weekday: 3,
        };
        assert_eq!(sunday_anchor(date), -2);
    }

    #[test]
    fn europe_last_sunday_boundaries() {
        assert!(!is_dst_active(SAT_2023_03_25, DstRegion::Europe, 0));
        assert!(is_dst_active(SUN_2023_03_26, DstRegion::Europe, 0));
        assert!(is_dst_active(SAT_2023_10_28, DstRegion::Europe, 0));
        assert!(!is_dst_active(SUN_2023_10_29, DstRegion::Europe, 0));
    }

    #[test]
    fn offset_hours_is_zero_or_one() {
        assert_eq!(dst_offset_hours(SUN_2023_03_26, DstRegion::Europe, 0), 1);
        assert_eq!(dst_offset_hours(SAT_2023_03_25, DstRegion::Europe, 0), 0);
    }

    #[test]
    fn parse_names_and_codes() {
        assert_eq!(DstRegion::parse("Europe"), Some(DstRegion::Europe));
        assert_eq!(DstRegion::parse("north_america"), Some(DstRegion::NorthAmerica));
        assert_eq!(DstRegion::parse("NORTH-AMERICA"), Some(DstRegion::NorthAmerica));
        assert_eq!(DstRegion::parse("2"), Some(DstRegion::Australia));
        assert_eq!(DstRegion::parse(" south-america "), Some(DstRegion::SouthAmerica));
        assert_eq!(DstRegion::parse("mars"), None);
        assert_eq!(DstRegion::parse("4"), None);
    }
}
