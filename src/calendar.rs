//! Calendar arithmetic for 32-bit Unix epochs.
//!
//! Converts seconds since 1970-01-01T00:00:00Z plus a whole-hour UTC offset into a
//! proleptic Gregorian date. Years are found by walking forward from 1970 one year
//! at a time; months by walking the month-length table. Both loops are bounded by the
//! 32-bit epoch range (at most 136 years), which is cheap enough to run every second.
//!
//! See [`epoch_to_civil`].

/// Seconds in one civil day.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: i32 = 3_600;

/// 1970-01-01 was a Thursday.
const EPOCH_WEEKDAY: u32 = 4;

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// A civil date with its weekday.
///
/// `weekday` counts from Sunday: `0` = Sunday through `6` = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CivilDate {
    pub year: u16,
    /// 1 = January .. 12 = December
    pub month: u8,
    /// 1 ..= 31
    pub day: u8,
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: u8,
}

/// Gregorian leap-year rule.
///
/// ```
/// use ntp_led_clock::calendar::is_leap_year;
///
/// assert!(is_leap_year(2000));
/// assert!(is_leap_year(2024));
/// assert!(!is_leap_year(1900));
/// assert!(!is_leap_year(2023));
/// ```
#[must_use]
pub const fn is_leap_year(year: u16) -> bool {
    year.is_multiple_of(4) && (!year.is_multiple_of(100) || year.is_multiple_of(400))
}

/// Number of days in `year`.
#[must_use]
pub const fn days_in_year(year: u16) -> u32 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// Number of days in `month` (1-12) of `year`. Out-of-range months have zero days.
#[must_use]
#[expect(clippy::indexing_slicing, reason = "Index is checked against the table length")]
pub const fn days_in_month(year: u16, month: u8) -> u8 {
    if month == 2 && is_leap_year(year) {
        return 29;
    }
    match month.checked_sub(1) {
        Some(index) if (index as usize) < DAYS_IN_MONTH.len() => DAYS_IN_MONTH[index as usize],
        _ => 0,
    }
}

/// Day of week for a UTC epoch, `0` = Sunday.
#[must_use]
#[expect(
    clippy::integer_division_remainder_used,
    clippy::arithmetic_side_effects,
    reason = "Division by a non-zero constant; the sum stays far below u32::MAX"
)]
#[expect(
    clippy::cast_possible_truncation,
    reason = "The remainder is always below 7"
)]
pub const fn weekday_of(epoch: u32) -> u8 {
    ((epoch / SECONDS_PER_DAY + EPOCH_WEEKDAY) % 7) as u8
}

/// Shift `epoch` by `utc_offset_hours`, wrapping modulo 2^32 like an unsigned epoch counter.
#[must_use]
pub const fn shift_epoch(epoch: u32, utc_offset_hours: i32) -> u32 {
    epoch.wrapping_add_signed(utc_offset_hours.wrapping_mul(SECONDS_PER_HOUR))
}

/// Convert an epoch plus a UTC offset to a civil date.
///
/// The year, month, and day come from the offset-shifted epoch. The weekday comes from the
/// *unshifted* epoch, so within `utc_offset_hours` of midnight UTC the weekday can disagree with
/// the local date by one day. The DST rules in [`crate::dst`] are written against this behavior.
///
/// ```
/// use ntp_led_clock::calendar::{epoch_to_civil, CivilDate};
///
/// assert_eq!(
///     epoch_to_civil(0, 0),
///     CivilDate { year: 1970, month: 1, day: 1, weekday: 4 }
/// );
/// let date = epoch_to_civil(1_700_000_000, 0);
/// assert_eq!((date.year, date.month, date.day), (2023, 11, 14));
/// ```
#[must_use]
#[expect(
    clippy::integer_division_remainder_used,
    clippy::arithmetic_side_effects,
    reason = "Each subtraction is guarded by the comparison before it; year stays below 2107"
)]
pub fn epoch_to_civil(epoch: u32, utc_offset_hours: i32) -> CivilDate {
    let mut days = shift_epoch(epoch, utc_offset_hours) / SECONDS_PER_DAY;

    let mut year: u16 = 1970;
    loop {
        let year_length = days_in_year(year);
        if days < year_length {
            break;
        }
        days -= year_length;
        year += 1;
    }

    let mut month: u8 = 1;
    loop {
        let month_length = u32::from(days_in_month(year, month));
        if days < month_length || month == 12 {
            break;
        }
        days -= month_length;
        month += 1;
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "The remainder is below the month length"
    )]
    let day = days as u8 + 1;

    CivilDate {
        year,
        month,
        day,
        weekday: weekday_of(epoch),
    }
}

#[cfg(test)]
mod tests {
    use super::{days_in_month, epoch_to_civil, is_leap_year, weekday_of, CivilDate};

    #[test]
    fn leap_years() {
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
        assert!(!is_leap_year(2100));
    }

    #[test]
    fn february_length() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 0), 0);
        assert_eq!(days_in_month(2023, 13), 0);
    }

    #[test]
    fn epoch_zero_is_thursday_new_year() {
        assert_eq!(
            epoch_to_civil(0, 0),
            CivilDate {
                year: 1970,
                month: 1,
                day: 1,
                weekday: 4
            }
        );
    }

    #[test]
    fn last_day_of_leap_year() {
        // 2024-12-31 12:00:00 UTC, a Tuesday
        let date = epoch_to_civil(1_735_646_400, 0);
        assert_eq!((date.year, date.month, date.day, date.weekday), (2024, 12, 31, 2));
        // One day later
        let date = epoch_to_civil(1_735_732_800, 0);
        assert_eq!((date.year, date.month, date.day), (2025, 1, 1));
    }

    #[test]
    fn leap_day() {
        // 2024-02-29 00:00:00 UTC
        let date = epoch_to_civil(1_709_164_800, 0);
        assert_eq!((date.year, date.month, date.day), (2024, 2, 29));
    }

    #[test]
    fn offset_moves_date_but_not_weekday() {
        // 2023-11-14 23:00:00 UTC is a Tuesday; at UTC+2 it is already Wednesday the 15th.
        let epoch = 1_700_002_800;
        let date = epoch_to_civil(epoch, 2);
        assert_eq!((date.month, date.day), (11, 15));
        assert_eq!(date.weekday, 2);
        assert_eq!(weekday_of(epoch), 2);
    }

    #[test]
    fn negative_offset_before_epoch_wraps() {
        // 1970-01-01 00:00 at UTC-1 wraps to the top of the 32-bit range: 2106-02-07.
        let date = epoch_to_civil(0, -1);
        assert_eq!((date.year, date.month, date.day), (2106, 2, 7));
    }
}
