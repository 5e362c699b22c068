//! Epoch-relative calendar arithmetic
//!
//! Simulation time is seconds since [`EPOCH`]. Period boundaries are computed
//! with true calendar months (day clamped to month end) and then truncated to
//! the start of the day, so quarters vary slightly in length.

use crate::errors::{BudgetError, Result};
use chrono::{Months, NaiveDate, NaiveDateTime};

/// Seconds in one day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Epoch year, month and day (1951-01-01)
pub const EPOCH: (i32, u32, u32) = (1951, 1, 1);

// Well beyond chrono's +/-262k year range, still exact in i64 milliseconds.
const MAX_ABS_MILLIS: f64 = 9.0e15;

/// Epoch as a naive datetime at midnight
pub fn epoch() -> NaiveDateTime {
    let (year, month, day) = EPOCH;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("epoch is a valid calendar date")
}

/// Convert seconds since the epoch to a calendar datetime
///
/// Rounds to the millisecond. Returns `None` for non-finite input or dates
/// outside chrono's range.
pub fn to_datetime(seconds: f64) -> Option<NaiveDateTime> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() > MAX_ABS_MILLIS {
        return None;
    }
    epoch().checked_add_signed(chrono::Duration::milliseconds(millis as i64))
}

/// Convert a calendar datetime to seconds since the epoch
pub fn to_seconds(datetime: NaiveDateTime) -> f64 {
    (datetime - epoch()).num_milliseconds() as f64 / 1000.0
}

/// Add calendar months to an epoch-relative time and truncate to the date
///
/// Jan 31 + 3 months is Apr 30. The result is always midnight.
pub fn add_calendar_months(seconds: f64, months: u32) -> Result<f64> {
    let overflow = || BudgetError::CalendarOverflow { seconds, months };

    let advanced = to_datetime(seconds)
        .ok_or_else(overflow)?
        .checked_add_months(Months::new(months))
        .ok_or_else(overflow)?;

    let midnight = advanced.date().and_hms_opt(0, 0, 0).ok_or_else(overflow)?;
    Ok(to_seconds(midnight))
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS` into seconds since the epoch
pub fn parse_date(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    let invalid = || BudgetError::InvalidDate {
        input: input.to_string(),
    };

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
        return Ok(to_seconds(midnight));
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .map(to_seconds)
        .map_err(|_| invalid())
}

/// Human readable date for an epoch-relative time
pub fn format_time(seconds: f64) -> String {
    match to_datetime(seconds) {
        Some(dt) if dt.time() == chrono::NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("t={}s", seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> f64 {
        to_seconds(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    #[test]
    fn test_epoch_is_zero() {
        assert_eq!(to_seconds(epoch()), 0.0);
        assert_eq!(to_datetime(0.0), Some(epoch()));
    }

    #[test]
    fn test_quarter_from_epoch() {
        let next = add_calendar_months(0.0, 3).unwrap();
        assert_eq!(next, date(1951, 4, 1));
        assert_eq!(next, 90.0 * SECONDS_PER_DAY);
    }

    #[test]
    fn test_quarters_vary_in_length() {
        let q1 = add_calendar_months(0.0, 3).unwrap();
        let q2 = add_calendar_months(q1, 3).unwrap();
        // Jan-Mar 1951 is 90 days, Apr-Jun is 91 days
        assert_eq!(q1 / SECONDS_PER_DAY, 90.0);
        assert_eq!((q2 - q1) / SECONDS_PER_DAY, 91.0);
    }

    #[test]
    fn test_month_end_clamps() {
        let jan31 = date(1951, 1, 31);
        assert_eq!(add_calendar_months(jan31, 1).unwrap(), date(1951, 2, 28));
        assert_eq!(add_calendar_months(jan31, 3).unwrap(), date(1951, 4, 30));
    }

    #[test]
    fn test_truncates_to_midnight() {
        let afternoon = date(1951, 2, 10) + 15.5 * 3600.0;
        assert_eq!(add_calendar_months(afternoon, 3).unwrap(), date(1951, 5, 10));
    }

    #[test]
    fn test_before_epoch() {
        let earlier = date(1950, 11, 15);
        assert!(earlier < 0.0);
        assert_eq!(add_calendar_months(earlier, 3).unwrap(), date(1951, 2, 15));
    }

    #[test]
    fn test_overflow_is_error() {
        assert!(matches!(
            add_calendar_months(f64::INFINITY, 3),
            Err(BudgetError::CalendarOverflow { .. })
        ));
        assert!(add_calendar_months(1.0e16, 3).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("1951-04-01").unwrap(), date(1951, 4, 1));
        assert_eq!(parse_date("1951-01-01T06:00:00").unwrap(), 6.0 * 3600.0);
        assert!(matches!(
            parse_date("April 1st"),
            Err(BudgetError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "1951-01-01");
        assert_eq!(format_time(3600.0), "1951-01-01 01:00:00");
        assert_eq!(format_time(f64::NAN), "t=NaNs");
    }
}
