//! Report periods
//!
//! Month and year windows are half-open UTC ranges, so adjacent periods
//! never share a play.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Datelike, SecondsFormat, TimeZone, Utc};
use std::ops::RangeInclusive;

pub const YEAR_RANGE: RangeInclusive<i32> = 2000..=2100;
pub const MONTH_RANGE: RangeInclusive<u32> = 1..=12;

/// Upper bound for every list size a caller can ask for.
pub const MAX_LIMIT: usize = 50;

/// Resolved report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub year: i32,
    pub month: Option<u32>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PeriodWindow {
    /// Calendar month `[1st, 1st of next month)`.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let (end_year, end_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };

        Ok(Self {
            year,
            month: Some(month),
            start: first_of_month(year, month)?,
            end: first_of_month(end_year, end_month)?,
        })
    }

    /// Calendar year `[Jan 1, Jan 1 of next year)`.
    pub fn year(year: i32) -> Result<Self> {
        Ok(Self {
            year,
            month: None,
            start: first_of_month(year, 1)?,
            end: first_of_month(year + 1, 1)?,
        })
    }

    /// `start` as ISO-8601, e.g. `2024-03-01T00:00:00+00:00`
    pub fn start_iso(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    pub fn end_iso(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

fn first_of_month(year: i32, month: u32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| CoreError::InvalidInput(format!("no such month {year}-{month:02}")))
}

fn previous_month(now: DateTime<Utc>) -> (i32, u32) {
    if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    }
}

pub fn validate_year(year: i32) -> Result<i32> {
    if YEAR_RANGE.contains(&year) {
        Ok(year)
    } else {
        Err(CoreError::InvalidInput(format!(
            "year must be between {} and {}, got {}",
            YEAR_RANGE.start(),
            YEAR_RANGE.end(),
            year
        )))
    }
}

pub fn validate_month(month: u32) -> Result<u32> {
    if MONTH_RANGE.contains(&month) {
        Ok(month)
    } else {
        Err(CoreError::InvalidInput(format!(
            "month must be between 1 and 12, got {month}"
        )))
    }
}

/// Check a list size against `1..=MAX_LIMIT`.
pub fn validate_limit(name: &str, value: usize) -> Result<usize> {
    if (1..=MAX_LIMIT).contains(&value) {
        Ok(value)
    } else {
        Err(CoreError::InvalidInput(format!(
            "{name} must be between 1 and {MAX_LIMIT}, got {value}"
        )))
    }
}

/// Year and month for a monthly report.
///
/// | year | month | result |
/// |------|-------|--------|
/// | given | given | as given |
/// | given | none | previous month's number, in `year` |
/// | none | given | `month` of the current year |
/// | none | none | the previous calendar month |
pub fn resolve_month_year(
    year: Option<i32>,
    month: Option<u32>,
    now: DateTime<Utc>,
) -> Result<(i32, u32)> {
    let year = year.map(validate_year).transpose()?;
    let month = month.map(validate_month).transpose()?;
    let (previous_year, previous_month) = previous_month(now);

    Ok(match (year, month) {
        (Some(year), Some(month)) => (year, month),
        (Some(year), None) => (year, previous_month),
        (None, Some(month)) => (now.year(), month),
        (None, None) => (previous_year, previous_month),
    })
}

/// Year for a yearly report, defaulting to last year.
pub fn resolve_year(year: Option<i32>, now: DateTime<Utc>) -> Result<i32> {
    match year {
        Some(year) => validate_year(year),
        None => Ok(now.year() - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_resolve_month_year_table() {
        assert_eq!(resolve_month_year(Some(2022), Some(8), now()).unwrap(), (2022, 8));
        assert_eq!(resolve_month_year(Some(2022), None, now()).unwrap(), (2022, 4));
        assert_eq!(resolve_month_year(None, Some(2), now()).unwrap(), (2024, 2));
        assert_eq!(resolve_month_year(None, None, now()).unwrap(), (2024, 4));
    }

    #[test]
    fn test_previous_month_wraps_year() {
        let january = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        assert_eq!(resolve_month_year(None, None, january).unwrap(), (2023, 12));
        assert_eq!(resolve_month_year(Some(2020), None, january).unwrap(), (2020, 12));
    }

    #[test]
    fn test_resolve_rejects_out_of_range() {
        assert!(matches!(
            resolve_month_year(None, Some(13), now()),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(resolve_month_year(None, Some(0), now()).is_err());
        assert!(resolve_month_year(Some(1999), Some(1), now()).is_err());
        assert!(resolve_year(Some(2101), now()).is_err());
    }

    #[test]
    fn test_resolve_year_defaults_to_last_year() {
        assert_eq!(resolve_year(None, now()).unwrap(), 2023);
        assert_eq!(resolve_year(Some(2021), now()).unwrap(), 2021);
    }

    #[test]
    fn test_month_window() {
        let march = PeriodWindow::month(2024, 3).unwrap();
        assert_eq!(march.start_iso(), "2024-03-01T00:00:00+00:00");
        assert_eq!(march.end_iso(), "2024-04-01T00:00:00+00:00");

        let december = PeriodWindow::month(2023, 12).unwrap();
        assert_eq!(december.end, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_year_window() {
        let year = PeriodWindow::year(2023).unwrap();
        assert_eq!(year.month, None);
        assert_eq!(year.start_iso(), "2023-01-01T00:00:00+00:00");
        assert_eq!(year.end_iso(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_validate_limit() {
        assert_eq!(validate_limit("limit", 1).unwrap(), 1);
        assert_eq!(validate_limit("limit", 50).unwrap(), 50);
        assert!(validate_limit("limit", 0).is_err());
        assert!(validate_limit("top_limit", 51)
            .unwrap_err()
            .to_string()
            .contains("top_limit"));
    }
}
