// src/dates.rs
//! Calendar dates and day-count conventions
//!
//! Market grids are quoted against calendar dates; the model works in year
//! fractions. This module converts between the two.

use crate::error::{SdeError, SdeResult};
use chrono::NaiveDate;

/// Day count convention used to turn a date span into a year fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayCount {
    /// Actual/365 Fixed
    #[default]
    Actual365Fixed,
}

impl DayCount {
    /// Year fraction between `start` and `end` (negative if `end < start`)
    pub fn year_fraction(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        let days = (end - start).num_days() as f64;
        match self {
            DayCount::Actual365Fixed => days / 365.0,
        }
    }
}

/// Build a date from a `(year, month, day)` triple
pub fn date_from_ymd(year: i32, month: u32, day: u32) -> SdeResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(SdeError::DateError { year, month, day })
}

/// Build one date per `(year, month, day)` entry of three parallel slices
pub fn dates_from_year_month_day(
    years: &[i32],
    months: &[u32],
    days: &[u32],
) -> SdeResult<Vec<NaiveDate>> {
    if years.len() != months.len() || years.len() != days.len() {
        return Err(SdeError::InvalidConfiguration {
            field: "dates".to_string(),
            reason: format!(
                "year/month/day lengths differ: {}/{}/{}",
                years.len(),
                months.len(),
                days.len()
            ),
        });
    }
    years
        .iter()
        .zip(months)
        .zip(days)
        .map(|((&y, &m), &d)| date_from_ymd(y, m, d))
        .collect()
}

/// Actual/365 Fixed year fractions from `start` to each of `ends`
pub fn daycount_actual_365_fixed(start: NaiveDate, ends: &[NaiveDate]) -> Vec<f64> {
    ends.iter()
        .map(|&end| DayCount::Actual365Fixed.year_fraction(start, end))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_actual_365_fixed_leap_year() {
        let start = date_from_ymd(2020, 1, 1).unwrap();
        let ends = dates_from_year_month_day(&[2021, 2022], &[1, 1], &[1, 1]).unwrap();
        let times = daycount_actual_365_fixed(start, &ends);
        assert_relative_eq!(times[0], 366.0 / 365.0);
        assert_relative_eq!(times[1], 731.0 / 365.0);
    }

    #[test]
    fn test_invalid_date() {
        let err = date_from_ymd(2021, 2, 30).unwrap_err();
        assert_eq!(
            err,
            SdeError::DateError {
                year: 2021,
                month: 2,
                day: 30
            }
        );
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(dates_from_year_month_day(&[2021, 2022], &[1], &[1, 1]).is_err());
    }

    #[test]
    fn test_year_fraction_is_signed() {
        let start = date_from_ymd(2021, 1, 1).unwrap();
        let end = date_from_ymd(2020, 1, 1).unwrap();
        assert_relative_eq!(DayCount::default().year_fraction(start, end), -366.0 / 365.0);
    }
}
