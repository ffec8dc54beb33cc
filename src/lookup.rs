//! Lookup helpers shared by every projection pass
//!
//! - Calendar arithmetic on valuation dates
//! - Nested assumption-table lookup with explicit absence
//! - Premium-term snapping for term-keyed tables
//! - Guarded division and annual-to-monthly rate conversion

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::assumptions::RateTable;

/// Premium payment terms that commission and allocation tables are keyed by
pub const VALID_PREMIUM_TERMS: [u32; 4] = [1, 3, 5, 10];

/// Add `months` calendar months to a date.
///
/// Month-end is not clamped: the day of month is carried over and any excess
/// rolls into the following month, so 2025-01-31 + 1 month is 2025-03-03.
/// Returns `None` only when the result leaves chrono's supported range.
pub fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let first = date.with_day(1)?;
    let shifted = if months >= 0 {
        first.checked_add_months(Months::new(months as u32))?
    } else {
        first.checked_sub_months(Months::new(months.unsigned_abs()))?
    };
    shifted.checked_add_days(Days::new(u64::from(date.day() - 1)))
}

/// Format a date as `YYYY-MM-DD`
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Descend a nested table by successive keys.
///
/// `None` when any key is absent at any level, or when the keys stop short
/// of (or run past) a rate. Callers choose the default explicitly.
pub fn nested_lookup<K: AsRef<str>>(table: &RateTable, keys: &[K]) -> Option<f64> {
    table.lookup(keys)
}

/// Snap a premium payment term to the nearest of [`VALID_PREMIUM_TERMS`].
///
/// Candidates are tested in ascending order and only a strictly smaller
/// distance replaces the current best, so exact ties go to the lower term.
pub fn nearest_valid_term(premium_term: u32) -> u32 {
    let mut best = VALID_PREMIUM_TERMS[0];
    let mut best_distance = premium_term.abs_diff(best);
    for &term in &VALID_PREMIUM_TERMS[1..] {
        let distance = premium_term.abs_diff(term);
        if distance < best_distance {
            best = term;
            best_distance = distance;
        }
    }
    best
}

/// Convert an annual effective rate to the equivalent monthly rate:
/// `(1 + annual)^(1/12) - 1`
pub fn annual_to_monthly_rate(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0
}

/// Convert an annual decrement probability to a monthly one:
/// `1 - (1 - q)^(1/12)`, with `q` clamped to [0, 1]
pub fn annual_to_monthly_decrement(annual_rate: f64) -> f64 {
    let q = annual_rate.clamp(0.0, 1.0);
    1.0 - (1.0 - q).powf(1.0 / 12.0)
}

/// Division that yields 0 for a zero (or non-finite) denominator
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_months_rolls_over_month_end() {
        assert_eq!(add_months(date(2025, 1, 31), 1), Some(date(2025, 3, 3)));
        assert_eq!(add_months(date(2025, 5, 31), 1), Some(date(2025, 7, 1)));
        assert_eq!(add_months(date(2024, 1, 31), 1), Some(date(2024, 3, 2)));
    }

    #[test]
    fn test_add_months_plain_and_negative() {
        assert_eq!(add_months(date(2025, 5, 15), 0), Some(date(2025, 5, 15)));
        assert_eq!(add_months(date(2025, 5, 15), 12), Some(date(2026, 5, 15)));
        assert_eq!(add_months(date(2025, 5, 15), -6), Some(date(2024, 11, 15)));
        assert_eq!(add_months(date(2025, 12, 31), 12), Some(date(2026, 12, 31)));
    }

    #[test]
    fn test_iso_round_trip() {
        let d = date(2025, 5, 31);
        assert_eq!(format_iso_date(d), "2025-05-31");
        assert_eq!(parse_iso_date("2025-05-31"), Some(d));
        assert_eq!(parse_iso_date("31/05/2025"), None);
    }

    #[test]
    fn test_nearest_valid_term() {
        assert_eq!(nearest_valid_term(7), 5);
        assert_eq!(nearest_valid_term(4), 3);
        assert_eq!(nearest_valid_term(2), 1);
        assert_eq!(nearest_valid_term(8), 10);
        assert_eq!(nearest_valid_term(1), 1);
        assert_eq!(nearest_valid_term(25), 10);
        assert_eq!(nearest_valid_term(0), 1);
    }

    #[test]
    fn test_nested_lookup_absent_keys() {
        let table: RateTable =
            serde_json::from_str(r#"{"1": {"5": 40.0}, "2": {"5": 10.0}}"#).unwrap();
        assert_eq!(nested_lookup(&table, &["1", "5"]), Some(40.0));
        assert_eq!(nested_lookup(&table, &["3", "5"]), None);
        assert_eq!(nested_lookup(&table, &["1", "10"]), None);
        assert_eq!(nested_lookup(&table, &["1"]), None);
        assert_eq!(nested_lookup(&table, &["1", "5", "x"]), None);
    }

    #[test]
    fn test_rate_conversions() {
        let monthly = annual_to_monthly_rate(0.05);
        assert_relative_eq!((1.0 + monthly).powi(12), 1.05, epsilon = 1e-12);

        let q = annual_to_monthly_decrement(0.12);
        assert_relative_eq!(1.0 - (1.0 - q).powi(12), 0.12, epsilon = 1e-12);
        assert_eq!(annual_to_monthly_decrement(0.0), 0.0);
        assert_eq!(annual_to_monthly_decrement(1.5), 1.0);
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(5.0, 2.0), 2.5);
    }
}
