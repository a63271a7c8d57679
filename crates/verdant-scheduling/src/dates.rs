//! Date and frequency utilities.
//!
//! Pure helpers shared by the schedule calculator and the trigger executor.
//! Calendar-month arithmetic clamps to the end of the target month
//! (2025-01-31 + 1 month = 2025-02-28) so month-end obligations stay inside
//! the month they name.

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};

use verdant_db::models::ObligationFrequency;

use crate::error::{Result, SchedulingError};

/// Add one frequency interval to a date.
///
/// Non-recurring frequencies (`OneTime`, `Continuous`, `EventTriggered`)
/// return the date unchanged; callers use
/// [`ObligationFrequency::has_recurrence`] to distinguish "no step" from a
/// real deadline.
pub fn add_frequency_interval(date: NaiveDate, frequency: ObligationFrequency) -> Result<NaiveDate> {
    let stepped = match frequency {
        ObligationFrequency::Daily => date.checked_add_signed(Duration::days(1)),
        ObligationFrequency::Weekly => date.checked_add_signed(Duration::weeks(1)),
        ObligationFrequency::Monthly => date.checked_add_months(Months::new(1)),
        ObligationFrequency::Quarterly => date.checked_add_months(Months::new(3)),
        ObligationFrequency::Annual => date.checked_add_months(Months::new(12)),
        ObligationFrequency::OneTime
        | ObligationFrequency::Continuous
        | ObligationFrequency::EventTriggered => Some(date),
    };

    stepped.ok_or_else(|| SchedulingError::DateOutOfRange(format!("{date} + {frequency}")))
}

/// Parse a frequency descriptor, failing with `InvalidFrequency` on unknown
/// input.
pub fn parse_frequency(value: &str) -> Result<ObligationFrequency> {
    ObligationFrequency::parse(value)
        .ok_or_else(|| SchedulingError::InvalidFrequency(value.to_string()))
}

/// Format a due date for audit payloads and notifications (ISO 8601).
#[must_use]
pub fn format_due_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
#[must_use]
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Whether a date falls on a Saturday or Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_interval_simple_steps() {
        let base = date(2025, 1, 15);
        assert_eq!(
            add_frequency_interval(base, ObligationFrequency::Daily).unwrap(),
            date(2025, 1, 16)
        );
        assert_eq!(
            add_frequency_interval(base, ObligationFrequency::Weekly).unwrap(),
            date(2025, 1, 22)
        );
        assert_eq!(
            add_frequency_interval(base, ObligationFrequency::Monthly).unwrap(),
            date(2025, 2, 15)
        );
        assert_eq!(
            add_frequency_interval(base, ObligationFrequency::Quarterly).unwrap(),
            date(2025, 4, 15)
        );
        assert_eq!(
            add_frequency_interval(base, ObligationFrequency::Annual).unwrap(),
            date(2026, 1, 15)
        );
    }

    #[test]
    fn test_add_interval_month_end_clamps() {
        assert_eq!(
            add_frequency_interval(date(2025, 1, 31), ObligationFrequency::Monthly).unwrap(),
            date(2025, 2, 28)
        );
        assert_eq!(
            add_frequency_interval(date(2024, 11, 30), ObligationFrequency::Quarterly).unwrap(),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn test_add_interval_leap_day_annual() {
        assert_eq!(
            add_frequency_interval(date(2024, 2, 29), ObligationFrequency::Annual).unwrap(),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn test_add_interval_non_recurring_unchanged() {
        let base = date(2025, 6, 1);
        for freq in [
            ObligationFrequency::OneTime,
            ObligationFrequency::Continuous,
            ObligationFrequency::EventTriggered,
        ] {
            assert_eq!(add_frequency_interval(base, freq).unwrap(), base);
        }
    }

    #[test]
    fn test_parse_frequency_errors_on_unknown() {
        assert!(matches!(
            parse_frequency("fortnightly"),
            Err(SchedulingError::InvalidFrequency(_))
        ));
        assert_eq!(
            parse_frequency("every quarter").unwrap(),
            ObligationFrequency::Quarterly
        );
    }

    #[test]
    fn test_is_weekend() {
        assert!(is_weekend(date(2025, 1, 18))); // Saturday
        assert!(is_weekend(date(2025, 1, 19))); // Sunday
        assert!(!is_weekend(date(2025, 1, 20))); // Monday
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(date(2025, 1, 1), date(2025, 1, 11)), 10);
        assert_eq!(days_between(date(2025, 1, 11), date(2025, 1, 1)), -10);
    }

    #[test]
    fn test_format_due_date() {
        assert_eq!(format_due_date(date(2025, 2, 20)), "2025-02-20");
    }
}
