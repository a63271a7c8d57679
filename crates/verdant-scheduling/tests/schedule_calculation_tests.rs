//! Integration tests for next-due-date calculation.
//!
//! Validates the calculator's contract end to end: frequency semantics,
//! grace periods, business-day adjustment against holiday calendars, and
//! the retroactive-base-date policy.

use chrono::NaiveDate;

use verdant_db::models::ObligationFrequency;
use verdant_scheduling::{ScheduleCalculator, SchedulingError, StaticHolidayCalendar};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Frequency semantics
// ============================================================================

#[test]
fn monthly_obligation_advances_one_calendar_month() {
    let calendar = StaticHolidayCalendar::empty();
    let calc = ScheduleCalculator::new(&calendar).with_today(date(2025, 1, 1));

    let due = calc
        .calculate_next_due_date(
            ObligationFrequency::Monthly,
            date(2025, 1, 15),
            None,
            false,
            0,
        )
        .unwrap();
    assert_eq!(due, date(2025, 2, 15));
}

#[test]
fn grace_period_extends_the_working_deadline() {
    let calendar = StaticHolidayCalendar::empty();
    let calc = ScheduleCalculator::new(&calendar).with_today(date(2025, 1, 1));

    let due = calc
        .calculate_next_due_date(
            ObligationFrequency::Monthly,
            date(2025, 1, 15),
            None,
            false,
            5,
        )
        .unwrap();
    assert_eq!(due, date(2025, 2, 20));
}

#[test]
fn granularity_ordering_daily_weekly_monthly() {
    let calendar = StaticHolidayCalendar::empty();
    let calc = ScheduleCalculator::new(&calendar).with_today(date(2025, 5, 1));
    let base = date(2025, 5, 10);

    let mut results = Vec::new();
    for freq in [
        ObligationFrequency::Daily,
        ObligationFrequency::Weekly,
        ObligationFrequency::Monthly,
        ObligationFrequency::Quarterly,
        ObligationFrequency::Annual,
    ] {
        results.push(
            calc.calculate_next_due_date(freq, base, None, false, 0)
                .unwrap(),
        );
    }

    for pair in results.windows(2) {
        assert!(pair[0] < pair[1], "expected {} < {}", pair[0], pair[1]);
    }
}

#[test]
fn annual_from_leap_day_resolves_to_valid_date() {
    let calendar = StaticHolidayCalendar::empty();
    let calc = ScheduleCalculator::new(&calendar).with_today(date(2024, 2, 1));

    let due = calc
        .calculate_next_due_date(
            ObligationFrequency::Annual,
            date(2024, 2, 29),
            None,
            false,
            0,
        )
        .unwrap();
    assert_eq!(due, date(2025, 2, 28));
}

#[test]
fn non_recurring_frequencies_return_base_unchanged() {
    let calendar = StaticHolidayCalendar::empty();
    let calc = ScheduleCalculator::new(&calendar).with_today(date(2025, 1, 1));
    let base = date(2025, 8, 1);

    for freq in [
        ObligationFrequency::OneTime,
        ObligationFrequency::Continuous,
        ObligationFrequency::EventTriggered,
    ] {
        assert!(!freq.has_recurrence());
        let due = calc
            .calculate_next_due_date(freq, base, None, false, 0)
            .unwrap();
        assert_eq!(due, base);
    }
}

// ============================================================================
// Business-day adjustment
// ============================================================================

#[test]
fn weekend_due_date_moves_to_prior_weekday() {
    let calendar = StaticHolidayCalendar::empty();
    let calc = ScheduleCalculator::new(&calendar).with_today(date(2025, 1, 1));

    // 2025-02-15 is a Saturday.
    let due = calc
        .calculate_next_due_date(
            ObligationFrequency::Monthly,
            date(2025, 1, 15),
            None,
            true,
            0,
        )
        .unwrap();
    assert_eq!(due, date(2025, 2, 14));
}

#[test]
fn holiday_on_prior_weekday_pushes_further_back() {
    // Friday 2025-02-14 is a public holiday; a Saturday due date must land
    // on Thursday the 13th.
    let calendar = StaticHolidayCalendar::new([date(2025, 2, 14)]);
    let calc = ScheduleCalculator::new(&calendar).with_today(date(2025, 1, 1));

    let due = calc
        .calculate_next_due_date(
            ObligationFrequency::Monthly,
            date(2025, 1, 15),
            None,
            true,
            0,
        )
        .unwrap();
    assert_eq!(due, date(2025, 2, 13));
}

#[test]
fn year_boundary_holiday_is_respected() {
    // New Year's Day listed under the new year; a due date of Friday
    // 2027-01-01 must move back to Thursday 2026-12-31.
    let calendar = StaticHolidayCalendar::new([date(2027, 1, 1)]);
    let calc = ScheduleCalculator::new(&calendar).with_today(date(2026, 12, 1));

    let due = calc
        .calculate_next_due_date(
            ObligationFrequency::Daily,
            date(2026, 12, 31),
            None,
            true,
            0,
        )
        .unwrap();
    assert_eq!(due, date(2026, 12, 31));
}

// ============================================================================
// Reference-date policy
// ============================================================================

#[test]
fn last_completion_drives_recurrence_when_present() {
    let calendar = StaticHolidayCalendar::empty();
    let calc = ScheduleCalculator::new(&calendar).with_today(date(2025, 3, 1));

    let due = calc
        .calculate_next_due_date(
            ObligationFrequency::Monthly,
            date(2024, 1, 1),
            Some(date(2025, 2, 10)),
            false,
            0,
        )
        .unwrap();
    assert_eq!(due, date(2025, 3, 10));
}

#[test]
fn retroactive_base_date_projects_forward_from_today() {
    let calendar = StaticHolidayCalendar::empty();
    let calc = ScheduleCalculator::new(&calendar).with_today(date(2025, 6, 1));

    let due = calc
        .calculate_next_due_date(
            ObligationFrequency::Monthly,
            date(2023, 1, 1),
            None,
            false,
            0,
        )
        .unwrap();
    assert_eq!(due, date(2025, 7, 1));
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn unknown_frequency_descriptor_fails_the_calculation() {
    let calendar = StaticHolidayCalendar::empty();
    let calc = ScheduleCalculator::new(&calendar).with_today(date(2025, 1, 1));

    let err = calc
        .calculate_from_descriptor("biweekly-ish", date(2025, 2, 1), None, false, 0)
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidFrequency(_)));
}
