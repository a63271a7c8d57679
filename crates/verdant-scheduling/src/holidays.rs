//! Holiday calendar abstraction.
//!
//! The calculator treats holiday data as a pure external lookup: given a
//! year, a provider returns that year's public holidays for the configured
//! jurisdiction. `StaticHolidayCalendar` is the in-memory implementation the
//! worker builds from configuration.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

/// Day of December from which the following year's holiday table is also
/// consulted, so year-boundary holidays classify correctly.
const YEAR_BOUNDARY_DECEMBER_DAY: u32 = 25;

/// Provider of public-holiday dates for a fixed jurisdiction.
pub trait HolidayCalendar: Send + Sync {
    /// Holiday dates falling in the given calendar year.
    fn holidays_for_year(&self, year: i32) -> HashSet<NaiveDate>;
}

/// An in-memory holiday calendar built from a fixed date list.
#[derive(Debug, Clone, Default)]
pub struct StaticHolidayCalendar {
    by_year: HashMap<i32, HashSet<NaiveDate>>,
}

impl StaticHolidayCalendar {
    /// Build a calendar from an explicit list of holiday dates.
    #[must_use]
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut by_year: HashMap<i32, HashSet<NaiveDate>> = HashMap::new();
        for date in dates {
            by_year.entry(date.year()).or_default().insert(date);
        }
        Self { by_year }
    }

    /// Parse a comma-separated list of ISO dates (the `PUBLIC_HOLIDAYS`
    /// config format). Unparseable entries are returned as errors.
    pub fn parse(value: &str) -> Result<Self, String> {
        let mut dates = Vec::new();
        for part in value.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let date = part
                .parse::<NaiveDate>()
                .map_err(|e| format!("invalid holiday date '{part}': {e}"))?;
            dates.push(date);
        }
        Ok(Self::new(dates))
    }

    /// An empty calendar (no configured holidays).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl HolidayCalendar for StaticHolidayCalendar {
    fn holidays_for_year(&self, year: i32) -> HashSet<NaiveDate> {
        self.by_year.get(&year).cloned().unwrap_or_default()
    }
}

/// Whether a date is a configured public holiday.
///
/// Checks the date's own calendar year and, for dates in the last week of
/// December, the following year's table as well.
#[must_use]
pub fn is_public_holiday(calendar: &dyn HolidayCalendar, date: NaiveDate) -> bool {
    if calendar.holidays_for_year(date.year()).contains(&date) {
        return true;
    }

    if date.month() == 12 && date.day() >= YEAR_BOUNDARY_DECEMBER_DAY {
        return calendar.holidays_for_year(date.year() + 1).contains(&date);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_static_calendar_lookup() {
        let calendar = StaticHolidayCalendar::new([date(2026, 1, 1), date(2026, 12, 25)]);
        assert!(is_public_holiday(&calendar, date(2026, 1, 1)));
        assert!(!is_public_holiday(&calendar, date(2026, 1, 2)));
    }

    #[test]
    fn test_year_boundary_checks_following_year_table() {
        // A late-December date listed under the following year's table
        // still classifies as a holiday.
        let calendar = StaticHolidayCalendar::new([date(2027, 12, 28)]);
        assert!(calendar.holidays_for_year(2026).is_empty());
        assert!(is_public_holiday(&calendar, date(2027, 12, 28)));

        let mut by_year_entry = StaticHolidayCalendar::default();
        by_year_entry
            .by_year
            .entry(2027)
            .or_default()
            .insert(date(2026, 12, 28));
        assert!(is_public_holiday(&by_year_entry, date(2026, 12, 28)));
    }

    #[test]
    fn test_mid_year_date_ignores_following_year() {
        let mut calendar = StaticHolidayCalendar::default();
        calendar
            .by_year
            .entry(2027)
            .or_default()
            .insert(date(2026, 6, 1));
        assert!(!is_public_holiday(&calendar, date(2026, 6, 1)));
    }

    #[test]
    fn test_parse_holiday_list() {
        let calendar = StaticHolidayCalendar::parse("2026-01-01, 2026-04-03,").unwrap();
        assert!(is_public_holiday(&calendar, date(2026, 1, 1)));
        assert!(is_public_holiday(&calendar, date(2026, 4, 3)));

        assert!(StaticHolidayCalendar::parse("not-a-date").is_err());
    }
}
