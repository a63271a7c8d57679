//! Schedule calculator.
//!
//! Computes the next due date for a recurring obligation from its frequency,
//! base date, optional last completion, grace period, and business-day
//! adjustment rule.

use chrono::{NaiveDate, Utc};
use tracing::warn;

use verdant_db::models::ObligationFrequency;

use crate::dates::{add_frequency_interval, is_weekend, parse_frequency};
use crate::error::{Result, SchedulingError};
use crate::holidays::{is_public_holiday, HolidayCalendar};

/// Upper bound on backward business-day steps. A circuit breaker against
/// malformed holiday data, not a correctness limit: no real calendar has a
/// month of consecutive non-working days.
pub const MAX_ADJUSTMENT_STEPS: u32 = 30;

/// Computes next due dates against a holiday calendar.
///
/// `today` is injectable so calculations are deterministic under test; the
/// default is the current UTC date.
pub struct ScheduleCalculator<'a> {
    calendar: &'a dyn HolidayCalendar,
    today: Option<NaiveDate>,
}

impl<'a> ScheduleCalculator<'a> {
    /// Create a calculator over a holiday calendar.
    #[must_use]
    pub fn new(calendar: &'a dyn HolidayCalendar) -> Self {
        Self {
            calendar,
            today: None,
        }
    }

    /// Pin "today" to a fixed date.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Compute the next due date for an obligation.
    ///
    /// The reference date is `last_completed_date` when provided, else
    /// `base_date`. A base date in the past is replaced by today with a
    /// warning rather than an error: obligations created retroactively must
    /// still project forward. A last-completion date is used as-is even when
    /// past, since recurrence legitimately counts from it.
    ///
    /// The grace period extends the working deadline after the frequency
    /// step; it does not change which compliance period the obligation is
    /// attributed to.
    ///
    /// # Errors
    ///
    /// Returns `SchedulingError::DateOutOfRange` if the date arithmetic
    /// overflows the calendar range.
    pub fn calculate_next_due_date(
        &self,
        frequency: ObligationFrequency,
        base_date: NaiveDate,
        last_completed_date: Option<NaiveDate>,
        adjust_for_business_days: bool,
        grace_period_days: i64,
    ) -> Result<NaiveDate> {
        let today = self.today();

        let reference = match last_completed_date {
            Some(completed) => completed,
            None if base_date < today => {
                warn!(
                    base_date = %base_date,
                    effective = %today,
                    "Obligation base date is in the past; projecting from today"
                );
                today
            }
            None => base_date,
        };

        // Non-recurring frequencies have no computable next due date; the
        // effective base passes through and callers treat it as N/A.
        if !frequency.has_recurrence() {
            return Ok(reference);
        }

        let mut due = add_frequency_interval(reference, frequency)?;

        if grace_period_days > 0 {
            due = due
                .checked_add_signed(chrono::Duration::days(grace_period_days))
                .ok_or_else(|| {
                    SchedulingError::DateOutOfRange(format!("{due} + {grace_period_days}d grace"))
                })?;
        }

        if adjust_for_business_days {
            due = self.adjust_to_business_day(due);
        }

        Ok(due)
    }

    /// As [`Self::calculate_next_due_date`], but for a free-form frequency
    /// descriptor. Unknown descriptors fail with `InvalidFrequency`.
    pub fn calculate_from_descriptor(
        &self,
        frequency: &str,
        base_date: NaiveDate,
        last_completed_date: Option<NaiveDate>,
        adjust_for_business_days: bool,
        grace_period_days: i64,
    ) -> Result<NaiveDate> {
        let frequency = parse_frequency(frequency)?;
        self.calculate_next_due_date(
            frequency,
            base_date,
            last_completed_date,
            adjust_for_business_days,
            grace_period_days,
        )
    }

    /// Move a date backward one day at a time until it lands on a weekday
    /// that is not a public holiday, bounded by [`MAX_ADJUSTMENT_STEPS`].
    /// On exhaustion the best-effort date is returned rather than an error.
    fn adjust_to_business_day(&self, date: NaiveDate) -> NaiveDate {
        let mut adjusted = date;
        let mut steps = 0;

        while is_weekend(adjusted) || is_public_holiday(self.calendar, adjusted) {
            if steps >= MAX_ADJUSTMENT_STEPS {
                warn!(
                    due_date = %date,
                    adjusted = %adjusted,
                    steps,
                    "Business-day adjustment did not converge; returning best-effort date"
                );
                break;
            }
            let Some(previous) = adjusted.pred_opt() else {
                break;
            };
            adjusted = previous;
            steps += 1;
        }

        adjusted
    }
}
