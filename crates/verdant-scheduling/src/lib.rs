//! Compliance scheduling and escalation engine.
//!
//! The algorithmic core of the Verdant compliance platform:
//!
//! - **Schedule calculator** - next due dates from frequency, base date,
//!   last completion, grace periods, and business-day/holiday rules.
//! - **Workflow matcher** - resolves the escalation policy applying to an
//!   overdue obligation (category-specific, company default, or the fixed
//!   system fallback) and determines the target level from day thresholds.
//! - **Escalation state machine** - strictly sequential level progression
//!   with an append-only history chain.
//! - **Trigger executor** - a periodic batch job turning recurrence rules
//!   into schedule and deadline rows with a full execution audit trail.
//!
//! Notification delivery, overdue-day computation, and recipient contact
//! resolution are external; this crate's contract ends at producing
//! `(obligation_id, level, recipient_ids)` tuples and deadline rows.

pub mod calculator;
pub mod dates;
pub mod error;
pub mod holidays;
pub mod jobs;
pub mod services;

pub use calculator::{ScheduleCalculator, MAX_ADJUSTMENT_STEPS};
pub use error::{Result, SchedulingError};
pub use holidays::{is_public_holiday, HolidayCalendar, StaticHolidayCalendar};
pub use jobs::{
    TriggerExecutorInput, TriggerExecutorJob, TriggerExecutorJobError, TriggerExecutorStats,
};
pub use services::{
    determine_escalation_level, next_level, EscalationEntity, EscalationOutcome,
    EscalationService, EscalationThresholds, EscalationWorkflowService,
};
