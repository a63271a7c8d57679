//! Shared type definitions for the scheduling core.
//!
//! Wire-level enums used across obligations, schedules, deadlines and
//! trigger rules. All enums map to `PostgreSQL` enum types.

use serde::{Deserialize, Serialize};

/// How often an obligation recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "obligation_frequency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ObligationFrequency {
    /// Due every day.
    Daily,
    /// Due every week.
    Weekly,
    /// Due every calendar month.
    Monthly,
    /// Due every three calendar months.
    Quarterly,
    /// Due every calendar year.
    Annual,
    /// A single occurrence with no recurrence.
    OneTime,
    /// Continuously in force; has no computable next due date.
    Continuous,
    /// Driven by external events; has no computable next due date.
    EventTriggered,
}

impl ObligationFrequency {
    /// Whether this frequency produces a meaningful next due date.
    ///
    /// `OneTime`, `Continuous` and `EventTriggered` obligations return their
    /// base date unchanged from the calculator; callers must treat that value
    /// as "not applicable" rather than a real deadline.
    #[must_use]
    pub fn has_recurrence(&self) -> bool {
        !matches!(
            self,
            Self::OneTime | Self::Continuous | Self::EventTriggered
        )
    }

    /// Parse a frequency from an enum token or a natural-language descriptor.
    ///
    /// Accepts the snake_case wire form ("monthly", "one_time") as well as
    /// the free-form descriptors that appear in imported documents
    /// ("every month", "annually", "once").
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "daily" | "every day" | "each day" => Some(Self::Daily),
            "weekly" | "every week" | "each week" => Some(Self::Weekly),
            "monthly" | "every month" | "each month" => Some(Self::Monthly),
            "quarterly" | "every quarter" | "every 3 months" | "every three months" => {
                Some(Self::Quarterly)
            }
            "annual" | "annually" | "yearly" | "every year" | "each year" => Some(Self::Annual),
            "one_time" | "one-time" | "one time" | "once" | "single" => Some(Self::OneTime),
            "continuous" | "ongoing" | "always" => Some(Self::Continuous),
            "event_triggered" | "event-triggered" | "on event" | "event" => {
                Some(Self::EventTriggered)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ObligationFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
            Self::OneTime => "one_time",
            Self::Continuous => "continuous",
            Self::EventTriggered => "event_triggered",
        };
        write!(f, "{token}")
    }
}

/// Lifecycle status of a recurrence schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "schedule_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// The schedule is generating deadlines.
    Active,
    /// The schedule has run its course (terminal).
    Completed,
    /// The schedule was cancelled (terminal).
    Cancelled,
}

impl ScheduleStatus {
    /// Whether the schedule is still generating deadlines.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Lifecycle status of a single deadline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "deadline_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    /// Awaiting completion.
    Pending,
    /// Evidence was submitted and accepted.
    Completed,
    /// The due date passed without completion (terminal).
    Missed,
    /// The deadline was cancelled (terminal).
    Cancelled,
}

/// How a recurrence trigger rule decides to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "trigger_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Fires when its next execution date arrives.
    Scheduled,
    /// Fires when a matching event occurred since its last execution.
    EventBased,
    /// Evaluated by a separate condition-evaluation process.
    Conditional,
}

/// What kind of entity a trigger rule creates when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "target_entity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TargetEntityType {
    /// Creates an obligation schedule.
    Schedule,
    /// Creates a concrete compliance deadline.
    Deadline,
}

/// Outcome of one trigger firing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "execution_result", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExecutionResult {
    /// The target entity was created.
    Success,
    /// The firing attempt failed; see the detail payload.
    Failed,
}
