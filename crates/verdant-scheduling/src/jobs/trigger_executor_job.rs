//! Recurrence trigger executor job.
//!
//! A periodic batch job that scans trigger rules whose next execution date
//! has arrived, evaluates scheduled/event-based firing conditions, creates
//! the resulting schedule or deadline rows, records an execution audit row
//! for every attempt, and reschedules fired rules. One rule's failure never
//! aborts the batch; only the initial rule query propagates an error.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use verdant_db::models::{
    ComplianceDeadline, ComplianceEvent, CreateDeadline, CreateSchedule, ExecutionResult,
    ObligationFrequency, ObligationSchedule, RecurrenceTriggerRule, TargetEntityType,
    TriggerExecution, TriggerType,
};

use crate::calculator::ScheduleCalculator;
use crate::dates::{add_frequency_interval, format_due_date};
use crate::holidays::HolidayCalendar;

/// Default number of rules fetched per batch.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Default polling interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Input for one executor invocation, as delivered by the job queue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerExecutorInput {
    /// Restrict the batch to one company.
    pub company_id: Option<Uuid>,
    /// Override the configured batch size.
    pub batch_size: Option<i64>,
}

/// Statistics from one executor run.
#[derive(Debug, Clone, Default)]
pub struct TriggerExecutorStats {
    /// Rules examined.
    pub processed: usize,
    /// Rules that fired and created their target entity.
    pub fired: usize,
    /// Rules skipped (conditional, not yet due, no matching event,
    /// or already fired today).
    pub skipped: usize,
    /// Rules whose firing attempt failed.
    pub failed: usize,
}

impl TriggerExecutorStats {
    /// Merge stats from another run.
    pub fn merge(&mut self, other: &TriggerExecutorStats) {
        self.processed += other.processed;
        self.fired += other.fired;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Errors from the executor job.
#[derive(Debug, thiserror::Error)]
pub enum TriggerExecutorJobError {
    /// The initial due-rule query failed; the whole run aborts and the job
    /// framework's retry policy takes over.
    #[error("Database error: {0}")]
    Database(String),

    /// A single rule failed to process. Caught per rule and recorded as a
    /// failed execution; never aborts the batch.
    #[error("Processing error: {0}")]
    Processing(String),
}

/// Entity fields seeded from a rule's `template_data`. Missing dates
/// default to today.
#[derive(Debug, Clone, Deserialize)]
struct EntityTemplate {
    obligation_id: Uuid,
    frequency: Option<String>,
    base_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    schedule_id: Option<Uuid>,
    #[serde(default)]
    grace_period_days: i64,
    #[serde(default)]
    adjust_for_business_days: bool,
    compliance_period_start: Option<NaiveDate>,
    compliance_period_end: Option<NaiveDate>,
}

enum RuleOutcome {
    Fired { entity_id: Uuid, due_date: NaiveDate },
    Skipped(&'static str),
}

/// The periodic batch executor for recurrence trigger rules.
pub struct TriggerExecutorJob {
    pool: PgPool,
    calendar: Arc<dyn HolidayCalendar>,
    batch_size: i64,
    today: Option<NaiveDate>,
}

impl TriggerExecutorJob {
    /// Create a new executor job.
    pub fn new(pool: PgPool, calendar: Arc<dyn HolidayCalendar>) -> Self {
        Self {
            pool,
            calendar,
            batch_size: DEFAULT_BATCH_SIZE,
            today: None,
        }
    }

    /// Create with custom batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
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

    /// Run one batch.
    ///
    /// Rules are processed sequentially, earliest due first. Per-rule
    /// failures are recorded as failed execution audit rows and counted;
    /// only the initial query failure propagates.
    #[instrument(skip(self))]
    pub async fn run(
        &self,
        input: &TriggerExecutorInput,
    ) -> Result<TriggerExecutorStats, TriggerExecutorJobError> {
        let today = self.today();
        let batch_size = input.batch_size.unwrap_or(self.batch_size).max(1);
        let mut stats = TriggerExecutorStats::default();

        let rules =
            RecurrenceTriggerRule::list_due(&self.pool, today, input.company_id, batch_size)
                .await
                .map_err(|e| TriggerExecutorJobError::Database(e.to_string()))?;

        if rules.is_empty() {
            debug!("No due trigger rules");
            return Ok(stats);
        }

        info!(count = rules.len(), "Processing due trigger rules");

        for rule in rules {
            stats.processed += 1;

            match self.process_rule(&rule, today).await {
                Ok(RuleOutcome::Fired { entity_id, due_date }) => {
                    stats.fired += 1;
                    info!(
                        rule_id = %rule.id,
                        company_id = %rule.company_id,
                        entity_id = %entity_id,
                        due_date = %due_date,
                        "Trigger rule fired"
                    );
                }
                Ok(RuleOutcome::Skipped(reason)) => {
                    stats.skipped += 1;
                    debug!(rule_id = %rule.id, reason, "Trigger rule skipped");
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(rule_id = %rule.id, error = %e, "Trigger rule failed");
                    self.record_failure(&rule, today, &e).await;
                }
            }
        }

        info!(
            processed = stats.processed,
            fired = stats.fired,
            skipped = stats.skipped,
            failed = stats.failed,
            "Trigger executor run complete"
        );

        Ok(stats)
    }

    /// Process a single rule: evaluate its firing condition, create the
    /// target entity, record the audit row, and reschedule.
    async fn process_rule(
        &self,
        rule: &RecurrenceTriggerRule,
        today: NaiveDate,
    ) -> Result<RuleOutcome, TriggerExecutorJobError> {
        if !self.should_fire(rule, today).await? {
            return Ok(RuleOutcome::Skipped(match rule.trigger_type {
                TriggerType::Conditional => "conditional rules are externally evaluated",
                TriggerType::EventBased => "no matching event since last execution",
                TriggerType::Scheduled => "not yet due",
            }));
        }

        // Duplicate-fire guard: a success row already exists for this rule
        // and date when a previous run crashed between entity creation and
        // reschedule, or when overlapping invocations race.
        let already_fired = TriggerExecution::succeeded_on(&self.pool, rule.id, today)
            .await
            .map_err(|e| TriggerExecutorJobError::Processing(e.to_string()))?;
        if already_fired {
            return Ok(RuleOutcome::Skipped("already fired today"));
        }

        let (entity_id, due_date) = self.create_target_entity(rule, today).await?;

        let detail = json!({
            "target_entity_type": rule.target_entity_type,
            "entity_id": entity_id,
            "due_date": format_due_date(due_date),
        });
        let recorded = TriggerExecution::record(
            &self.pool,
            rule.company_id,
            rule.id,
            today,
            ExecutionResult::Success,
            detail,
        )
        .await
        .map_err(|e| TriggerExecutorJobError::Processing(e.to_string()))?;
        if recorded.is_none() {
            debug!(rule_id = %rule.id, "Concurrent run recorded this execution first");
        }

        let next_execution =
            next_execution_after_fire(rule.trigger_type, today, rule.configured_frequency())
                .map_err(|e| TriggerExecutorJobError::Processing(e.to_string()))?;

        RecurrenceTriggerRule::record_fired(&self.pool, rule.company_id, rule.id, next_execution)
            .await
            .map_err(|e| TriggerExecutorJobError::Processing(e.to_string()))?;

        Ok(RuleOutcome::Fired { entity_id, due_date })
    }

    /// Evaluate a rule's firing condition.
    async fn should_fire(
        &self,
        rule: &RecurrenceTriggerRule,
        today: NaiveDate,
    ) -> Result<bool, TriggerExecutorJobError> {
        match rule.trigger_type {
            TriggerType::Scheduled => Ok(rule.next_execution_date <= today),
            TriggerType::EventBased => {
                let Some(event_type) = rule.trigger_expression.as_deref() else {
                    warn!(rule_id = %rule.id, "Event-based rule has no trigger expression");
                    return Ok(false);
                };
                let count = ComplianceEvent::count_matching_since(
                    &self.pool,
                    rule.company_id,
                    event_type,
                    rule.last_executed_at,
                )
                .await
                .map_err(|e| TriggerExecutorJobError::Processing(e.to_string()))?;
                Ok(count > 0)
            }
            // Owned by the separate condition-evaluation process.
            TriggerType::Conditional => Ok(false),
        }
    }

    /// Create the rule's target entity from its template data.
    async fn create_target_entity(
        &self,
        rule: &RecurrenceTriggerRule,
        today: NaiveDate,
    ) -> Result<(Uuid, NaiveDate), TriggerExecutorJobError> {
        let template: EntityTemplate = serde_json::from_value(rule.template_data.clone())
            .map_err(|e| TriggerExecutorJobError::Processing(format!("invalid template: {e}")))?;

        let frequency = match template.frequency.as_deref() {
            Some(descriptor) => ObligationFrequency::parse(descriptor).ok_or_else(|| {
                TriggerExecutorJobError::Processing(format!("invalid frequency: {descriptor}"))
            })?,
            None => rule.configured_frequency(),
        };

        let base_date = template.base_date.unwrap_or(today);
        let calculator = ScheduleCalculator::new(self.calendar.as_ref()).with_today(today);

        let due_date = match template.due_date {
            Some(due) => due,
            None => calculator
                .calculate_next_due_date(
                    frequency,
                    base_date,
                    None,
                    template.adjust_for_business_days,
                    template.grace_period_days,
                )
                .map_err(|e| TriggerExecutorJobError::Processing(e.to_string()))?,
        };

        match rule.target_entity_type {
            TargetEntityType::Schedule => {
                let schedule = ObligationSchedule::create(
                    &self.pool,
                    rule.company_id,
                    CreateSchedule {
                        obligation_id: template.obligation_id,
                        frequency,
                        base_date,
                        next_due_date: due_date,
                    },
                )
                .await
                .map_err(|e| TriggerExecutorJobError::Processing(e.to_string()))?;
                Ok((schedule.id, due_date))
            }
            TargetEntityType::Deadline => {
                let deadline = ComplianceDeadline::create(
                    &self.pool,
                    rule.company_id,
                    CreateDeadline {
                        obligation_id: template.obligation_id,
                        schedule_id: template.schedule_id,
                        due_date,
                        compliance_period_start: template.compliance_period_start,
                        compliance_period_end: template.compliance_period_end,
                    },
                )
                .await
                .map_err(|e| TriggerExecutorJobError::Processing(e.to_string()))?;
                Ok((deadline.id, due_date))
            }
        }
    }

    /// Record a failed execution. Failures here are logged and swallowed so
    /// audit problems cannot cascade into the batch.
    async fn record_failure(
        &self,
        rule: &RecurrenceTriggerRule,
        today: NaiveDate,
        error: &TriggerExecutorJobError,
    ) {
        let detail = json!({ "error": error.to_string() });
        if let Err(e) = TriggerExecution::record(
            &self.pool,
            rule.company_id,
            rule.id,
            today,
            ExecutionResult::Failed,
            detail,
        )
        .await
        {
            warn!(rule_id = %rule.id, error = %e, "Failed to record execution failure");
        }
    }
}

/// When a fired rule runs next. Scheduled rules reschedule by elapsed time
/// from the fire date; event-based and conditional rules are re-armed
/// externally and keep their `next_execution_date` (`None`).
fn next_execution_after_fire(
    trigger_type: TriggerType,
    fired_on: NaiveDate,
    frequency: ObligationFrequency,
) -> crate::error::Result<Option<NaiveDate>> {
    match trigger_type {
        TriggerType::Scheduled => Ok(Some(add_frequency_interval(fired_on, frequency)?)),
        TriggerType::EventBased | TriggerType::Conditional => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_BATCH_SIZE, 50);
        assert_eq!(DEFAULT_POLL_INTERVAL_SECS, 300);
    }

    #[test]
    fn test_stats_merge() {
        let mut a = TriggerExecutorStats {
            processed: 5,
            fired: 3,
            skipped: 1,
            failed: 1,
        };
        let b = TriggerExecutorStats {
            processed: 2,
            fired: 2,
            skipped: 0,
            failed: 0,
        };
        a.merge(&b);
        assert_eq!(a.processed, 7);
        assert_eq!(a.fired, 5);
        assert_eq!(a.skipped, 1);
        assert_eq!(a.failed, 1);
    }

    #[test]
    fn test_input_deserializes_from_queue_payload() {
        let input: TriggerExecutorInput =
            serde_json::from_str(r#"{"batch_size": 10}"#).unwrap();
        assert_eq!(input.batch_size, Some(10));
        assert!(input.company_id.is_none());

        let input: TriggerExecutorInput = serde_json::from_str("{}").unwrap();
        assert!(input.batch_size.is_none());
    }

    #[test]
    fn test_entity_template_defaults() {
        let template: EntityTemplate = serde_json::from_value(json!({
            "obligation_id": "1f4a1c2e-0000-4000-8000-000000000001"
        }))
        .unwrap();
        assert!(template.base_date.is_none());
        assert!(template.due_date.is_none());
        assert_eq!(template.grace_period_days, 0);
        assert!(!template.adjust_for_business_days);
    }

    #[test]
    fn test_entity_template_full_payload() {
        let template: EntityTemplate = serde_json::from_value(json!({
            "obligation_id": "1f4a1c2e-0000-4000-8000-000000000001",
            "frequency": "weekly",
            "base_date": "2026-03-01",
            "grace_period_days": 5,
            "adjust_for_business_days": true,
            "compliance_period_start": "2026-03-01",
            "compliance_period_end": "2026-03-31"
        }))
        .unwrap();
        assert_eq!(template.frequency.as_deref(), Some("weekly"));
        assert_eq!(template.grace_period_days, 5);
        assert!(template.adjust_for_business_days);
    }

    #[test]
    fn test_scheduled_rule_reschedules_by_frequency() {
        let fired_on = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let next =
            next_execution_after_fire(TriggerType::Scheduled, fired_on, ObligationFrequency::Weekly)
                .unwrap();
        assert_eq!(next, NaiveDate::from_ymd_opt(2026, 3, 9));

        let next = next_execution_after_fire(
            TriggerType::Scheduled,
            fired_on,
            ObligationFrequency::Monthly,
        )
        .unwrap();
        assert_eq!(next, NaiveDate::from_ymd_opt(2026, 4, 2));
    }

    #[test]
    fn test_externally_armed_rules_keep_their_date() {
        let fired_on = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        for trigger_type in [TriggerType::EventBased, TriggerType::Conditional] {
            let next =
                next_execution_after_fire(trigger_type, fired_on, ObligationFrequency::Weekly)
                    .unwrap();
            assert!(next.is_none());
        }
    }

    #[test]
    fn test_job_error_display() {
        let err = TriggerExecutorJobError::Processing("template parse".to_string());
        assert!(err.to_string().contains("template parse"));

        let db = TriggerExecutorJobError::Database("connection refused".to_string());
        assert!(db.to_string().contains("connection refused"));
    }
}
