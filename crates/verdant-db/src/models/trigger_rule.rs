//! Recurrence trigger rule model.
//!
//! A schedulable unit that, on a cadence or an event, creates new schedule
//! or deadline rows. Execution bookkeeping is mutated only by the trigger
//! executor job; definition changes come from rule-management routes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{ObligationFrequency, TargetEntityType, TriggerType};

/// A rule describing when and what to create.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RecurrenceTriggerRule {
    /// Unique identifier for the rule.
    pub id: Uuid,

    /// The company this rule belongs to.
    pub company_id: Uuid,

    /// Rule name.
    pub name: String,

    /// How the rule decides to fire.
    pub trigger_type: TriggerType,

    /// Event name (event-based rules) or condition string (conditional rules).
    pub trigger_expression: Option<String>,

    /// What kind of entity the rule creates.
    pub target_entity_type: TargetEntityType,

    /// Fields used to seed the created entity.
    pub template_data: serde_json::Value,

    /// Frequency and other execution parameters.
    pub rule_config: serde_json::Value,

    /// When the rule is next eligible to fire.
    pub next_execution_date: NaiveDate,

    /// When the rule last fired successfully.
    pub last_executed_at: Option<DateTime<Utc>>,

    /// Number of successful firings.
    pub execution_count: i32,

    /// Whether the rule is active.
    pub is_active: bool,

    /// When the rule was created.
    pub created_at: DateTime<Utc>,

    /// When the rule was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new trigger rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTriggerRule {
    pub name: String,
    pub trigger_type: TriggerType,
    pub trigger_expression: Option<String>,
    pub target_entity_type: TargetEntityType,
    pub template_data: serde_json::Value,
    pub rule_config: serde_json::Value,
    pub next_execution_date: NaiveDate,
}

impl RecurrenceTriggerRule {
    /// Find a rule by ID within a company.
    pub async fn find_by_id(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM recurrence_trigger_rules
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    /// Active rules whose next execution date has arrived, earliest due
    /// first so backlog is processed fairly. Optionally scoped to one
    /// company and capped at `limit` rows.
    pub async fn list_due(
        pool: &sqlx::PgPool,
        as_of: NaiveDate,
        company_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM recurrence_trigger_rules
            WHERE is_active = true
              AND next_execution_date <= $1
              AND ($2::uuid IS NULL OR company_id = $2)
            ORDER BY next_execution_date ASC
            LIMIT $3
            "#,
        )
        .bind(as_of)
        .bind(company_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Create a new active rule.
    pub async fn create(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        input: CreateTriggerRule,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO recurrence_trigger_rules (
                company_id, name, trigger_type, trigger_expression,
                target_entity_type, template_data, rule_config, next_execution_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(&input.name)
        .bind(input.trigger_type)
        .bind(&input.trigger_expression)
        .bind(input.target_entity_type)
        .bind(&input.template_data)
        .bind(&input.rule_config)
        .bind(input.next_execution_date)
        .fetch_one(pool)
        .await
    }

    /// Record a successful firing: bump `execution_count`, stamp
    /// `last_executed_at`, and advance `next_execution_date` when the rule
    /// reschedules by elapsed time (`None` leaves it unchanged, for rules
    /// re-armed by external event or condition logic).
    pub async fn record_fired(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        id: Uuid,
        next_execution_date: Option<NaiveDate>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE recurrence_trigger_rules
            SET execution_count = execution_count + 1,
                last_executed_at = NOW(),
                next_execution_date = COALESCE($3, next_execution_date),
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(next_execution_date)
        .fetch_optional(pool)
        .await
    }

    /// Soft-deactivate a rule.
    pub async fn deactivate(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE recurrence_trigger_rules
            SET is_active = false, updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND is_active = true
            "#,
        )
        .bind(id)
        .bind(company_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Frequency configured in `rule_config`, defaulting to monthly when
    /// unspecified or unparseable.
    #[must_use]
    pub fn configured_frequency(&self) -> ObligationFrequency {
        self.rule_config
            .get("frequency")
            .and_then(serde_json::Value::as_str)
            .and_then(ObligationFrequency::parse)
            .unwrap_or(ObligationFrequency::Monthly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_rule(rule_config: serde_json::Value) -> RecurrenceTriggerRule {
        RecurrenceTriggerRule {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            name: "Monthly discharge deadline".to_string(),
            trigger_type: TriggerType::Scheduled,
            trigger_expression: None,
            target_entity_type: TargetEntityType::Deadline,
            template_data: json!({}),
            rule_config,
            next_execution_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            last_executed_at: None,
            execution_count: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_configured_frequency_explicit() {
        let rule = sample_rule(json!({ "frequency": "weekly" }));
        assert_eq!(rule.configured_frequency(), ObligationFrequency::Weekly);
    }

    #[test]
    fn test_configured_frequency_defaults_to_monthly() {
        let rule = sample_rule(json!({}));
        assert_eq!(rule.configured_frequency(), ObligationFrequency::Monthly);

        let rule = sample_rule(json!({ "frequency": "whenever" }));
        assert_eq!(rule.configured_frequency(), ObligationFrequency::Monthly);
    }
}
