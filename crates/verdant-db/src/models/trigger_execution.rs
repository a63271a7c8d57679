//! Trigger execution audit model.
//!
//! An immutable, append-only record of one firing attempt. A partial unique
//! index on `(trigger_rule_id, execution_date) WHERE result = 'success'`
//! doubles as the duplicate-fire guard: a rule fires at most once per
//! execution date, while failed attempts may retry the same day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::ExecutionResult;

/// One firing attempt of a trigger rule.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TriggerExecution {
    /// Unique identifier for the execution record.
    pub id: Uuid,

    /// The company the rule belongs to.
    pub company_id: Uuid,

    /// The rule that fired.
    pub trigger_rule_id: Uuid,

    /// The day the firing was attempted.
    pub execution_date: NaiveDate,

    /// Whether the attempt succeeded.
    pub result: ExecutionResult,

    /// What was created, or why the attempt failed.
    pub detail: serde_json::Value,

    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

impl TriggerExecution {
    /// Append an execution record.
    ///
    /// Success rows conflict with an existing success for the same rule and
    /// date; the conflicting insert is dropped and `None` returned, which
    /// callers treat as "already fired today".
    pub async fn record(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        trigger_rule_id: Uuid,
        execution_date: NaiveDate,
        result: ExecutionResult,
        detail: serde_json::Value,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO trigger_executions (
                company_id, trigger_rule_id, execution_date, result, detail
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (trigger_rule_id, execution_date) WHERE result = 'success'
            DO NOTHING
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(trigger_rule_id)
        .bind(execution_date)
        .bind(result)
        .bind(&detail)
        .fetch_optional(pool)
        .await
    }

    /// Whether a success record already exists for a rule on a date.
    pub async fn succeeded_on(
        pool: &sqlx::PgPool,
        trigger_rule_id: Uuid,
        execution_date: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM trigger_executions
            WHERE trigger_rule_id = $1 AND execution_date = $2 AND result = 'success'
            "#,
        )
        .bind(trigger_rule_id)
        .bind(execution_date)
        .fetch_one(pool)
        .await?;

        Ok(count > 0)
    }

    /// Execution history for a rule, newest first.
    pub async fn list_by_rule(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        trigger_rule_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM trigger_executions
            WHERE company_id = $1 AND trigger_rule_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(company_id)
        .bind(trigger_rule_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
