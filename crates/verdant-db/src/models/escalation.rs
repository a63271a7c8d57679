//! Escalation model.
//!
//! A record of an obligation's escalation state. History is an append-only
//! chain: each level increase inserts a new row back-referencing the row it
//! superseded via `previous_escalation_id`; prior rows are never mutated
//! except when the whole chain is resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One link in an obligation's escalation chain.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Escalation {
    /// Unique identifier for the escalation record.
    pub id: Uuid,

    /// The company this escalation belongs to.
    pub company_id: Uuid,

    /// Optional site scope inherited from the obligation.
    pub site_id: Option<Uuid>,

    /// The obligation being escalated. Escalation is keyed by obligation,
    /// not by deadline, because obligations are the durable unit across
    /// deadline instances.
    pub obligation_id: Uuid,

    /// Escalation level this record represents (1..=4).
    pub current_level: i32,

    /// Primary recipient notified for this level.
    pub escalated_to: Option<Uuid>,

    /// Days overdue at the time of escalation.
    pub days_overdue: i32,

    /// When this level was reached.
    pub escalated_at: DateTime<Utc>,

    /// When the chain was resolved; `None` while active.
    pub resolved_at: Option<DateTime<Utc>>,

    /// Back-reference to the record this one superseded.
    pub previous_escalation_id: Option<Uuid>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new escalation record.
#[derive(Debug, Clone)]
pub struct NewEscalation {
    pub obligation_id: Uuid,
    pub site_id: Option<Uuid>,
    pub level: i32,
    pub escalated_to: Option<Uuid>,
    pub days_overdue: i32,
    pub previous_escalation_id: Option<Uuid>,
}

impl Escalation {
    /// The most recent unresolved escalation for an obligation, if any.
    /// Its `current_level` is the obligation's current escalation level;
    /// no row means level 0.
    pub async fn find_current_unresolved(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        obligation_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM escalations
            WHERE company_id = $1 AND obligation_id = $2 AND resolved_at IS NULL
            ORDER BY escalated_at DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(company_id)
        .bind(obligation_id)
        .fetch_optional(pool)
        .await
    }

    /// Insert a new escalation record only if it strictly advances the
    /// obligation's level.
    ///
    /// The guard runs inside the insert statement, so two concurrent
    /// evaluations of the same obligation cannot both advance past the same
    /// level: the second insert finds an unresolved row at (or above) the
    /// requested level and inserts nothing. Returns `None` in that case.
    pub async fn create_if_advances(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        input: NewEscalation,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO escalations (
                company_id, site_id, obligation_id, current_level,
                escalated_to, days_overdue, previous_escalation_id
            )
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE NOT EXISTS (
                SELECT 1 FROM escalations
                WHERE company_id = $1
                  AND obligation_id = $3
                  AND resolved_at IS NULL
                  AND current_level >= $4
            )
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(input.site_id)
        .bind(input.obligation_id)
        .bind(input.level)
        .bind(input.escalated_to)
        .bind(input.days_overdue)
        .bind(input.previous_escalation_id)
        .fetch_optional(pool)
        .await
    }

    /// Resolve every open escalation in an obligation's chain.
    /// Returns the number of rows resolved.
    pub async fn resolve_for_obligation(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        obligation_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE escalations
            SET resolved_at = NOW()
            WHERE company_id = $1 AND obligation_id = $2 AND resolved_at IS NULL
            "#,
        )
        .bind(company_id)
        .bind(obligation_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Full escalation history for an obligation, oldest first.
    pub async fn list_history(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        obligation_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM escalations
            WHERE company_id = $1 AND obligation_id = $2
            ORDER BY escalated_at ASC, created_at ASC
            "#,
        )
        .bind(company_id)
        .bind(obligation_id)
        .fetch_all(pool)
        .await
    }
}
