//! Obligation schedule model.
//!
//! The recurrence definition derived from an obligation. An obligation has
//! zero or one active schedule at a time.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{ObligationFrequency, ScheduleStatus};

/// A recurrence schedule for an obligation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ObligationSchedule {
    /// Unique identifier for the schedule.
    pub id: Uuid,

    /// The company this schedule belongs to.
    pub company_id: Uuid,

    /// The obligation this schedule generates deadlines for.
    pub obligation_id: Uuid,

    /// How often deadlines are generated.
    pub frequency: ObligationFrequency,

    /// The date recurrence is computed from.
    pub base_date: NaiveDate,

    /// The next computed due date.
    pub next_due_date: NaiveDate,

    /// Lifecycle status.
    pub status: ScheduleStatus,

    /// When the schedule was created.
    pub created_at: DateTime<Utc>,

    /// When the schedule was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSchedule {
    pub obligation_id: Uuid,
    pub frequency: ObligationFrequency,
    pub base_date: NaiveDate,
    pub next_due_date: NaiveDate,
}

impl ObligationSchedule {
    /// Find the active schedule for an obligation, if any.
    pub async fn find_active_by_obligation(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        obligation_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM obligation_schedules
            WHERE company_id = $1 AND obligation_id = $2 AND status = 'active'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(company_id)
        .bind(obligation_id)
        .fetch_optional(pool)
        .await
    }

    /// Create a new schedule.
    pub async fn create(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        input: CreateSchedule,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO obligation_schedules (
                company_id, obligation_id, frequency, base_date, next_due_date, status
            )
            VALUES ($1, $2, $3, $4, $5, 'active')
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(input.obligation_id)
        .bind(input.frequency)
        .bind(input.base_date)
        .bind(input.next_due_date)
        .fetch_one(pool)
        .await
    }

    /// Advance the schedule to a new next due date.
    pub async fn advance(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        id: Uuid,
        next_due_date: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE obligation_schedules
            SET next_due_date = $3, updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(next_due_date)
        .fetch_optional(pool)
        .await
    }

    /// Move the schedule into a terminal status.
    pub async fn terminate(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        id: Uuid,
        status: ScheduleStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE obligation_schedules
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(status)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
