//! Compliance deadline model.
//!
//! One concrete due-date instance generated from a schedule. Many deadlines
//! accumulate per schedule over time, one per recurrence.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::DeadlineStatus;

/// A single concrete due-date instance for an obligation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ComplianceDeadline {
    /// Unique identifier for the deadline.
    pub id: Uuid,

    /// The company this deadline belongs to.
    pub company_id: Uuid,

    /// The obligation this deadline is an instance of.
    pub obligation_id: Uuid,

    /// The schedule that generated this deadline, if any.
    pub schedule_id: Option<Uuid>,

    /// The due date.
    pub due_date: NaiveDate,

    /// Lifecycle status.
    pub status: DeadlineStatus,

    /// Start of the compliance period this deadline covers.
    pub compliance_period_start: Option<NaiveDate>,

    /// End of the compliance period this deadline covers.
    pub compliance_period_end: Option<NaiveDate>,

    /// When the deadline was created.
    pub created_at: DateTime<Utc>,

    /// When the deadline was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeadline {
    pub obligation_id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub due_date: NaiveDate,
    pub compliance_period_start: Option<NaiveDate>,
    pub compliance_period_end: Option<NaiveDate>,
}

impl ComplianceDeadline {
    /// Find a deadline by ID within a company.
    pub async fn find_by_id(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM compliance_deadlines
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    /// Create a new pending deadline.
    pub async fn create(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        input: CreateDeadline,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO compliance_deadlines (
                company_id, obligation_id, schedule_id, due_date,
                status, compliance_period_start, compliance_period_end
            )
            VALUES ($1, $2, $3, $4, 'pending', $5, $6)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(input.obligation_id)
        .bind(input.schedule_id)
        .bind(input.due_date)
        .bind(input.compliance_period_start)
        .bind(input.compliance_period_end)
        .fetch_one(pool)
        .await
    }

    /// Mark a pending deadline completed. Returns the updated row, or `None`
    /// if the deadline was not pending.
    pub async fn mark_completed(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE compliance_deadlines
            SET status = 'completed', updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }
}
