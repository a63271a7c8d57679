//! Escalation workflow model.
//!
//! A per-company (optionally per-obligation-category) policy mapping
//! overdue-day thresholds to escalation levels and recipient lists.
//! At most one active workflow exists per (company, category) scope; a
//! partial unique index backs the invariant and `create_replacing`
//! enforces it on writes by retiring competitors in the same transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A configurable escalation policy for overdue obligations.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EscalationWorkflow {
    /// Unique identifier for the workflow.
    pub id: Uuid,

    /// The company this workflow belongs to.
    pub company_id: Uuid,

    /// Obligation category this workflow is scoped to.
    /// `None` marks the company-wide default.
    pub obligation_category: Option<String>,

    /// Workflow name.
    pub name: String,

    /// Days overdue before level 1 is reached.
    pub level_1_days: i32,
    /// Days overdue before level 2 is reached.
    pub level_2_days: i32,
    /// Days overdue before level 3 is reached.
    pub level_3_days: i32,
    /// Days overdue before level 4 is reached.
    pub level_4_days: i32,

    /// Recipient user IDs notified at level 1.
    pub level_1_recipients: Vec<Uuid>,
    /// Recipient user IDs notified at level 2.
    pub level_2_recipients: Vec<Uuid>,
    /// Recipient user IDs notified at level 3.
    pub level_3_recipients: Vec<Uuid>,
    /// Recipient user IDs notified at level 4.
    pub level_4_recipients: Vec<Uuid>,

    /// Whether the workflow is active (soft-deactivated otherwise).
    pub is_active: bool,

    /// When the workflow was created.
    pub created_at: DateTime<Utc>,

    /// When the workflow was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new escalation workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEscalationWorkflow {
    pub name: String,
    pub obligation_category: Option<String>,
    pub level_days: [i32; 4],
    pub level_recipients: [Vec<Uuid>; 4],
}

/// A (company, category) scope holding more than one active workflow.
///
/// Surfaced by the scope-integrity health check; the matcher resolves the
/// ambiguity deterministically but never repairs it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowScopeConflict {
    pub company_id: Uuid,
    pub obligation_category: Option<String>,
    pub active_count: i64,
}

impl EscalationWorkflow {
    /// Active workflows scoped to an exact company+category pair, most
    /// recent first. More than one row signals a configuration-integrity
    /// violation.
    pub async fn find_active_for_category(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        category: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM escalation_workflows
            WHERE company_id = $1 AND obligation_category = $2 AND is_active = true
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(category)
        .fetch_all(pool)
        .await
    }

    /// Active company-default workflows (null category), most recent first.
    pub async fn find_active_default(
        pool: &sqlx::PgPool,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM escalation_workflows
            WHERE company_id = $1 AND obligation_category IS NULL AND is_active = true
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
    }

    /// Create a new workflow, retiring any active workflow in the same
    /// (company, category) scope first. Both statements run in one
    /// transaction so the partial unique index on active scopes never sees
    /// two active rows, and a failed insert leaves the old workflow intact.
    /// Returns the new row and the number of workflows deactivated.
    pub async fn create_replacing(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        input: CreateEscalationWorkflow,
    ) -> Result<(Self, u64), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let deactivated = sqlx::query(
            r#"
            UPDATE escalation_workflows
            SET is_active = false, updated_at = NOW()
            WHERE company_id = $1
              AND obligation_category IS NOT DISTINCT FROM $2
              AND is_active = true
            "#,
        )
        .bind(company_id)
        .bind(&input.obligation_category)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let workflow: Self = sqlx::query_as(
            r#"
            INSERT INTO escalation_workflows (
                company_id, obligation_category, name,
                level_1_days, level_2_days, level_3_days, level_4_days,
                level_1_recipients, level_2_recipients, level_3_recipients, level_4_recipients
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(&input.obligation_category)
        .bind(&input.name)
        .bind(input.level_days[0])
        .bind(input.level_days[1])
        .bind(input.level_days[2])
        .bind(input.level_days[3])
        .bind(&input.level_recipients[0])
        .bind(&input.level_recipients[1])
        .bind(&input.level_recipients[2])
        .bind(&input.level_recipients[3])
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((workflow, deactivated))
    }

    /// Soft-deactivate a workflow.
    pub async fn deactivate(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE escalation_workflows
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

    /// Scopes within a company holding more than one active workflow.
    pub async fn find_scope_conflicts(
        pool: &sqlx::PgPool,
        company_id: Uuid,
    ) -> Result<Vec<WorkflowScopeConflict>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT company_id, obligation_category, COUNT(*) AS active_count
            FROM escalation_workflows
            WHERE company_id = $1 AND is_active = true
            GROUP BY company_id, obligation_category
            HAVING COUNT(*) > 1
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
    }

    /// Day threshold for a level (1..=4).
    #[must_use]
    pub fn level_days(&self, level: i32) -> Option<i32> {
        match level {
            1 => Some(self.level_1_days),
            2 => Some(self.level_2_days),
            3 => Some(self.level_3_days),
            4 => Some(self.level_4_days),
            _ => None,
        }
    }

    /// Recipient list for a level (1..=4).
    #[must_use]
    pub fn level_recipients(&self, level: i32) -> Option<&[Uuid]> {
        match level {
            1 => Some(&self.level_1_recipients),
            2 => Some(&self.level_2_recipients),
            3 => Some(&self.level_3_recipients),
            4 => Some(&self.level_4_recipients),
            _ => None,
        }
    }
}
