//! Obligation model.
//!
//! A compliance requirement tied to a company and optionally a site.
//! Obligations are never hard-deleted; a tombstone flag marks removal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::ObligationFrequency;

/// A compliance requirement an organization must fulfil.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Obligation {
    /// Unique identifier for the obligation.
    pub id: Uuid,

    /// The company this obligation belongs to.
    pub company_id: Uuid,

    /// Optional site the obligation is scoped to.
    pub site_id: Option<Uuid>,

    /// Short human-readable title.
    pub title: String,

    /// Free-form category used for escalation workflow matching.
    pub category: Option<String>,

    /// How often the obligation recurs.
    pub frequency: ObligationFrequency,

    /// The date recurrence is computed from.
    pub base_date: NaiveDate,

    /// Soft-delete tombstone.
    pub is_deleted: bool,

    /// When the obligation was created.
    pub created_at: DateTime<Utc>,

    /// When the obligation was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateObligation {
    pub title: String,
    pub site_id: Option<Uuid>,
    pub category: Option<String>,
    pub frequency: ObligationFrequency,
    pub base_date: NaiveDate,
}

impl Obligation {
    /// Find an obligation by ID within a company, excluding tombstoned rows.
    pub async fn find_by_id(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM obligations
            WHERE id = $1 AND company_id = $2 AND is_deleted = false
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    /// Create a new obligation.
    pub async fn create(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        input: CreateObligation,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO obligations (company_id, site_id, title, category, frequency, base_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(input.site_id)
        .bind(&input.title)
        .bind(&input.category)
        .bind(input.frequency)
        .bind(input.base_date)
        .fetch_one(pool)
        .await
    }

    /// Tombstone an obligation. Returns false if no live row matched.
    pub async fn soft_delete(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE obligations
            SET is_deleted = true, updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND is_deleted = false
            "#,
        )
        .bind(id)
        .bind(company_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_obligation_shape() {
        let input = CreateObligation {
            title: "Quarterly emissions report".to_string(),
            site_id: None,
            category: Some("air-quality".to_string()),
            frequency: ObligationFrequency::Quarterly,
            base_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        };

        assert_eq!(input.category.as_deref(), Some("air-quality"));
        assert!(input.frequency.has_recurrence());
    }
}
