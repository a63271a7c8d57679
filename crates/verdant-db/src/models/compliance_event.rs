//! Compliance event model.
//!
//! Domain events recorded by the wider platform (document ingested, evidence
//! uploaded, permit issued). Event-based trigger rules fire when at least one
//! matching event occurred since the rule's last execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A recorded domain event.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ComplianceEvent {
    /// Unique identifier for the event.
    pub id: Uuid,

    /// The company the event belongs to.
    pub company_id: Uuid,

    /// Event type string matched against trigger expressions.
    pub event_type: String,

    /// Entity the event refers to, if any.
    pub entity_id: Option<Uuid>,

    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,

    /// Additional context.
    pub payload: serde_json::Value,
}

impl ComplianceEvent {
    /// Record a new event.
    pub async fn record(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        event_type: &str,
        entity_id: Option<Uuid>,
        payload: serde_json::Value,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO compliance_events (company_id, event_type, entity_id, payload)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(event_type)
        .bind(entity_id)
        .bind(&payload)
        .fetch_one(pool)
        .await
    }

    /// Count events of a type that occurred after `since` (or ever, when a
    /// rule has never executed).
    pub async fn count_matching_since(
        pool: &sqlx::PgPool,
        company_id: Uuid,
        event_type: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM compliance_events
            WHERE company_id = $1
              AND event_type = $2
              AND ($3::timestamptz IS NULL OR occurred_at > $3)
            "#,
        )
        .bind(company_id)
        .bind(event_type)
        .bind(since)
        .fetch_one(pool)
        .await
    }
}
