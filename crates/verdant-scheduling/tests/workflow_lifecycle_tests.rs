//! Database-backed integration tests for escalation workflow lifecycle.
//!
//! Require a PostgreSQL instance:
//!
//! ```sh
//! DATABASE_URL=postgres://... cargo test -p verdant-scheduling --features integration
//! ```

#![cfg(feature = "integration")]

use uuid::Uuid;

use verdant_db::models::CreateEscalationWorkflow;
use verdant_db::{run_migrations, DbPool};
use verdant_scheduling::{EscalationWorkflowService, SchedulingError};

async fn test_pool() -> DbPool {
    let url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    let pool = DbPool::connect(&url).await.expect("failed to connect");
    run_migrations(&pool).await.expect("failed to migrate");
    pool
}

fn workflow_input(name: &str, category: Option<&str>, days: [i32; 4]) -> CreateEscalationWorkflow {
    CreateEscalationWorkflow {
        name: name.to_string(),
        obligation_category: category.map(str::to_string),
        level_days: days,
        level_recipients: [vec![Uuid::new_v4()], Vec::new(), Vec::new(), Vec::new()],
    }
}

#[tokio::test]
async fn creating_a_workflow_replaces_the_active_one_in_its_scope() {
    let pool = test_pool().await;
    let service = EscalationWorkflowService::new(pool.inner().clone());
    let company_id = Uuid::new_v4();

    let first = service
        .create_workflow(
            company_id,
            workflow_input("Initial policy", Some("waste"), [1, 3, 7, 14]),
        )
        .await
        .expect("first workflow must create");

    // Replacing the scope's active workflow must not trip the active-scope
    // unique index; the old row is retired in the same transaction.
    let second = service
        .create_workflow(
            company_id,
            workflow_input("Tightened policy", Some("waste"), [2, 5, 9, 20]),
        )
        .await
        .expect("replacement workflow must create");
    assert_ne!(first.id, second.id);

    let matched = service
        .match_workflow(company_id, Some("waste"))
        .await
        .unwrap()
        .expect("scope must have an active workflow");
    assert_eq!(matched.id, second.id);

    // The scope holds exactly one active workflow afterwards.
    let conflicts = service.check_scope_integrity(company_id).await.unwrap();
    assert!(conflicts.is_empty());
}

#[tokio::test]
async fn company_default_scope_replaces_independently_of_categories() {
    let pool = test_pool().await;
    let service = EscalationWorkflowService::new(pool.inner().clone());
    let company_id = Uuid::new_v4();

    let categorized = service
        .create_workflow(
            company_id,
            workflow_input("Waste policy", Some("waste"), [1, 3, 7, 14]),
        )
        .await
        .unwrap();

    service
        .create_workflow(
            company_id,
            workflow_input("Default policy", None, [1, 3, 7, 14]),
        )
        .await
        .unwrap();
    let replacement_default = service
        .create_workflow(
            company_id,
            workflow_input("Default policy v2", None, [2, 4, 8, 16]),
        )
        .await
        .expect("default replacement must create");

    // Replacing the company default leaves category scopes untouched.
    let waste = service
        .match_workflow(company_id, Some("waste"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(waste.id, categorized.id);

    let default = service.match_workflow(company_id, None).await.unwrap().unwrap();
    assert_eq!(default.id, replacement_default.id);
}

#[tokio::test]
async fn deactivating_a_workflow_falls_back_to_the_system_default() {
    let pool = test_pool().await;
    let service = EscalationWorkflowService::new(pool.inner().clone());
    let company_id = Uuid::new_v4();

    let workflow = service
        .create_workflow(
            company_id,
            workflow_input("Only policy", Some("air"), [1, 3, 7, 14]),
        )
        .await
        .unwrap();
    service
        .deactivate_workflow(company_id, workflow.id)
        .await
        .unwrap();

    let (thresholds, workflow_id) = service
        .resolve_thresholds(company_id, Some("air"))
        .await
        .unwrap();
    assert!(workflow_id.is_none());
    assert_eq!(thresholds.level_days, [1, 3, 7, 14]);
}

#[tokio::test]
async fn empty_category_is_rejected_before_any_write() {
    let pool = test_pool().await;
    let service = EscalationWorkflowService::new(pool.inner().clone());
    let company_id = Uuid::new_v4();

    let err = service
        .create_workflow(
            company_id,
            workflow_input("Ambiguous scope", Some(""), [1, 3, 7, 14]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));

    // Nothing was stored; the company still has no workflow at all.
    assert!(service.match_workflow(company_id, None).await.unwrap().is_none());
}
