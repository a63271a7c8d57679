//! Escalation workflow matching.
//!
//! Resolves which escalation policy applies to an overdue obligation:
//! category-specific workflow first, then the company default, then the
//! fixed system fallback. Level determination from day thresholds lives
//! here as pure functions.

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use verdant_db::models::{CreateEscalationWorkflow, EscalationWorkflow, WorkflowScopeConflict};

use crate::error::{Result, SchedulingError};

/// System fallback thresholds applied when a company has no workflow
/// configured: level 1 at 1 day overdue, then 3, 7 and 14 days.
pub const SYSTEM_DEFAULT_LEVEL_DAYS: [i64; 4] = [1, 3, 7, 14];

/// Day thresholds and recipients for the four escalation levels,
/// independent of where the policy came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationThresholds {
    /// Days overdue at which each level (1..=4) is reached.
    pub level_days: [i64; 4],
    /// Recipient user IDs per level. Empty lists defer to role-based
    /// resolution downstream.
    pub level_recipients: [Vec<Uuid>; 4],
}

impl Default for EscalationThresholds {
    /// The system fallback policy: fixed thresholds, no static recipients.
    fn default() -> Self {
        Self {
            level_days: SYSTEM_DEFAULT_LEVEL_DAYS,
            level_recipients: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
        }
    }
}

impl EscalationThresholds {
    /// Lift a stored workflow row into threshold form.
    #[must_use]
    pub fn from_workflow(workflow: &EscalationWorkflow) -> Self {
        Self {
            level_days: [
                i64::from(workflow.level_1_days),
                i64::from(workflow.level_2_days),
                i64::from(workflow.level_3_days),
                i64::from(workflow.level_4_days),
            ],
            level_recipients: [
                workflow.level_1_recipients.clone(),
                workflow.level_2_recipients.clone(),
                workflow.level_3_recipients.clone(),
                workflow.level_4_recipients.clone(),
            ],
        }
    }

    /// Recipients for a level (1..=4); empty slice for level 0.
    #[must_use]
    pub fn recipients_for_level(&self, level: i32) -> &[Uuid] {
        match level {
            1..=4 => &self.level_recipients[(level - 1) as usize],
            _ => &[],
        }
    }
}

/// The highest escalation level whose threshold `days_overdue` has reached,
/// checked from level 4 downward; 0 when no threshold is met.
///
/// Thresholds are assumed strictly increasing; a misconfigured workflow
/// degrades to the first satisfied level found scanning downward.
#[must_use]
pub fn determine_escalation_level(days_overdue: i64, thresholds: &EscalationThresholds) -> i32 {
    for level in (1..=4).rev() {
        if days_overdue >= thresholds.level_days[(level - 1) as usize] {
            return level;
        }
    }
    0
}

/// Validate a workflow definition before it is stored.
///
/// Thresholds must be strictly increasing with level 1 at least one day
/// overdue. A category, when present, must be non-empty: the active-scope
/// unique index folds NULL and '' into the same scope key, so an
/// empty-string category would silently compete with the company default.
pub fn validate_workflow_input(input: &CreateEscalationWorkflow) -> Result<()> {
    let days = input.level_days;
    if !(days[0] < days[1] && days[1] < days[2] && days[2] < days[3]) {
        return Err(SchedulingError::Validation(format!(
            "escalation thresholds must be strictly increasing, got {days:?}"
        )));
    }
    if days[0] < 1 {
        return Err(SchedulingError::Validation(
            "level 1 threshold must be at least 1 day overdue".to_string(),
        ));
    }
    if let Some(category) = &input.obligation_category {
        if category.trim().is_empty() {
            return Err(SchedulingError::Validation(
                "obligation category must be non-empty; omit it for a company default".to_string(),
            ));
        }
    }
    Ok(())
}

/// Service for escalation workflow resolution and lifecycle.
pub struct EscalationWorkflowService {
    pool: PgPool,
}

impl EscalationWorkflowService {
    /// Create a new workflow service.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Resolve the workflow applying to an obligation.
    ///
    /// Priority order, first match wins: the company+category pair when a
    /// category is present, then the company default (null category), then
    /// `None` — callers fall back to [`EscalationThresholds::default`].
    ///
    /// More than one active match for a scope is a configuration-integrity
    /// violation: the most recent row is returned deterministically and the
    /// violation is logged for the health check to surface.
    pub async fn match_workflow(
        &self,
        company_id: Uuid,
        obligation_category: Option<&str>,
    ) -> Result<Option<EscalationWorkflow>> {
        if let Some(category) = obligation_category {
            let matches =
                EscalationWorkflow::find_active_for_category(&self.pool, company_id, category)
                    .await?;
            if let Some(workflow) = self.first_reporting_conflicts(company_id, matches) {
                return Ok(Some(workflow));
            }
        }

        let defaults = EscalationWorkflow::find_active_default(&self.pool, company_id).await?;
        Ok(self.first_reporting_conflicts(company_id, defaults))
    }

    /// Resolve the thresholds for an obligation, falling back to the system
    /// default policy when the company has no matching workflow.
    pub async fn resolve_thresholds(
        &self,
        company_id: Uuid,
        obligation_category: Option<&str>,
    ) -> Result<(EscalationThresholds, Option<Uuid>)> {
        match self.match_workflow(company_id, obligation_category).await? {
            Some(workflow) => Ok((EscalationThresholds::from_workflow(&workflow), Some(workflow.id))),
            None => Ok((EscalationThresholds::default(), None)),
        }
    }

    /// Create a workflow, enforcing the single-active-per-scope invariant.
    ///
    /// Any active workflow already holding the scope is retired in the same
    /// transaction as the insert, so replacing a policy never trips the
    /// active-scope unique index and never leaves the scope without a
    /// workflow on failure.
    pub async fn create_workflow(
        &self,
        company_id: Uuid,
        input: CreateEscalationWorkflow,
    ) -> Result<EscalationWorkflow> {
        validate_workflow_input(&input)?;

        let category = input.obligation_category.clone();
        let (workflow, deactivated) =
            EscalationWorkflow::create_replacing(&self.pool, company_id, input).await?;

        if deactivated > 0 {
            info!(
                company_id = %company_id,
                workflow_id = %workflow.id,
                deactivated,
                "Deactivated previously active workflows for scope"
            );
        }

        info!(
            company_id = %company_id,
            workflow_id = %workflow.id,
            category = ?category,
            "Escalation workflow created"
        );

        Ok(workflow)
    }

    /// Soft-deactivate a workflow.
    pub async fn deactivate_workflow(&self, company_id: Uuid, id: Uuid) -> Result<()> {
        let deactivated = EscalationWorkflow::deactivate(&self.pool, company_id, id).await?;
        if !deactivated {
            return Err(SchedulingError::WorkflowNotFound(id));
        }

        info!(company_id = %company_id, workflow_id = %id, "Escalation workflow deactivated");
        Ok(())
    }

    /// Health check: scopes holding more than one active workflow. The
    /// matcher papers over these deterministically; operators repair them.
    pub async fn check_scope_integrity(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<WorkflowScopeConflict>> {
        let conflicts = EscalationWorkflow::find_scope_conflicts(&self.pool, company_id).await?;
        for conflict in &conflicts {
            warn!(
                target: "config_integrity",
                company_id = %conflict.company_id,
                category = ?conflict.obligation_category,
                active_count = conflict.active_count,
                "Multiple active escalation workflows share a scope"
            );
        }
        Ok(conflicts)
    }

    fn first_reporting_conflicts(
        &self,
        company_id: Uuid,
        mut matches: Vec<EscalationWorkflow>,
    ) -> Option<EscalationWorkflow> {
        if matches.len() > 1 {
            warn!(
                target: "config_integrity",
                company_id = %company_id,
                count = matches.len(),
                category = ?matches[0].obligation_category,
                "Scope has multiple active workflows; using most recent"
            );
        }
        if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        }
    }
}
