//! Escalation state machine.
//!
//! Tracks per-obligation escalation level and enforces strictly sequential
//! progression: one level per evaluation, regardless of how far overdue the
//! obligation has become, so recipients at lower levels get a chance to act
//! before the terminal level is reached.

use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use verdant_db::models::{ComplianceDeadline, Escalation, NewEscalation, Obligation};

use crate::error::Result;
use crate::services::workflow_service::{
    determine_escalation_level, EscalationWorkflowService,
};

/// Terminal escalation level.
pub const MAX_ESCALATION_LEVEL: i32 = 4;

/// The entity an overdue evaluation refers to. Escalation bookkeeping is
/// keyed by obligation; deadlines resolve to their obligation first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationEntity {
    /// An obligation directly.
    Obligation(Uuid),
    /// A deadline instance; the obligation is resolved via its foreign key.
    Deadline(Uuid),
}

/// What an escalation evaluation produced: the tuple handed to the external
/// notification dispatcher.
#[derive(Debug, Clone)]
pub struct EscalationOutcome {
    /// The escalated obligation.
    pub obligation_id: Uuid,
    /// The level now in effect (1..=4).
    pub level: i32,
    /// Recipients to notify for this level.
    pub recipient_ids: Vec<Uuid>,
    /// The inserted escalation record.
    pub escalation_id: Uuid,
}

/// Pure transition function for the escalation state machine.
///
/// Levels advance by at most one step per evaluation: a requested level far
/// above the current one is clamped to `current + 1`. Requests at or below
/// the current level do not transition.
#[must_use]
pub fn next_level(current: i32, requested: i32) -> i32 {
    requested.min(current + 1).min(MAX_ESCALATION_LEVEL)
}

/// Service driving the escalation state machine.
pub struct EscalationService {
    pool: PgPool,
}

impl EscalationService {
    /// Create a new escalation service.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Advance an obligation's escalation level toward `requested_level`.
    ///
    /// Returns the new escalation record ID, or `None` when nothing was
    /// written: the entity could not be resolved, the requested level does
    /// not exceed the current one, or a concurrent evaluation advanced the
    /// level first. Escalation is best-effort; data-integrity gaps degrade
    /// to a no-op instead of failing the batch that invoked this.
    pub async fn create_or_update_escalation(
        &self,
        company_id: Uuid,
        entity: EscalationEntity,
        requested_level: i32,
        days_overdue: i64,
        recipient_ids: &[Uuid],
    ) -> Result<Option<Uuid>> {
        let Some(obligation) = self.resolve_obligation(company_id, entity).await? else {
            return Ok(None);
        };

        let current = Escalation::find_current_unresolved(&self.pool, company_id, obligation.id)
            .await?;
        let current_level = current.as_ref().map_or(0, |e| e.current_level);

        if requested_level <= current_level {
            debug!(
                obligation_id = %obligation.id,
                current_level,
                requested_level,
                "Escalation already at or above requested level"
            );
            return Ok(None);
        }

        let new_level = next_level(current_level, requested_level);

        let inserted = Escalation::create_if_advances(
            &self.pool,
            company_id,
            NewEscalation {
                obligation_id: obligation.id,
                site_id: obligation.site_id,
                level: new_level,
                escalated_to: recipient_ids.first().copied(),
                days_overdue: i32::try_from(days_overdue).unwrap_or(i32::MAX),
                previous_escalation_id: current.map(|e| e.id),
            },
        )
        .await?;

        match inserted {
            Some(escalation) => {
                info!(
                    company_id = %company_id,
                    obligation_id = %obligation.id,
                    level = new_level,
                    days_overdue,
                    recipients = recipient_ids.len(),
                    "Escalation level advanced"
                );
                Ok(Some(escalation.id))
            }
            None => {
                // A concurrent evaluation won the conditional insert.
                debug!(
                    obligation_id = %obligation.id,
                    level = new_level,
                    "Escalation insert skipped; level already advanced"
                );
                Ok(None)
            }
        }
    }

    /// Full evaluation for an overdue entity: match the applicable workflow
    /// (system default when none), determine the target level from days
    /// overdue, run the state machine, and produce the notification tuple.
    ///
    /// Returns `None` when no threshold is met or no transition occurred.
    pub async fn evaluate_overdue(
        &self,
        workflow_service: &EscalationWorkflowService,
        company_id: Uuid,
        entity: EscalationEntity,
        obligation_category: Option<&str>,
        days_overdue: i64,
    ) -> Result<Option<EscalationOutcome>> {
        let (thresholds, workflow_id) = workflow_service
            .resolve_thresholds(company_id, obligation_category)
            .await?;

        let requested_level = determine_escalation_level(days_overdue, &thresholds);
        if requested_level == 0 {
            return Ok(None);
        }

        let Some(obligation) = self.resolve_obligation(company_id, entity).await? else {
            return Ok(None);
        };

        let current_level =
            Escalation::find_current_unresolved(&self.pool, company_id, obligation.id)
                .await?
                .map_or(0, |e| e.current_level);
        let effective_level = next_level(current_level, requested_level);
        let recipients = thresholds.recipients_for_level(effective_level).to_vec();

        let escalation_id = self
            .create_or_update_escalation(
                company_id,
                EscalationEntity::Obligation(obligation.id),
                requested_level,
                days_overdue,
                &recipients,
            )
            .await?;

        debug!(
            company_id = %company_id,
            obligation_id = %obligation.id,
            workflow_id = ?workflow_id,
            requested_level,
            effective_level,
            "Overdue evaluation complete"
        );

        Ok(escalation_id.map(|id| EscalationOutcome {
            obligation_id: obligation.id,
            level: effective_level,
            recipient_ids: recipients,
            escalation_id: id,
        }))
    }

    /// Resolve an obligation's open escalation chain, typically on
    /// completion of the underlying deadline. Returns the number of records
    /// resolved.
    pub async fn resolve_for_obligation(
        &self,
        company_id: Uuid,
        obligation_id: Uuid,
    ) -> Result<u64> {
        let resolved =
            Escalation::resolve_for_obligation(&self.pool, company_id, obligation_id).await?;
        if resolved > 0 {
            info!(
                company_id = %company_id,
                obligation_id = %obligation_id,
                resolved,
                "Escalation chain resolved"
            );
        }
        Ok(resolved)
    }

    /// Resolve the obligation behind an escalation entity. Missing rows are
    /// soft failures: log and return `None`.
    async fn resolve_obligation(
        &self,
        company_id: Uuid,
        entity: EscalationEntity,
    ) -> Result<Option<Obligation>> {
        let obligation_id = match entity {
            EscalationEntity::Obligation(id) => id,
            EscalationEntity::Deadline(deadline_id) => {
                match ComplianceDeadline::find_by_id(&self.pool, company_id, deadline_id).await? {
                    Some(deadline) => deadline.obligation_id,
                    None => {
                        warn!(
                            company_id = %company_id,
                            deadline_id = %deadline_id,
                            "Deadline not found during escalation; skipping"
                        );
                        return Ok(None);
                    }
                }
            }
        };

        let obligation = Obligation::find_by_id(&self.pool, company_id, obligation_id).await?;
        if obligation.is_none() {
            warn!(
                company_id = %company_id,
                obligation_id = %obligation_id,
                "Obligation not found during escalation; skipping"
            );
        }
        Ok(obligation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_level_advances_one_step() {
        assert_eq!(next_level(0, 1), 1);
        assert_eq!(next_level(1, 2), 2);
        assert_eq!(next_level(3, 4), 4);
    }

    #[test]
    fn test_next_level_clamps_jumps() {
        // Jumping from on-time to deeply overdue still escalates gradually.
        assert_eq!(next_level(0, 4), 1);
        assert_eq!(next_level(1, 4), 2);
        assert_eq!(next_level(2, 4), 3);
    }

    #[test]
    fn test_next_level_never_exceeds_terminal() {
        assert_eq!(next_level(4, 9), 4);
        assert_eq!(next_level(4, 5), 4);
    }

    #[test]
    fn test_next_level_no_regression() {
        // Callers treat requested <= current as a no-op before transitioning;
        // the transition function itself never moves backward past current+1.
        assert_eq!(next_level(3, 2), 2.min(4));
        assert!(next_level(3, 2) <= 3 + 1);
    }
}
