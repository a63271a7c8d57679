//! Database models for the scheduling core.
//!
//! One module per table, in the platform's model idiom: a `FromRow` struct
//! with company-scoped static query methods, plus `Create*` companions for
//! inserts.

pub mod compliance_event;
pub mod deadline;
pub mod escalation;
pub mod escalation_workflow;
pub mod obligation;
pub mod schedule;
pub mod trigger_execution;
pub mod trigger_rule;
pub mod types;

pub use compliance_event::ComplianceEvent;
pub use deadline::{ComplianceDeadline, CreateDeadline};
pub use escalation::{Escalation, NewEscalation};
pub use escalation_workflow::{
    CreateEscalationWorkflow, EscalationWorkflow, WorkflowScopeConflict,
};
pub use obligation::{CreateObligation, Obligation};
pub use schedule::{CreateSchedule, ObligationSchedule};
pub use trigger_execution::TriggerExecution;
pub use trigger_rule::{CreateTriggerRule, RecurrenceTriggerRule};
pub use types::{
    DeadlineStatus, ExecutionResult, ObligationFrequency, ScheduleStatus, TargetEntityType,
    TriggerType,
};
