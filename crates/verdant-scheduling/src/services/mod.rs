//! Services for the scheduling and escalation core.

pub mod escalation_service;
pub mod workflow_service;

pub use escalation_service::{
    next_level, EscalationEntity, EscalationOutcome, EscalationService, MAX_ESCALATION_LEVEL,
};
pub use workflow_service::{
    determine_escalation_level, validate_workflow_input, EscalationThresholds,
    EscalationWorkflowService, SYSTEM_DEFAULT_LEVEL_DAYS,
};
