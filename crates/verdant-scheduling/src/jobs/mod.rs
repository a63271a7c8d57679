//! Background jobs for the scheduling core.
//!
//! - Trigger executor - scans due recurrence trigger rules and creates
//!   schedule/deadline rows on a periodic cadence.

pub mod trigger_executor_job;

pub use trigger_executor_job::{
    TriggerExecutorInput, TriggerExecutorJob, TriggerExecutorJobError, TriggerExecutorStats,
    DEFAULT_BATCH_SIZE, DEFAULT_POLL_INTERVAL_SECS,
};
