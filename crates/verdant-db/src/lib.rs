//! Database layer for the Verdant compliance platform.
//!
//! Provides the connection pool, embedded SQL migrations, and the models
//! backing the compliance scheduling and escalation core: obligations,
//! schedules, deadlines, escalation workflows, escalation chains, and
//! recurrence trigger rules with their execution audit trail.

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;

pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::DbPool;
