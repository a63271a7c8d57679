//! Error types for the verdant-db crate.
//!
//! Provides a unified error type that wraps `SQLx` errors with additional context.

use thiserror::Error;

/// Database operation errors.
///
/// This enum wraps all possible database errors with clear, actionable messages.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to establish or acquire a database connection.
    ///
    /// This typically indicates network issues, invalid credentials,
    /// or the database server being unavailable.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// A database migration failed to apply.
    ///
    /// Check the migration SQL for syntax errors or constraint violations.
    #[error("Migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),

    /// A database query failed to execute.
    #[error("Query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation failed.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl DbError {
    /// Check if this error indicates a connection problem.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_))
    }

    /// Check if this error indicates a query problem.
    #[must_use]
    pub fn is_query_error(&self) -> bool {
        matches!(self, DbError::QueryFailed(_))
    }

    /// Check if this error indicates a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}
