//! Database connection pool management.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::DbError;

/// Default maximum number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default timeout when acquiring a connection from the pool.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// A `PostgreSQL` connection pool with sane defaults for the platform.
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: PgPool,
}

impl DbPool {
    /// Connect to the database with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionFailed` if the database is unreachable
    /// or the credentials are invalid.
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        Self::connect_with(database_url, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Connect with an explicit connection limit.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionFailed` if the connection cannot be
    /// established.
    pub async fn connect_with(database_url: &str, max_connections: u32) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
            .connect(database_url)
            .await
            .map_err(DbError::ConnectionFailed)?;

        Ok(Self { pool })
    }

    /// Access the underlying `sqlx` pool.
    #[must_use]
    pub fn inner(&self) -> &PgPool {
        &self.pool
    }

    /// Consume the wrapper and return the underlying pool.
    #[must_use]
    pub fn into_inner(self) -> PgPool {
        self.pool
    }
}
