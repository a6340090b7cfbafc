// PostgreSQL connection pool implementation

use crate::config::{ConnectionSettings, DatabaseConfig};
use crate::errors::DatabaseError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Connection;
use tracing::{info, instrument};

/// Database connection pool wrapper
///
/// Owns every physical connection. Callers borrow one connection per
/// operation through [`DbPool::pool`] and never hold it across calls.
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: PgPool,
}

impl DbPool {
    /// Build a bounded pool without touching the network
    ///
    /// # Errors
    /// Returns `DatabaseError::InvalidConfiguration` if the connection
    /// descriptor cannot be turned into connect options
    #[instrument(skip(connection, config), fields(db = %connection, max_connections = config.max_connections))]
    pub fn open(
        connection: &ConnectionSettings,
        config: &DatabaseConfig,
    ) -> Result<Self, DatabaseError> {
        let options = connection.connect_options()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .idle_timeout(Some(config.idle_timeout()))
            .acquire_timeout(config.connect_timeout())
            .connect_lazy_with(options);

        info!(
            max_connections = config.max_connections,
            idle_timeout_ms = config.idle_timeout_ms,
            connect_timeout_ms = config.connect_timeout_ms,
            "Database connection pool configured"
        );

        Ok(Self { pool })
    }

    /// Wrap an already-built pool (used by `#[sqlx::test]` fixtures)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool
    ///
    /// This is used by repositories to execute queries
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check out one connection, ping it and hand it back
    ///
    /// # Errors
    /// Returns `DatabaseError::ConnectionFailed` if the server refuses the
    /// connection, the acquire times out, or authentication fails
    #[instrument(skip(self))]
    pub async fn verify(&self) -> Result<(), DatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to check out a database connection");
            DatabaseError::ConnectionFailed(e.to_string())
        })?;

        conn.ping().await.map_err(|e| {
            tracing::error!(error = %e, "Database ping failed");
            DatabaseError::ConnectionFailed(e.to_string())
        })?;

        drop(conn);
        tracing::debug!(
            size = self.size(),
            idle = self.num_idle(),
            "Database connection verified"
        );
        Ok(())
    }

    /// Get the current number of connections in the pool
    pub fn size(&self) -> u32 {
        self.pool.size()
    }

    /// Get the number of idle connections in the pool
    pub fn num_idle(&self) -> usize {
        self.pool.num_idle()
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close the connection pool gracefully
    ///
    /// This should be called during graceful shutdown to ensure all connections
    /// are properly closed
    #[instrument(skip(self))]
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}
