use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use atlas_core::config::DatabaseConfig;
use atlas_core::error::{AtlasError, Result};

/// Database connection wrapper providing connection pooling.
#[derive(Clone)]
pub struct Database {
    pool: Arc<PgPool>,
    target: String,
}

impl Database {
    /// Create a new database connection from configuration.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        config.validate()?;
        let options = config.connect_options()?;
        let target = config.display_target();

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.pool_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| AtlasError::Database(format!("Failed to connect to {}: {}", target, e)))?;

        tracing::debug!(db = %target, pool_size = config.pool_size, "Database pool ready");

        Ok(Self {
            pool: Arc::new(pool),
            target,
        })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            target: "external pool".to_string(),
        }
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Connection target without credentials.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| AtlasError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Close all connections gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
