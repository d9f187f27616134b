//! PostgreSQL storage adapter implementation

pub mod config;
pub mod influence;
pub mod migrations;
pub mod sites;
pub mod statistics;

pub use config::{ConfigError, PoolConfig, PostgresConfig};
pub use migrations::{MigrationError, MigrationManager, MigrationStatus};

use rainforce_core::error::{RainforceError, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Map a driver error to a storage error with context
pub(crate) fn storage_error(context: &str) -> impl FnOnce(sqlx::Error) -> RainforceError + '_ {
    move |e| RainforceError::Storage(format!("{}: {}", context, e))
}

/// PostgreSQL storage adapter
///
/// One pooled store implements every storage port, so a single instance can
/// be shared behind `Arc` by the whole pipeline.
pub struct PostgresStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresStore {
    /// Connect with the given configuration, applying migrations if enabled
    pub async fn connect(config: PostgresConfig) -> Result<Self> {
        config.validate().map_err(|e| RainforceError::ConfigInvalid {
            key: "database_url".to_string(),
            reason: e.to_string(),
        })?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .connect(&config.database_url)
            .await
            .map_err(storage_error("Failed to connect to database"))?;

        let store = Self { pool, config };
        store.health_check().await?;

        if store.config.auto_migrate {
            store.run_migrations().await?;
        }

        tracing::info!(
            max_connections = store.config.pool.max_connections,
            "Connected to PostgreSQL store"
        );
        Ok(store)
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> Result<()> {
        MigrationManager::new(self.pool.clone())
            .run_migrations()
            .await
            .map_err(|e| RainforceError::Storage(format!("Migration failed: {}", e)))
    }

    /// Check migration status
    pub async fn migration_status(&self) -> Result<Vec<MigrationStatus>> {
        MigrationManager::new(self.pool.clone())
            .check_status()
            .await
            .map_err(|e| RainforceError::Storage(format!("Failed to check migrations: {}", e)))
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Perform a health check on the database connection
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("Health check failed"))?;
        Ok(())
    }
}
