//! Database Connection Management
//!
//! Utilities for managing PostgreSQL connections with SQLx and for choosing
//! the store backend from the configured URL.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use sqlx::PgPool;

use crate::config::env;
use crate::store::{MemoryStore, PgStore, Store};

/// Database connection pool type alias for convenience
pub type DatabasePool = PgPool;

/// URL scheme selecting the process-local store
pub const MEMORY_URL_PREFIX: &str = "memory:";

/// Database configuration for connection setup
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/restaurant_directory".to_string(),
            max_connections: 20,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(3600),
        }
    }
}

impl DatabaseConfig {
    /// Create database configuration from environment variables
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let url = std::env::var("DATABASE_URL")?;

        Ok(Self {
            url,
            max_connections: env::get_u32("DB_MAX_CONNECTIONS", 20),
            min_connections: env::get_u32("DB_MIN_CONNECTIONS", 1),
            connect_timeout: Duration::from_secs(env::get_u64("DB_CONNECT_TIMEOUT", 30)),
            idle_timeout: Duration::from_secs(env::get_u64("DB_IDLE_TIMEOUT", 600)),
            max_lifetime: Duration::from_secs(env::get_u64("DB_MAX_LIFETIME", 3600)),
        })
    }

    /// Whether the URL selects the in-memory store
    pub fn is_memory(&self) -> bool {
        self.url.starts_with(MEMORY_URL_PREFIX)
    }

    /// Create a database connection pool from this configuration
    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        sqlx::postgres::PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .connect(&self.url)
            .await
    }

    /// Open the configured store, applying migrations for PostgreSQL
    pub async fn open_store(&self) -> Result<Arc<dyn Store>, sqlx::Error> {
        if self.is_memory() {
            info!("Using in-memory store");
            return Ok(Arc::new(MemoryStore::new()));
        }

        let store = PgStore::new(self.create_pool().await?);
        store
            .run_migrations()
            .await
            .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
        info!("Database connection established and migrations applied");

        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert!(!config.is_memory());
    }

    #[tokio::test]
    async fn test_memory_url_opens_memory_store() {
        let config = DatabaseConfig {
            url: "memory://".to_string(),
            ..DatabaseConfig::default()
        };

        let store = config.open_store().await.unwrap();
        assert!(store.ping().await.is_ok());
    }
}
