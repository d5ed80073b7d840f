//! PostgreSQL key/value store.
//!
//! Markers live in a single two-column table; the primary key on `key`
//! plus `ON CONFLICT DO NOTHING` keeps the first write and makes repeated
//! puts no-ops.
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS plugin_kv_store (
//!     key   TEXT PRIMARY KEY,
//!     value BYTEA NOT NULL
//! );
//! ```
//!
//! Pool settings come from `DATABASE_URL` and the `DB_*` variables read by
//! [`PostgresConfig::from_env`].

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;

use super::KvStore;

/// DDL for the backing table. Safe to run repeatedly.
pub const KV_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS plugin_kv_store (
    key   TEXT PRIMARY KEY,
    value BYTEA NOT NULL
)
"#;

/// Connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    /// `DATABASE_URL`.
    pub database_url: String,
    /// `DB_MAX_CONNECTIONS`, default 10.
    pub max_connections: u32,
    /// `DB_MIN_CONNECTIONS`, default 2.
    pub min_connections: u32,
    /// `DB_CONNECT_TIMEOUT_SECS`, default 10.
    pub connect_timeout_secs: u64,
    /// `DB_IDLE_TIMEOUT_SECS`, default 300.
    pub idle_timeout_secs: u64,
    /// `DB_MAX_LIFETIME_SECS`, default 1800.
    pub max_lifetime_secs: u64,
}

impl PostgresConfig {
    /// Read pool settings from the environment, falling back to the defaults above.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/read_receipts".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
            .test_before_acquire(true)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Read markers stored in PostgreSQL.
pub struct PostgresKvStore {
    pool: PgPool,
}

impl PostgresKvStore {
    /// Connect and create the marker table if needed.
    pub async fn connect(config: PostgresConfig) -> Result<Self, PostgresError> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting read marker store"
        );

        let pool = config.pool_options().connect(&config.database_url).await?;
        sqlx::query(KV_TABLE_SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Connect using [`PostgresConfig::from_env`].
    pub async fn from_env() -> Result<Self, PostgresError> {
        Self::connect(PostgresConfig::from_env()).await
    }
}

/// Error type for PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
impl KvStore for PostgresKvStore {
    type Error = PostgresError;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Self::Error> {
        sqlx::query(
            "INSERT INTO plugin_kv_store (key, value) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let row = sqlx::query("SELECT value FROM plugin_kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get::<Vec<u8>, _>("value"))
            .transpose()
            .map_err(PostgresError::from)
    }
}
