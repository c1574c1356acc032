//! # Database
//!
//! PostgreSQL persistence for per-chat named records. Each chat owns a small
//! set of string records keyed by name; the watchlist is one of them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{debug, info, Instrument};

use crate::config::DatabaseConfig;
use crate::errors::{error_logging, AppError, AppResult};
use crate::observability;
use crate::storage::KeyValueStore;

/// A stored record
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub owner_id: i64,
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Connect a pool using the database configuration
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await
        .context("Failed to connect to database")?;
    Ok(pool)
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS kv_store (
            owner_id BIGINT NOT NULL,
            key VARCHAR(255) NOT NULL,
            value TEXT NOT NULL,
            updated_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (owner_id, key)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create kv_store table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Read one record
pub async fn get_record(pool: &PgPool, owner_id: i64, key: &str) -> Result<Option<StoredRecord>> {
    debug!(owner_id = %owner_id, key = %key, "Reading record");
    let start = Instant::now();

    let row = sqlx::query(
        "SELECT owner_id, key, value, updated_at FROM kv_store WHERE owner_id = $1 AND key = $2",
    )
    .bind(owner_id)
    .bind(key)
    .fetch_optional(pool)
    .instrument(observability::db_span("select", "kv_store"))
    .await
    .context("Failed to read record")?;

    observability::record_db_metrics("select", start.elapsed());

    Ok(row.map(|row| StoredRecord {
        owner_id: row.get(0),
        key: row.get(1),
        value: row.get(2),
        updated_at: row.get(3),
    }))
}

/// Insert or overwrite one record
pub async fn put_record(pool: &PgPool, owner_id: i64, key: &str, value: &str) -> Result<()> {
    debug!(owner_id = %owner_id, key = %key, bytes = value.len(), "Writing record");
    let start = Instant::now();

    sqlx::query(
        "INSERT INTO kv_store (owner_id, key, value, updated_at)
         VALUES ($1, $2, $3, CURRENT_TIMESTAMP)
         ON CONFLICT (owner_id, key)
         DO UPDATE SET value = EXCLUDED.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(owner_id)
    .bind(key)
    .bind(value)
    .execute(pool)
    .instrument(observability::db_span("upsert", "kv_store"))
    .await
    .context("Failed to write record")?;

    observability::record_db_metrics("upsert", start.elapsed());
    Ok(())
}

/// [`KeyValueStore`] scoped to one chat's records
#[derive(Debug, Clone)]
pub struct PgKeyValueStore {
    pool: Arc<PgPool>,
    owner_id: i64,
}

impl PgKeyValueStore {
    pub fn new(pool: Arc<PgPool>, owner_id: i64) -> Self {
        Self { pool, owner_id }
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

impl KeyValueStore for PgKeyValueStore {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        match get_record(&self.pool, self.owner_id, key).await {
            Ok(record) => Ok(record.map(|r| r.value)),
            Err(e) => {
                error_logging::log_database_error(&e, "get_item", Some(self.owner_id));
                Err(AppError::Database(format!("{:#}", e)))
            }
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        put_record(&self.pool, self.owner_id, key, value)
            .await
            .map_err(|e| {
                error_logging::log_database_error(&e, "set_item", Some(self.owner_id));
                AppError::Database(format!("{:#}", e))
            })
    }
}
