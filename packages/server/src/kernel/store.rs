//! Embedded SQLite store for telemetry events.
//!
//! SQLite allows a single writer at a time, so the pool holds exactly one
//! connection and concurrent requests queue on it; transactions provide the
//! interleaving. The connection never idles out or expires, which keeps an
//! in-memory database alive for as long as the store.
//!
//! An [`EventStore`] only exists once the schema has been applied and
//! verified, so writers cannot run against a half-initialized database.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, info};

/// DDL for the events table. Every statement is `IF NOT EXISTS`.
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

const CONNECT_PING_TIMEOUT: Duration = Duration::from_secs(3);
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("apply schema: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("schema verification failed: table `events` is missing")]
    SchemaMissing,

    #[error("database ping failed: {0}")]
    Ping(#[source] sqlx::Error),

    #[error("database did not respond within {0:?}")]
    Timeout(Duration),
}

/// Handle to a bootstrapped event store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventStore {
    pool: SqlitePool,
}

impl EventStore {
    /// Open (creating if needed) the database file at `path`, verify it
    /// responds, and apply the schema.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = single_writer_pool()
            .connect_with(options)
            .await
            .map_err(StoreError::Connect)?;

        info!(path = %path, "Opened event store");
        Self::from_pool(pool).await
    }

    /// Ephemeral store backed by an in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(StoreError::Connect)?;
        let pool = single_writer_pool()
            .connect_with(options)
            .await
            .map_err(StoreError::Connect)?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.ping(CONNECT_PING_TIMEOUT).await?;
        Self::bootstrap(store.pool).await
    }

    /// Apply the schema to an existing pool and verify the result.
    ///
    /// Idempotent: running it against an initialized database changes nothing
    /// and leaves existing rows in place.
    pub async fn bootstrap(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&pool)
            .await
            .map_err(StoreError::Schema)?;

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'events'",
        )
        .fetch_one(&pool)
        .await
        .map_err(StoreError::Schema)?;
        if tables != 1 {
            return Err(StoreError::SchemaMissing);
        }

        debug!("Event store schema ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial query, giving up after `deadline`.
    pub async fn ping(&self, deadline: Duration) -> Result<(), StoreError> {
        match tokio::time::timeout(deadline, sqlx::query("SELECT 1").execute(&self.pool)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(StoreError::Ping(e)),
            Err(_) => Err(StoreError::Timeout(deadline)),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn single_writer_pool() -> SqlitePoolOptions {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
}
