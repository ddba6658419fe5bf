use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};

use super::Level;
use crate::common::EventId;
use crate::domains::events::validation::ValidatedEvent;

/// A persisted telemetry event. Rows are append-only.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub source: String,
    pub ts: String,
    pub level: Level,
    pub message: String,
    #[sqlx(rename = "meta_json")]
    pub meta: Option<String>,
    pub received_at: String,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Event {
    /// Insert one validated event. Works against the pool or an open
    /// transaction.
    pub async fn insert<'e, E>(
        id: EventId,
        event: &ValidatedEvent,
        received_at: &str,
        executor: E,
    ) -> sqlx::Result<()>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO events (id, source, ts, level, message, meta_json, received_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(event.source())
        .bind(event.ts())
        .bind(event.level())
        .bind(event.message())
        .bind(event.meta())
        .bind(received_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(id: EventId, pool: &SqlitePool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Events stamped with the given receipt time, in id (creation) order.
    pub async fn list_by_received_at(
        received_at: &str,
        pool: &SqlitePool,
    ) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM events WHERE received_at = ? ORDER BY id")
            .bind(received_at)
            .fetch_all(pool)
            .await
    }

    /// Every event in id (creation) order.
    pub async fn list_all(pool: &SqlitePool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM events ORDER BY id")
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(pool)
            .await
    }
}
