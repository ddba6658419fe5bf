//! Test harness backed by a throwaway SQLite file.
//!
//! Every test gets its own database in a fresh temporary directory, so tests
//! can run in parallel and never see each other's rows.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use ingest_core::domains::events::Event;
use ingest_core::kernel::EventStore;
use ingest_core::server::{build_app, AppState};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tempfile::TempDir;
use test_context::AsyncTestContext;

/// Test harness that manages test infrastructure.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let count = ctx.count().await;
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    /// Bootstrapped store - use this for writes and assertions.
    pub store: EventStore,
    /// Location of the database file.
    pub db_path: PathBuf,
    _dir: TempDir,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.store.close().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let dir = tempfile::tempdir().context("Failed to create temp dir")?;
        let db_path = dir.path().join("telemetry.db");
        let store = EventStore::open(path_str(&db_path)?)
            .await
            .context("Failed to open test store")?;

        Ok(Self {
            store,
            db_path,
            _dir: dir,
        })
    }

    /// Router wired to this harness's store.
    pub fn app(&self) -> Router {
        self.app_with_timeout(Duration::from_secs(10))
    }

    /// Router whose requests are cut off after `timeout`.
    pub fn app_with_timeout(&self, timeout: Duration) -> Router {
        build_app(AppState::new(self.store.clone()), timeout)
    }

    /// Open a second, independent store on the same database file.
    pub async fn reopen(&self) -> Result<EventStore> {
        Ok(EventStore::open(path_str(&self.db_path)?).await?)
    }

    pub async fn count(&self) -> i64 {
        Event::count(self.store.pool())
            .await
            .expect("Failed to count events")
    }

    pub async fn all_events(&self) -> Vec<Event> {
        Event::list_all(self.store.pool())
            .await
            .expect("Failed to list events")
    }

    /// Take the database write lock from a separate connection.
    ///
    /// Store writes block on the busy timeout until [`release_write_lock`]
    /// is called with the returned connection.
    ///
    /// [`release_write_lock`]: TestHarness::release_write_lock
    pub async fn hold_write_lock(&self) -> SqliteConnection {
        let mut conn = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .connect()
            .await
            .expect("Failed to open locking connection");
        sqlx::raw_sql("BEGIN IMMEDIATE")
            .execute(&mut conn)
            .await
            .expect("Failed to take write lock");
        conn
    }

    pub async fn release_write_lock(&self, mut conn: SqliteConnection) {
        sqlx::raw_sql("ROLLBACK")
            .execute(&mut conn)
            .await
            .expect("Failed to release write lock");
        conn.close().await.expect("Failed to close locking connection");
    }

    /// Make the store abort any insert whose message is `poison`.
    pub async fn poison_message(&self, poison: &str) {
        sqlx::raw_sql(&format!(
            "CREATE TRIGGER poison_insert BEFORE INSERT ON events \
             WHEN NEW.message = '{poison}' \
             BEGIN SELECT RAISE(ABORT, 'poisoned insert'); END;"
        ))
        .execute(self.store.pool())
        .await
        .expect("Failed to install trigger");
    }
}

fn path_str(path: &std::path::Path) -> Result<&str> {
    path.to_str().context("temp path is not valid UTF-8")
}
