//! # Canonical Store Handle
//!
//! Opens the SQLite file that stands in for the hosted canonical catalog.
//!
//! ## Who Holds a `Database`
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  catalog-sync --db medi.db ──► Database::new ──► SqliteCatalog          │
//! │                                     │                 │                 │
//! │                                     │          ┌──────┴───────┐         │
//! │                                     │          ▼              ▼         │
//! │                                     │   SyncOrchestrator  LookupFacade  │
//! │                                     │   (one writer per    (readers     │
//! │                                     │    batch txn)         meanwhile)  │
//! │                                     ▼                                   │
//! │                     migrations/sqlite/*.sql applied on open             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! WAL journaling lets lookups read while a sync batch is being written.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::medicine::MedicineRepository;

const IN_MEMORY: &str = ":memory:";

/// Where the canonical store lives and how long a caller may wait for a
/// connection.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// One sync writer plus concurrent lookups.
    pub max_connections: u32,
    /// Waiting longer than this yields [`DbError::PoolExhausted`].
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// A file-backed store, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 4,
            acquire_timeout: Duration::from_secs(10),
        }
    }

    /// A private in-memory store. Every connection to `:memory:` would see
    /// its own empty database, so the pool is pinned to one.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

/// Handle to the canonical store. Clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the store and applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening canonical store"
        );

        let url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        // min_connections keeps an in-memory database alive between queries.
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .idle_timeout(None)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn medicines(&self) -> MedicineRepository {
        MedicineRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// True while the store answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        assert_eq!(db.medicines().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medi.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        db.close().await;
        assert!(!db.health_check().await);

        // Reopening re-runs the migrator without reapplying anything.
        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        let (_, applied_again) = migrations::migration_status(reopened.pool()).await.unwrap();
        assert_eq!(applied_again, applied);
    }

    #[tokio::test]
    async fn test_busy_pool_reports_exhaustion() {
        let db = Database::new(DbConfig::in_memory().with_acquire_timeout(Duration::from_millis(50)))
            .await
            .unwrap();

        let _held = db.pool().acquire().await.unwrap();
        let err = db.medicines().count().await.unwrap_err();

        assert!(matches!(err, DbError::PoolExhausted));
    }
}
