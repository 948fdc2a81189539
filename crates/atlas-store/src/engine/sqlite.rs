//! # SQLite Storage Engine
//!
//! The durable engine: records as JSON payloads in one
//! `records(collection, id, payload)` table, with every atomic write
//! handle backed by a real SQLite transaction.
//!
//! ## Why One Table?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Keyed-Collection Storage                            │
//! │                                                                         │
//! │  records                                                                │
//! │  ┌────────────┬──────────┬──────────────────────────────────────┐       │
//! │  │ collection │ id       │ payload (JSON)                       │       │
//! │  ├────────────┼──────────┼──────────────────────────────────────┤       │
//! │  │ orders     │ o-1      │ {"id":"o-1","version":1,...}         │       │
//! │  │ print_jobs │ j-1      │ {"id":"j-1","status":"queued",...}   │       │
//! │  │ sync_queue │ tx-1     │ {"id":"tx-1","operations":[...],...} │       │
//! │  └────────────┴──────────┴──────────────────────────────────────┘       │
//! │                                                                         │
//! │  A commit touching orders + sync_queue is ONE SQLite transaction        │
//! │  over one table, so cross-collection atomicity comes for free.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! WAL (Write-Ahead Logging) is enabled so readers don't block the
//! single writer and crash recovery is clean, the same setup a POS
//! terminal wants when the power cable gets kicked.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool};
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use atlas_core::collections;

use crate::engine::{check_collection, collection_set, AtomicWrite, StorageEngine};
use crate::error::{StoreError, StoreResult};
use crate::migrations;

// =============================================================================
// Configuration
// =============================================================================

/// Storage configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = StoreConfig::new("/var/lib/atlas/atlas.db").max_connections(5);
/// let engine = SqliteEngine::open(config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (sufficient for a local POS app)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection acquire timeout.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Whether to run migrations on open.
    /// Default: true
    pub run_migrations: bool,

    /// Collections the engine is opened with.
    pub collections: Vec<String>,
}

impl StoreConfig {
    /// Creates a configuration for the given database path with the
    /// default collection set.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            run_migrations: true,
            collections: collections::ALL.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Replaces the collection set.
    pub fn collections(mut self, collections: &[&str]) -> Self {
        self.collections = collections.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// In-memory SQLite lives and dies with its connection, so the pool
    /// is pinned to a single connection.
    pub fn in_memory() -> Self {
        StoreConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            run_migrations: true,
            collections: collections::ALL.iter().map(|c| c.to_string()).collect(),
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// The durable SQLite-backed storage engine.
#[derive(Debug, Clone)]
pub struct SqliteEngine {
    pool: SqlitePool,
    known: Arc<HashSet<String>>,
}

impl SqliteEngine {
    /// Opens (creating if missing) the database and runs migrations.
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening local store database"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| StoreError::Database(e.to_string()))?
            // WAL: readers never block the writer
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL: durable enough for WAL, much faster than FULL
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Store pool created");

        if config.run_migrations {
            migrations::run_migrations(&pool).await?;
        }

        Ok(SqliteEngine {
            pool,
            known: Arc::new(collection_set(
                &config
                    .collections
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>(),
            )),
        })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the connection pool. Call on shutdown.
    pub async fn close(&self) {
        info!("Closing store connection pool");
        self.pool.close().await;
    }
}

#[async_trait]
impl StorageEngine for SqliteEngine {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        check_collection(&self.known, collection)?;

        let payload: Option<String> = sqlx::query_scalar(
            "SELECT payload FROM records WHERE collection = ?1 AND id = ?2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        payload
            .map(|p| serde_json::from_str(&p).map_err(StoreError::from))
            .transpose()
    }

    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Value>> {
        check_collection(&self.known, collection)?;

        let payloads: Vec<String> = sqlx::query_scalar(
            "SELECT payload FROM records WHERE collection = ?1 ORDER BY rowid",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        payloads
            .into_iter()
            .map(|p| serde_json::from_str(&p).map_err(StoreError::from))
            .collect()
    }

    async fn begin(&self) -> StoreResult<Box<dyn AtomicWrite>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteAtomicWrite {
            tx,
            known: Arc::clone(&self.known),
        }))
    }
}

// =============================================================================
// Atomic Write
// =============================================================================

/// One SQLite transaction, exposed through the engine contract.
struct SqliteAtomicWrite {
    tx: sqlx::Transaction<'static, Sqlite>,
    known: Arc<HashSet<String>>,
}

#[async_trait]
impl AtomicWrite for SqliteAtomicWrite {
    async fn put(&mut self, collection: &str, id: &str, value: &Value) -> StoreResult<()> {
        check_collection(&self.known, collection)?;

        let payload = serde_json::to_string(value)?;
        sqlx::query(
            "INSERT INTO records (collection, id, payload) VALUES (?1, ?2, ?3) \
             ON CONFLICT (collection, id) DO UPDATE SET payload = excluded.payload",
        )
        .bind(collection)
        .bind(id)
        .bind(payload)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete(&mut self, collection: &str, id: &str) -> StoreResult<()> {
        check_collection(&self.known, collection)?;

        sqlx::query("DELETE FROM records WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn abort(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
