//! # Storage Engine Contract
//!
//! The local store is built over a small keyed-collection engine
//! contract so any key-value backend (embedded SQLite in production,
//! in-memory for tests) can carry the same atomic-commit guarantee.
//!
//! ## The Atomic Write Handle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Atomic Write Protocol                               │
//! │                                                                         │
//! │  engine.begin()                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AtomicWrite handle                                                     │
//! │       │                                                                 │
//! │       ├── put("orders", id, value)                                      │
//! │       ├── put("print_jobs", id, value)     any mix of collections       │
//! │       ├── delete("products", id)                                        │
//! │       │                                                                 │
//! │       ├── commit() ──► ALL writes become visible at once                │
//! │       └── abort()  ──► NONE of them ever become visible                 │
//! │                                                                         │
//! │  Readers can never observe a handle's writes before commit().           │
//! │  This is what makes a multi-record transaction atomic without any       │
//! │  compensation logic above it.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Engines are opened with a fixed set of collections; touching an
//! unregistered collection is a [`StoreError::UnknownCollection`], which
//! is how a bad operation fails *before* the handle commits.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::{StoreError, StoreResult};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryEngine;
pub use sqlite::{SqliteEngine, StoreConfig};

// =============================================================================
// Traits
// =============================================================================

/// A keyed-collection storage backend.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Reads one record.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Reads every record in a collection.
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Value>>;

    /// Opens an atomic write handle.
    async fn begin(&self) -> StoreResult<Box<dyn AtomicWrite>>;
}

/// A batch of staged writes that commits or aborts as one unit.
#[async_trait]
pub trait AtomicWrite: Send {
    /// Stages an upsert.
    async fn put(&mut self, collection: &str, id: &str, value: &Value) -> StoreResult<()>;

    /// Stages a removal.
    async fn delete(&mut self, collection: &str, id: &str) -> StoreResult<()>;

    /// Makes every staged write visible, atomically.
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    /// Discards every staged write.
    async fn abort(self: Box<Self>) -> StoreResult<()>;
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Builds the registered-collection set an engine is opened with.
pub(crate) fn collection_set(collections: &[&str]) -> HashSet<String> {
    collections.iter().map(|c| c.to_string()).collect()
}

/// Rejects collections the engine was not opened with.
pub(crate) fn check_collection(known: &HashSet<String>, collection: &str) -> StoreResult<()> {
    if known.contains(collection) {
        Ok(())
    } else {
        Err(StoreError::UnknownCollection(collection.to_string()))
    }
}
