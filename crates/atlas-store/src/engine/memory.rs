//! # In-Memory Storage Engine
//!
//! A non-durable engine with the same atomic-commit semantics as the
//! SQLite engine. Exists for tests and for running the core without a
//! filesystem; writes are staged on the handle and applied under one
//! lock, so readers still never observe a half-applied batch.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use atlas_core::collections;

use crate::engine::{check_collection, collection_set, AtomicWrite, StorageEngine};
use crate::error::StoreResult;

type Collections = HashMap<String, BTreeMap<String, Value>>;

// =============================================================================
// Engine
// =============================================================================

/// In-memory keyed-collection engine.
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    known: Arc<HashSet<String>>,
    data: Arc<Mutex<Collections>>,
}

impl MemoryEngine {
    /// Creates an engine over the given collections.
    pub fn new(names: &[&str]) -> Self {
        let mut data = Collections::new();
        for name in names {
            data.insert(name.to_string(), BTreeMap::new());
        }
        MemoryEngine {
            known: Arc::new(collection_set(names)),
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Creates an engine over the default collection set.
    pub fn with_default_collections() -> Self {
        Self::new(&collections::ALL)
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::with_default_collections()
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        check_collection(&self.known, collection)?;
        let data = self.data.lock().expect("store lock poisoned");
        Ok(data
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Value>> {
        check_collection(&self.known, collection)?;
        let data = self.data.lock().expect("store lock poisoned");
        Ok(data
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn begin(&self) -> StoreResult<Box<dyn AtomicWrite>> {
        Ok(Box::new(MemoryAtomicWrite {
            known: Arc::clone(&self.known),
            data: Arc::clone(&self.data),
            staged: Vec::new(),
        }))
    }
}

// =============================================================================
// Atomic Write
// =============================================================================

enum Staged {
    Put {
        collection: String,
        id: String,
        value: Value,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// Stages writes and applies them under one lock on commit.
struct MemoryAtomicWrite {
    known: Arc<HashSet<String>>,
    data: Arc<Mutex<Collections>>,
    staged: Vec<Staged>,
}

#[async_trait]
impl AtomicWrite for MemoryAtomicWrite {
    async fn put(&mut self, collection: &str, id: &str, value: &Value) -> StoreResult<()> {
        check_collection(&self.known, collection)?;
        self.staged.push(Staged::Put {
            collection: collection.to_string(),
            id: id.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    async fn delete(&mut self, collection: &str, id: &str) -> StoreResult<()> {
        check_collection(&self.known, collection)?;
        self.staged.push(Staged::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut data = self.data.lock().expect("store lock poisoned");
        for staged in self.staged {
            match staged {
                Staged::Put {
                    collection,
                    id,
                    value,
                } => {
                    data.entry(collection).or_default().insert(id, value);
                }
                Staged::Delete { collection, id } => {
                    if let Some(records) = data.get_mut(&collection) {
                        records.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }

    async fn abort(self: Box<Self>) -> StoreResult<()> {
        // Staged writes simply drop.
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
