//! Shared test doubles for this crate's unit tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use atlas_core::Transaction;

use crate::connectivity::ManualConnectivity;
use crate::engine::MemoryEngine;
use crate::remote::{RemoteApi, RemoteError};
use crate::store::LocalStore;

/// Initializes test logging once; `RUST_LOG=debug cargo test` shows it.
pub(crate) fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Scripted remote: records pushes, fails while `fail` is set.
pub(crate) struct ScriptedRemote {
    pub fail: Mutex<bool>,
    pub pushed: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(ScriptedRemote {
            fail: Mutex::new(false),
            pushed: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn push_count(&self) -> usize {
        self.pushed.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteApi for ScriptedRemote {
    async fn push_transaction(&self, transaction: &Transaction) -> Result<(), RemoteError> {
        if *self.fail.lock().unwrap() {
            return Err(RemoteError::Network("connection refused".to_string()));
        }
        self.pushed.lock().unwrap().push(transaction.id.clone());
        Ok(())
    }
}

/// An in-memory store with scripted remote and switchable connectivity.
pub(crate) async fn memory_store(
    online: bool,
) -> (Arc<LocalStore>, Arc<ScriptedRemote>, Arc<ManualConnectivity>) {
    init_tracing();
    let connectivity = ManualConnectivity::new(online);
    let remote = ScriptedRemote::new();
    let store = LocalStore::open(
        Arc::new(MemoryEngine::with_default_collections()),
        connectivity.clone(),
        remote.clone(),
    )
    .await
    .expect("open in-memory store");
    (store, remote, connectivity)
}
