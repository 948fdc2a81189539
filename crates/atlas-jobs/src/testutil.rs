//! Shared test fixtures for this crate's unit tests.

use async_trait::async_trait;
use std::sync::Arc;

use atlas_core::{PrintPayload, Transaction};
use atlas_store::{LocalStore, ManualConnectivity, MemoryEngine, RemoteApi, RemoteError};

use crate::queue::PrintQueue;

/// Remote that acknowledges everything; job tests don't exercise sync.
struct AckRemote;

#[async_trait]
impl RemoteApi for AckRemote {
    async fn push_transaction(&self, _transaction: &Transaction) -> Result<(), RemoteError> {
        Ok(())
    }
}

/// An in-memory store with a print queue over it.
pub(crate) async fn memory_queue() -> (PrintQueue, Arc<LocalStore>) {
    let store = LocalStore::open(
        Arc::new(MemoryEngine::with_default_collections()),
        ManualConnectivity::new(true),
        Arc::new(AckRemote),
    )
    .await
    .expect("open in-memory store");
    (PrintQueue::new(store.clone()), store)
}

/// A minimal valid receipt payload.
pub(crate) fn receipt(order_id: &str) -> PrintPayload {
    PrintPayload::Receipt {
        order_id: order_id.to_string(),
        total_cents: 1199,
    }
}
