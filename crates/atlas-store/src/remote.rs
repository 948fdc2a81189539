//! # Remote API Seam
//!
//! The one contract between the durability core and the remote source
//! of truth: push a committed transaction, learn whether it was
//! acknowledged. The coordinator's inline-sync path and the sync
//! engine's queue drain both go through this trait; atlas-sync provides
//! the HTTP implementation, tests provide scripted doubles.

use async_trait::async_trait;
use thiserror::Error;

use atlas_core::Transaction;

// =============================================================================
// Errors
// =============================================================================

/// Why a transaction push failed.
///
/// Either way the transaction stays (or lands) in the sync queue and is
/// retried on a later cycle; a remote failure is never fatal and never
/// undoes a local commit.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure (unreachable, timeout, bad TLS...).
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered but did not acknowledge the transaction.
    #[error("remote rejected transaction: {0}")]
    Rejected(String),
}

// =============================================================================
// Trait
// =============================================================================

/// Push access to the remote sync endpoint.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Ships one committed transaction; `Ok` means acknowledged.
    async fn push_transaction(&self, transaction: &Transaction) -> Result<(), RemoteError>;
}
