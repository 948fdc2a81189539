//! # Sync Error Types
//!
//! Error types for sync cycles and configuration.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐  │
//! │  │   Cycle Guard   │  │  Remote/Store   │  │    Configuration        │  │
//! │  │                 │  │                 │  │                         │  │
//! │  │  AlreadyRunning │  │  Remote         │  │  InvalidConfig          │  │
//! │  │  Offline        │  │  Store          │  │  ConfigLoadFailed       │  │
//! │  │                 │  │  Record         │  │  ConfigSaveFailed       │  │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘  │
//! │                                                                         │
//! │  AlreadyRunning and Offline are raised BEFORE the queue is touched:     │
//! │  a rejected cycle never mutates anything.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use atlas_core::RecordError;
use atlas_store::{RemoteError, StoreError};

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering cycle, remote, and configuration failures.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A sync cycle is already active; at most one runs system-wide.
    #[error("sync already in progress")]
    AlreadyRunning,

    /// Connectivity is down; the cycle was refused before any queue work.
    #[error("cannot sync while offline")]
    Offline,

    /// The remote endpoint failed or rejected a transaction.
    #[error("remote sync failed: {0}")]
    Remote(#[from] RemoteError),

    /// The local store failed underneath the engine.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A conflict carried a record without a valid envelope.
    #[error("invalid record in conflict: {0}")]
    Record(#[from] RecordError),

    /// Invalid sync configuration.
    #[error("invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load the config file.
    #[error("failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save the config file.
    #[error("failed to save config: {0}")]
    ConfigSaveFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}
