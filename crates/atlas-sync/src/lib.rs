//! # atlas-sync: Sync Engine for Atlas POS
//!
//! Drains the durable queue of committed-but-unsynced transactions
//! against the remote endpoint, one exclusive cycle at a time, and
//! resolves record conflicts deterministically.
//!
//! ## What Lives Here
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         atlas-sync                                      │
//! │                                                                         │
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────────────────────┐      │
//! │  │ SyncEngine  │   │  HttpRemote  │   │  conflict resolution     │      │
//! │  │             │   │              │   │                          │      │
//! │  │ start_sync  │   │ POST /sync   │   │ local / remote / merge   │      │
//! │  │ cycle guard │   │ {success,    │   │ (LWW by updatedAt,       │      │
//! │  │ batching    │   │  error?}     │   │  version = max + 1)      │      │
//! │  │ cadence     │   │              │   │                          │      │
//! │  └─────────────┘   └──────────────┘   └──────────────────────────┘      │
//! │                                                                         │
//! │  Local commits NEVER wait on this crate to succeed; sync failures       │
//! │  only ever show up as status (pending count, error strings).            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod http;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::SyncConfig;
pub use engine::{SyncEngine, SyncEngineHandle};
pub use error::{SyncError, SyncResult};
pub use http::HttpRemote;

// The report type callers match on lives in atlas-core.
pub use atlas_core::{Conflict, ConflictResolution, SyncReport};
