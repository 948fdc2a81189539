//! # atlas-core: Pure Data Model for Atlas POS
//!
//! This crate is the shared vocabulary of the offline-first core. It
//! contains the record envelope, transactions, sync state, the
//! print-job model, and the POS domain types, as pure data with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atlas POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │               ★ atlas-core (THIS CRATE) ★                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌─────────────┐  ┌───────────┐  ┌──────────┐   │    │
//! │  │   │  record   │  │ transaction │  │    job    │  │  types   │   │    │
//! │  │   │ envelope  │  │  Operation  │  │ PrintJob  │  │ Product  │   │    │
//! │  │   │ versions  │  │ Transaction │  │ Priority  │  │  Order   │   │    │
//! │  │   └───────────┘  └─────────────┘  └───────────┘  └──────────┘   │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       ▲                    ▲                    ▲                       │
//! │       │                    │                    │                       │
//! │  atlas-store          atlas-sync           atlas-jobs                   │
//! │  (local store +       (queue drain,        (print queue +              │
//! │   coordinator)         conflicts)           worker)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **One envelope**: every persisted record carries id / timestamps /
//!    version / tombstone, and versions move by exactly 1 per update
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer money**: all monetary values are cents (i64)
//! 4. **Explicit errors**: typed errors, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod job;
pub mod money;
pub mod record;
pub mod sync;
pub mod transaction;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{RecordError, ValidationError};
pub use job::{JobPriority, JobStatus, PrintJob, PrintPayload, TicketLine, DEFAULT_MAX_RETRIES};
pub use money::Money;
pub use record::{collections, RecordMeta};
pub use sync::{Conflict, ConflictResolution, SyncReport, SyncStatus};
pub use transaction::{Operation, OperationKind, Transaction, TransactionStatus};
pub use types::{Order, OrderItem, OrderStatus, Product};
