//! # atlas-jobs: Durable Print-Job Queue
//!
//! The generalized durable task queue of Atlas POS, instantiated for
//! print jobs: priority-ordered, retry-with-backoff, single serial
//! worker, terminal states kept forever for audit.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         atlas-jobs                                      │
//! │                                                                         │
//! │  domain event (order placed) ──► PrintQueue::enqueue(priority, payload) │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                        print_jobs collection (atlas-store,              │
//! │                        committed like any other record)                 │
//! │                                        │                                │
//! │                                        ▼                                │
//! │  PrintWorker loop ──► pop highest priority ──► Printer (injected)       │
//! │        │                                                                │
//! │        └── one job processing at a time, retries with 2^n backoff       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because jobs ride the transaction coordinator, enqueueing while
//! offline behaves exactly like any other offline write: committed
//! locally, queued for sync, printed regardless. Printing never waits
//! for the network.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod printer;
pub mod queue;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{JobError, JobResult};
pub use printer::{LoggingPrinter, PrintError, Printer};
pub use queue::PrintQueue;
pub use worker::{PrintWorker, PrintWorkerHandle, WorkerConfig};

// The job model itself lives in atlas-core.
pub use atlas_core::{JobPriority, JobStatus, PrintJob, PrintPayload, TicketLine};
