//! # atlas-store: Local Store + Transaction Coordinator
//!
//! The durable, offline-first heart of Atlas POS: a keyed-collection
//! store where every mutation is one atomic multi-record commit, and
//! every commit either reaches the remote endpoint inline or lands in a
//! durable sync queue to be drained later.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     atlas-store Data Flow                               │
//! │                                                                         │
//! │  Command (place order, transition job, resolve conflict)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 LocalStore (coordinator)                        │    │
//! │  │                                                                 │    │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐    │    │
//! │  │   │ StorageEngine│   │  EventBus    │   │ ConnectivityProv.│    │    │
//! │  │   │  (contract)  │   │  (broadcast) │   │  + RemoteApi     │    │    │
//! │  │   └──────┬───────┘   └──────────────┘   └──────────────────┘    │    │
//! │  │          │                                                      │    │
//! │  │    ┌─────┴─────┐                                                │    │
//! │  │    ▼           ▼                                                │    │
//! │  │  SQLite     in-memory                                           │    │
//! │  │  (WAL)      (tests)                                             │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - storage contract + SQLite and in-memory engines
//! - [`store`] - the coordinator: atomic commits, sync routing, queue
//! - [`events`] - typed broadcast events
//! - [`connectivity`] - injected online/offline capability
//! - [`remote`] - the push seam toward the remote endpoint
//! - [`products`] / [`orders`] - the command services a UI consumes
//! - [`migrations`] - embedded SQLite migrations
//! - [`error`] - store error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod connectivity;
pub mod engine;
pub mod error;
pub mod events;
pub mod migrations;
pub mod orders;
pub mod products;
pub mod remote;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use connectivity::{ConnectivityProvider, ManualConnectivity};
pub use engine::{AtomicWrite, MemoryEngine, SqliteEngine, StorageEngine, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use events::{EventBus, StoreEvent};
pub use orders::OrderService;
pub use products::{NewProduct, ProductService};
pub use remote::{RemoteApi, RemoteError};
pub use store::LocalStore;
