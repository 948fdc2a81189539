//! # Printer Seam
//!
//! The queue manages job *lifecycle*; putting bytes on a device is
//! somebody else's problem, injected through this trait. Protocol
//! encoding, spooling, and device discovery all live behind it.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use atlas_core::PrintJob;

// =============================================================================
// Errors
// =============================================================================

/// Why a print attempt failed.
///
/// Captured into the job's `error_message` and counted against its
/// retry budget; never propagated out of the worker loop.
#[derive(Debug, Error)]
pub enum PrintError {
    /// The device is unreachable.
    #[error("printer offline")]
    Offline,

    /// The device rejected or mangled the job.
    #[error("print failed: {0}")]
    Failed(String),
}

// =============================================================================
// Trait
// =============================================================================

/// An abstract print device.
#[async_trait]
pub trait Printer: Send + Sync {
    /// Prints one job. `Ok` means the output physically happened.
    async fn print(&self, job: &PrintJob) -> Result<(), PrintError>;
}

// =============================================================================
// Logging printer
// =============================================================================

/// A printer that "prints" to the log. Useful for development and for
/// wiring the pipeline before real devices exist.
#[derive(Debug, Default)]
pub struct LoggingPrinter;

#[async_trait]
impl Printer for LoggingPrinter {
    async fn print(&self, job: &PrintJob) -> Result<(), PrintError> {
        info!(id = %job.meta.id, kind = job.kind(), "PRINT {:?}", job.payload);
        Ok(())
    }
}
