//! # Error Types
//!
//! Domain-specific error types for atlas-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  atlas-core errors (this file)                                          │
//! │  ├── ValidationError  - Input validation failures                       │
//! │  └── RecordError      - Malformed record envelopes                      │
//! │                                                                         │
//! │  atlas-store errors (separate crate)                                    │
//! │  └── StoreError       - Storage / commit failures                       │
//! │                                                                         │
//! │  atlas-sync errors (separate crate)                                     │
//! │  └── SyncError        - Cycle guard, connectivity, remote failures      │
//! │                                                                         │
//! │  atlas-jobs errors (separate crate)                                     │
//! │  └── JobError         - Queue / retry rule violations                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (collection, id, field)
//! 3. Errors are enum variants, never bare strings

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a command's input doesn't meet requirements.
/// Used for early validation before anything is persisted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// A list that must carry at least one element is empty.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },
}

// =============================================================================
// Record Error
// =============================================================================

/// Errors raised when a raw stored record doesn't carry a valid envelope.
///
/// The store persists records as JSON values; the sync engine and the
/// conflict resolver need to read the envelope (`id`, `updatedAt`,
/// `version`) back out of arbitrary payloads. A record that fails this
/// is corrupt or was written by something other than the coordinator.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record is missing a required envelope field.
    #[error("record is missing required field '{0}'")]
    MissingField(&'static str),

    /// An envelope field is present but has the wrong shape.
    #[error("record field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
