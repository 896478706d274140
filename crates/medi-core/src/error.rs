//! # Error Types
//!
//! Domain-specific error types for medi-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  medi-core errors (this file)                                          │
//! │  ├── CoreError        - Catalog integrity + general domain errors      │
//! │  └── ValidationError  - Field-level validation failures                │
//! │                                                                         │
//! │  medi-db errors (separate crate)                                       │
//! │  └── DbError          - Canonical store failures                       │
//! │                                                                         │
//! │  medi-sync errors (separate crate)                                     │
//! │  ├── RemoteError      - One failed remote call                         │
//! │  └── SyncError        - Config / orchestration failures                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError (fatal at catalog load)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (record id, partition, field)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two records share an id.
    ///
    /// ## When This Occurs
    /// - The same id appears in two bundled partitions
    /// - A partition lists the same id twice
    ///
    /// The Catalog Store refuses to build: a duplicated id would make
    /// `by_id` and the remote upsert silently pick one of the two.
    #[error("Duplicate medicine id '{id}' in partition '{second}' (already defined in '{first}')")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    /// A record failed validation while the catalog was being assembled.
    #[error("Invalid record '{id}' in partition '{partition}': {source}")]
    InvalidRecord {
        id: String,
        partition: String,
        #[source]
        source: ValidationError,
    },

    /// A bundled partition could not be parsed.
    #[error("Bundled partition '{partition}' is malformed: {reason}")]
    MalformedPartition { partition: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true for errors that make the catalog unusable.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            CoreError::DuplicateId { .. }
                | CoreError::InvalidRecord { .. }
                | CoreError::MalformedPartition { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
