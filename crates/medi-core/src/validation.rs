//! # Validation Module
//!
//! Validation for catalog records, search queries and the sync tunables.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Catalog load (THIS MODULE)                                   │
//! │  ├── validate_record: ids, names, price ranges, pregnancy category     │
//! │  └── Failure is FATAL: the Catalog Store refuses to build              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Query time (THIS MODULE)                                     │
//! │  ├── normalize_query: trim, lowercase, minimum length                  │
//! │  └── Too short → empty result, never sent to the remote side           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Canonical store                                              │
//! │  ├── PRIMARY KEY (id)                                                  │
//! │  └── CHECK (price_min <= price_max)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use medi_core::validation::normalize_query;
//!
//! assert_eq!(normalize_query("  NaPa "), Some("napa".to_string()));
//! assert_eq!(normalize_query("a"), None);
//! ```

use crate::error::ValidationError;
use crate::types::MedicineRecord;
use crate::{MAX_BATCH_SIZE, MAX_ID_LEN, MAX_QUERY_CHARS, MAX_SYNC_ATTEMPTS, MIN_QUERY_CHARS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a medicine id.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Only ASCII letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use medi_core::validation::validate_medicine_id;
///
/// assert!(validate_medicine_id("para-napa-500").is_ok());
/// assert!(validate_medicine_id("").is_err());
/// assert!(validate_medicine_id("has space").is_err());
/// ```
pub fn validate_medicine_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "id".to_string(),
            max: MAX_ID_LEN,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a full catalog record.
///
/// ## Rules
/// - `id` passes [`validate_medicine_id`]
/// - `generic_name` and `brand_name` are non-empty
/// - `price_range` is non-negative with `min <= max`
/// - a pregnancy category is present
///
/// List fields need no check: serde guarantees they exist.
pub fn validate_record(record: &MedicineRecord) -> ValidationResult<()> {
    validate_medicine_id(&record.id)?;

    if record.generic_name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "generic_name".to_string(),
        });
    }

    if record.brand_name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "brand_name".to_string(),
        });
    }

    let price = record.price_range;
    if price.min.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price_range.min".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if !price.is_well_formed() {
        return Err(ValidationError::OutOfRange {
            field: "price_range.max".to_string(),
            min: price.min.minor(),
            max: i64::MAX,
        });
    }

    if record.pregnancy_lactation.category.is_none() {
        return Err(ValidationError::Required {
            field: "pregnancy_lactation.category".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Query Normalization
// =============================================================================

/// Normalizes a free-text search query.
///
/// ## Rules
/// - Trimmed and lower-cased
/// - Fewer than 2 characters (counted as chars, not bytes) → `None`
/// - Longer than 100 characters → truncated to 100
///
/// ## Why `None` Instead of an Error?
/// A too-short query is not a failure the user needs to see: the search box
/// simply shows nothing until a second character is typed.
pub fn normalize_query(query: &str) -> Option<String> {
    let query = query.trim().to_lowercase();

    if query.chars().count() < MIN_QUERY_CHARS {
        return None;
    }

    if query.chars().count() > MAX_QUERY_CHARS {
        return Some(query.chars().take(MAX_QUERY_CHARS).collect());
    }

    Some(query)
}

/// Strict variant of [`normalize_query`] for callers that must report why a
/// query was rejected.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    normalize_query(query).ok_or_else(|| ValidationError::TooShort {
        field: "query".to_string(),
        min: MIN_QUERY_CHARS,
    })
}

// =============================================================================
// Tunable Validators
// =============================================================================

/// Validates the sync batch size.
///
/// ## Rules
/// - Between 1 and 1000 records
pub fn validate_batch_size(batch_size: usize) -> ValidationResult<()> {
    if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "batch_size".to_string(),
            min: 1,
            max: MAX_BATCH_SIZE as i64,
        });
    }

    Ok(())
}

/// Validates the maximum number of upsert attempts per batch.
///
/// ## Rules
/// - Between 1 and 10 (1 means "no retry")
pub fn validate_max_attempts(max_attempts: u32) -> ValidationResult<()> {
    if max_attempts == 0 || max_attempts > MAX_SYNC_ATTEMPTS {
        return Err(ValidationError::OutOfRange {
            field: "max_attempts".to_string(),
            min: 1,
            max: MAX_SYNC_ATTEMPTS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
