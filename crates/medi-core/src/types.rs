//! # Domain Types
//!
//! Core domain types shared by the catalog, the search engine, the sync
//! orchestrator and the UI.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────────┐   ┌──────────────────┐                   │
//! │  │      MedicineRecord      │   │    SyncResult    │                   │
//! │  │  ──────────────────────  │   │  ──────────────  │                   │
//! │  │  id (stable, unique)     │   │  total_processed │                   │
//! │  │  generic / brand (+_bn)  │   │  inserted        │                   │
//! │  │  classification (+_bn)   │   │  updated         │                   │
//! │  │  clinical lists (+_bn)   │   │  errors          │                   │
//! │  │  PriceRange ─────────────┼─► │  error_details   │                   │
//! │  │  PregnancyLactation      │   │  duration_ms     │                   │
//! │  │  alternatives            │   └──────────────────┘                   │
//! │  └──────────────────────────┘   ┌──────────────────┐                   │
//! │                                 │   SyncProgress   │                   │
//! │  ┌──────────────────────────┐   │  ──────────────  │                   │
//! │  │    PregnancyCategory     │   │  current / total │                   │
//! │  │    A < B < C < D < X     │   │  percentage      │                   │
//! │  └──────────────────────────┘   └──────────────────┘                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Localized Fields
//! The catalog is bilingual. Every localized variant carries the `_bn`
//! suffix (Bengali). Localized scalars are `Option<String>`, localized lists
//! are `Vec<String>` defaulting to empty.
//!
//! ## No Absent Lists
//! Every list field is `#[serde(default)]`, so a record deserialized from a
//! partition or a remote row always has a (possibly empty) `Vec`. Consumers
//! never need a null check.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Price Range
// =============================================================================

/// Retail price range for one pack, in minor currency units.
///
/// ## Invariant
/// `min <= max`, both non-negative. Enforced by
/// [`validate_record`](crate::validation::validate_record) at catalog load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceRange {
    pub min: Money,
    pub max: Money,
}

impl PriceRange {
    /// Creates a price range from minor units.
    pub const fn from_minor(min: i64, max: i64) -> Self {
        PriceRange {
            min: Money::from_minor(min),
            max: Money::from_minor(max),
        }
    }

    /// Returns true when `0 <= min <= max`.
    pub fn is_well_formed(&self) -> bool {
        !self.min.is_negative() && self.min <= self.max
    }
}

// =============================================================================
// Pregnancy Category
// =============================================================================

/// Pregnancy risk category on the five-step ordinal scale.
///
/// Ordering follows risk: `A < B < C < D < X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PregnancyCategory {
    A,
    B,
    C,
    D,
    X,
}

impl PregnancyCategory {
    /// Single-letter code used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            PregnancyCategory::A => "A",
            PregnancyCategory::B => "B",
            PregnancyCategory::C => "C",
            PregnancyCategory::D => "D",
            PregnancyCategory::X => "X",
        }
    }

    /// Parses a wire code, case-insensitive. Unknown codes yield `None`.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" => Some(PregnancyCategory::A),
            "B" => Some(PregnancyCategory::B),
            "C" => Some(PregnancyCategory::C),
            "D" => Some(PregnancyCategory::D),
            "X" => Some(PregnancyCategory::X),
            _ => None,
        }
    }
}

impl fmt::Display for PregnancyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pregnancy and lactation guidance.
///
/// `category` is mandatory for bundled records; rows coming back from the
/// remote store may carry an unknown code, which decodes to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PregnancyLactation {
    #[serde(default)]
    pub category: Option<PregnancyCategory>,
    #[serde(default)]
    pub pregnancy_info: String,
    #[serde(default)]
    pub pregnancy_info_bn: Option<String>,
    #[serde(default)]
    pub lactation_info: String,
    #[serde(default)]
    pub lactation_info_bn: Option<String>,
}

// =============================================================================
// Medicine Record
// =============================================================================

/// One medicine in the catalog.
///
/// ## Identity
/// `id` is stable and globally unique. Brand names are NOT unique (the same
/// brand can exist in several strengths), so nothing keys on them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MedicineRecord {
    /// Stable identifier, e.g. `"para-napa-500"`.
    pub id: String,

    // --- Naming -------------------------------------------------------------
    pub generic_name: String,
    #[serde(default)]
    pub generic_name_bn: Option<String>,
    pub brand_name: String,
    #[serde(default)]
    pub brand_name_bn: Option<String>,
    /// Search-only keywords in the localized language.
    #[serde(default)]
    pub keywords_bn: Vec<String>,

    // --- Classification -----------------------------------------------------
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub manufacturer_bn: Option<String>,
    #[serde(default)]
    pub therapeutic_class: String,
    #[serde(default)]
    pub therapeutic_class_bn: Option<String>,
    /// Dosage form: tablet, syrup, inhaler, ...
    #[serde(default)]
    pub form: String,
    #[serde(default)]
    pub form_bn: Option<String>,
    /// Strength as printed on the pack, e.g. `"500 mg"`.
    #[serde(default)]
    pub strength: String,

    // --- Clinical -----------------------------------------------------------
    #[serde(default)]
    pub indication: Vec<String>,
    #[serde(default)]
    pub indication_bn: Vec<String>,
    #[serde(default)]
    pub side_effects: Vec<String>,
    #[serde(default)]
    pub side_effects_bn: Vec<String>,
    #[serde(default)]
    pub contraindications: Vec<String>,
    #[serde(default)]
    pub contraindications_bn: Vec<String>,
    #[serde(default)]
    pub drug_interactions: Vec<String>,
    #[serde(default)]
    pub drug_interactions_bn: Vec<String>,
    #[serde(default)]
    pub warnings_precautions: Vec<String>,
    #[serde(default)]
    pub warnings_precautions_bn: Vec<String>,
    #[serde(default)]
    pub pregnancy_lactation: PregnancyLactation,

    // --- Commercial ---------------------------------------------------------
    #[serde(default)]
    pub price_range: PriceRange,
    #[serde(default)]
    pub prescription_required: bool,
    #[serde(default)]
    pub common_dosage: String,
    #[serde(default)]
    pub common_dosage_bn: Option<String>,
    #[serde(default)]
    pub storage_instructions: String,
    #[serde(default)]
    pub storage_instructions_bn: Option<String>,
    #[serde(default)]
    pub product_images: Vec<String>,

    // --- Relationships ------------------------------------------------------
    /// Brand names sharing the same generic compound.
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl MedicineRecord {
    /// Creates a record with the identity fields set and everything else
    /// empty. Mostly useful for tests and fixtures.
    pub fn new(
        id: impl Into<String>,
        generic_name: impl Into<String>,
        brand_name: impl Into<String>,
    ) -> Self {
        MedicineRecord {
            id: id.into(),
            generic_name: generic_name.into(),
            brand_name: brand_name.into(),
            ..Default::default()
        }
    }

    /// Returns true if `name` equals the brand or generic name, ignoring case.
    ///
    /// `name` must already be lower-cased (the search engine normalizes the
    /// query once, not per record).
    pub fn is_named(&self, name: &str) -> bool {
        self.brand_name.to_lowercase() == name || self.generic_name.to_lowercase() == name
    }
}

// =============================================================================
// Sync Result
// =============================================================================

/// Error entry for one record (or `"*"` for a run-level failure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SyncErrorDetail {
    pub id: String,
    pub message: String,
}

impl SyncErrorDetail {
    /// Id used for run-level (non per-record) failures.
    pub const RUN_LEVEL_ID: &'static str = "*";

    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        SyncErrorDetail {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// Outcome of one synchronization run.
///
/// Created fresh per run and handed back to the caller; the core never
/// persists it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SyncResult {
    /// True iff `errors == 0`.
    pub success: bool,
    pub total_processed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub errors: usize,
    #[serde(default)]
    pub error_details: Vec<SyncErrorDetail>,
    #[ts(type = "number")]
    pub duration_ms: u64,
}

impl SyncResult {
    /// A run that failed before or outside batch processing.
    pub fn run_failure(message: impl Into<String>, duration_ms: u64) -> Self {
        SyncResult {
            success: false,
            errors: 1,
            error_details: vec![SyncErrorDetail::new(SyncErrorDetail::RUN_LEVEL_ID, message)],
            duration_ms,
            ..Default::default()
        }
    }
}

// =============================================================================
// Sync Progress
// =============================================================================

/// Fire-and-forget progress snapshot emitted after every batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SyncProgress {
    /// Records attempted so far (success or not).
    pub current: usize,
    pub total: usize,
    /// `0..=100`.
    pub percentage: u8,
    pub status: String,
}

impl SyncProgress {
    /// Builds a snapshot; the percentage is derived, never passed in.
    pub fn new(current: usize, total: usize, status: impl Into<String>) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            (current.min(total) * 100 / total) as u8
        };

        SyncProgress {
            current,
            total,
            percentage,
            status: status.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_range_well_formed() {
        assert!(PriceRange::from_minor(100, 200).is_well_formed());
        assert!(PriceRange::from_minor(0, 0).is_well_formed());
        assert!(!PriceRange::from_minor(300, 200).is_well_formed());
        assert!(!PriceRange::from_minor(-1, 200).is_well_formed());
    }

    #[test]
    fn test_pregnancy_category_order_and_parse() {
        assert!(PregnancyCategory::A < PregnancyCategory::B);
        assert!(PregnancyCategory::D < PregnancyCategory::X);
        assert_eq!(PregnancyCategory::parse("c"), Some(PregnancyCategory::C));
        assert_eq!(PregnancyCategory::parse(" X "), Some(PregnancyCategory::X));
        assert_eq!(PregnancyCategory::parse("N"), None);
    }

    #[test]
    fn test_missing_lists_deserialize_as_empty() {
        let json = r#"{ "id": "m1", "generic_name": "Paracetamol", "brand_name": "Napa" }"#;
        let record: MedicineRecord = serde_json::from_str(json).unwrap();

        assert!(record.indication.is_empty());
        assert!(record.indication_bn.is_empty());
        assert!(record.alternatives.is_empty());
        assert!(record.keywords_bn.is_empty());
        assert_eq!(record.price_range, PriceRange::default());
    }

    #[test]
    fn test_is_named_is_case_insensitive_on_record_side() {
        let record = MedicineRecord::new("m1", "Paracetamol", "Napa");
        assert!(record.is_named("napa"));
        assert!(record.is_named("paracetamol"));
        assert!(!record.is_named("nap"));
    }

    #[test]
    fn test_progress_percentage() {
        assert_eq!(SyncProgress::new(0, 120, "").percentage, 0);
        assert_eq!(SyncProgress::new(50, 120, "").percentage, 41);
        assert_eq!(SyncProgress::new(120, 120, "").percentage, 100);
        assert_eq!(SyncProgress::new(0, 0, "").percentage, 100);
    }

    #[test]
    fn test_run_failure_result() {
        let result = SyncResult::run_failure("catalog unreadable", 12);
        assert!(!result.success);
        assert_eq!(result.errors, 1);
        assert_eq!(result.error_details[0].id, "*");
    }
}
