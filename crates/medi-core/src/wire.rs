//! # Remote Wire Shape
//!
//! The flat row the canonical store keeps per medicine, and the transforms
//! between it and [`MedicineRecord`].
//!
//! ## Shape Differences
//! ```text
//! ┌──────────────────────────────┐          ┌──────────────────────────────┐
//! │       MedicineRecord         │  to_wire │      RemoteMedicineRow       │
//! │  ──────────────────────────  │ ───────► │  ──────────────────────────  │
//! │  price_range { min, max }    │          │  price_min, price_max        │
//! │                              │          │  currency = "local"          │
//! │  pregnancy_lactation {       │          │  pregnancy_category ("A".."X")│
//! │    category, pregnancy_info, │          │  pregnancy_info(+_bn)        │
//! │    lactation_info (+_bn) }   │          │  lactation_info(+_bn)        │
//! │  keywords_bn                 │          │  keywords                    │
//! │                              │          │  is_active = true            │
//! │                              │          │  created_at = updated_at=now │
//! └──────────────────────────────┘ ◄─────── └──────────────────────────────┘
//!                                  from_wire
//! ```
//!
//! `from_wire` is lenient: null or missing arrays become empty, an unknown
//! pregnancy code becomes `None`. Use [`from_wire_checked`] where a row
//! must satisfy the catalog invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::types::{MedicineRecord, PregnancyCategory, PregnancyLactation, PriceRange};

/// Currency tag written on every row. Prices are minor units of the
/// deployment's local currency.
pub const WIRE_CURRENCY: &str = "local";

/// One medicine as stored by the canonical backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMedicineRow {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub generic_name: String,
    #[serde(default)]
    pub generic_name_bn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand_name: String,
    #[serde(default)]
    pub brand_name_bn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub manufacturer: String,
    #[serde(default)]
    pub manufacturer_bn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strength: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub form: String,
    #[serde(default)]
    pub form_bn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub therapeutic_class: String,
    #[serde(default)]
    pub therapeutic_class_bn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub indication: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub indication_bn: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alternatives: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_min: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_max: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prescription_required: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub common_dosage: String,
    #[serde(default)]
    pub common_dosage_bn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub side_effects: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub side_effects_bn: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contraindications: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contraindications_bn: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub drug_interactions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub drug_interactions_bn: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub storage_instructions: String,
    #[serde(default)]
    pub storage_instructions_bn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub warnings_precautions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub warnings_precautions_bn: Vec<String>,
    #[serde(default)]
    pub pregnancy_category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pregnancy_info: String,
    #[serde(default)]
    pub pregnancy_info_bn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lactation_info: String,
    #[serde(default)]
    pub lactation_info_bn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_images: Vec<String>,
    /// Localized search keywords.
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    WIRE_CURRENCY.to_string()
}

fn default_active() -> bool {
    true
}

/// PostgREST sends `null` for empty columns; treat it like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Search Filters
// =============================================================================

/// Optional narrowing for a canonical-store search. Every `None` field is
/// ignored; text filters are case-insensitive substrings, `form` must match
/// exactly (ignoring case).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub therapeutic_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
}

impl SearchFilters {
    /// True when no filter is set.
    pub fn is_empty(&self) -> bool {
        self.therapeutic_class.is_none()
            && self.form.is_none()
            && self.prescription_required.is_none()
            && self.manufacturer.is_none()
    }

    /// Applies the filters to a local record.
    pub fn matches(&self, record: &MedicineRecord) -> bool {
        let contains = |haystack: &str, needle: &Option<String>| match needle {
            Some(n) => haystack.to_lowercase().contains(&n.trim().to_lowercase()),
            None => true,
        };

        contains(&record.therapeutic_class, &self.therapeutic_class)
            && contains(&record.manufacturer, &self.manufacturer)
            && self
                .form
                .as_deref()
                .map_or(true, |f| record.form.eq_ignore_ascii_case(f.trim()))
            && self
                .prescription_required
                .map_or(true, |rx| record.prescription_required == rx)
    }
}

// =============================================================================
// Transforms
// =============================================================================

/// Builds the upsert row for `record`, stamping both audit fields with `now`.
///
/// The caller supplies `now` so a whole batch shares one timestamp and tests
/// stay deterministic.
pub fn to_wire(record: &MedicineRecord, now: DateTime<Utc>) -> RemoteMedicineRow {
    let pl = &record.pregnancy_lactation;

    RemoteMedicineRow {
        id: record.id.clone(),
        generic_name: record.generic_name.clone(),
        generic_name_bn: record.generic_name_bn.clone(),
        brand_name: record.brand_name.clone(),
        brand_name_bn: record.brand_name_bn.clone(),
        manufacturer: record.manufacturer.clone(),
        manufacturer_bn: record.manufacturer_bn.clone(),
        strength: record.strength.clone(),
        form: record.form.clone(),
        form_bn: record.form_bn.clone(),
        therapeutic_class: record.therapeutic_class.clone(),
        therapeutic_class_bn: record.therapeutic_class_bn.clone(),
        indication: record.indication.clone(),
        indication_bn: record.indication_bn.clone(),
        alternatives: record.alternatives.clone(),
        price_min: record.price_range.min.minor(),
        price_max: record.price_range.max.minor(),
        currency: default_currency(),
        prescription_required: record.prescription_required,
        common_dosage: record.common_dosage.clone(),
        common_dosage_bn: record.common_dosage_bn.clone(),
        side_effects: record.side_effects.clone(),
        side_effects_bn: record.side_effects_bn.clone(),
        contraindications: record.contraindications.clone(),
        contraindications_bn: record.contraindications_bn.clone(),
        drug_interactions: record.drug_interactions.clone(),
        drug_interactions_bn: record.drug_interactions_bn.clone(),
        storage_instructions: record.storage_instructions.clone(),
        storage_instructions_bn: record.storage_instructions_bn.clone(),
        warnings_precautions: record.warnings_precautions.clone(),
        warnings_precautions_bn: record.warnings_precautions_bn.clone(),
        pregnancy_category: pl.category.map(|c| c.as_str().to_string()),
        pregnancy_info: pl.pregnancy_info.clone(),
        pregnancy_info_bn: pl.pregnancy_info_bn.clone(),
        lactation_info: pl.lactation_info.clone(),
        lactation_info_bn: pl.lactation_info_bn.clone(),
        product_images: record.product_images.clone(),
        keywords: record.keywords_bn.clone(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Turns a stored row back into the record shape the UI consumes.
///
/// Audit fields, `currency` and `is_active` have no place in the record and
/// are dropped.
pub fn from_wire(row: RemoteMedicineRow) -> MedicineRecord {
    let category = row.pregnancy_category.as_deref().and_then(PregnancyCategory::parse);

    MedicineRecord {
        id: row.id,
        generic_name: row.generic_name,
        generic_name_bn: row.generic_name_bn,
        brand_name: row.brand_name,
        brand_name_bn: row.brand_name_bn,
        keywords_bn: row.keywords,
        manufacturer: row.manufacturer,
        manufacturer_bn: row.manufacturer_bn,
        therapeutic_class: row.therapeutic_class,
        therapeutic_class_bn: row.therapeutic_class_bn,
        form: row.form,
        form_bn: row.form_bn,
        strength: row.strength,
        indication: row.indication,
        indication_bn: row.indication_bn,
        side_effects: row.side_effects,
        side_effects_bn: row.side_effects_bn,
        contraindications: row.contraindications,
        contraindications_bn: row.contraindications_bn,
        drug_interactions: row.drug_interactions,
        drug_interactions_bn: row.drug_interactions_bn,
        warnings_precautions: row.warnings_precautions,
        warnings_precautions_bn: row.warnings_precautions_bn,
        pregnancy_lactation: PregnancyLactation {
            category,
            pregnancy_info: row.pregnancy_info,
            pregnancy_info_bn: row.pregnancy_info_bn,
            lactation_info: row.lactation_info,
            lactation_info_bn: row.lactation_info_bn,
        },
        price_range: PriceRange::from_minor(row.price_min, row.price_max),
        prescription_required: row.prescription_required,
        common_dosage: row.common_dosage,
        common_dosage_bn: row.common_dosage_bn,
        storage_instructions: row.storage_instructions,
        storage_instructions_bn: row.storage_instructions_bn,
        product_images: row.product_images,
        alternatives: row.alternatives,
    }
}

/// [`from_wire`] that refuses rows breaking the price invariant.
pub fn from_wire_checked(row: RemoteMedicineRow) -> CoreResult<MedicineRecord> {
    if row.price_min < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price_min".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    if row.price_min > row.price_max {
        return Err(ValidationError::OutOfRange {
            field: "price_max".to_string(),
            min: row.price_min,
            max: i64::MAX,
        }
        .into());
    }

    Ok(from_wire(row))
}

// =============================================================================
// Unit Tests
// =============================================================================
