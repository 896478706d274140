//! # Catalog Store
//!
//! The immutable, in-process collection of medicine records.
//!
//! ## Assembly
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Catalog Store Assembly                             │
//! │                                                                         │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────┐                        │
//! │  │ analgesics │  │ antibiotics│  │ respiratory│  ... partitions        │
//! │  └─────┬──────┘  └─────┬──────┘  └─────┬──────┘                        │
//! │        └───────────────┼───────────────┘                                │
//! │                        ▼                                                │
//! │  CatalogStore::from_partitions(partitions)                             │
//! │        │                                                                │
//! │        ├── validate_record() on every record  ── fail → CoreError      │
//! │        ├── id seen before?                     ── yes  → DuplicateId   │
//! │        ▼                                                                │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  records: Vec<MedicineRecord>   (discovery order, never mutated)│   │
//! │  │  by_id:   HashMap<id, index>                                    │   │
//! │  │  spans:   [(category, start..end)]                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Shared as Arc<CatalogStore>: readers (search) and the sync            │
//! │  orchestrator run concurrently without locks.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::MedicineRecord;
use crate::validation::validate_record;

// =============================================================================
// Partition
// =============================================================================

/// One therapeutic-category slice of the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPartition {
    /// Category key, e.g. `"analgesics"`.
    pub category: String,
    pub records: Vec<MedicineRecord>,
}

impl CatalogPartition {
    pub fn new(category: impl Into<String>, records: Vec<MedicineRecord>) -> Self {
        CatalogPartition {
            category: category.into(),
            records,
        }
    }

    /// Parses a partition from a JSON array of records.
    pub fn from_json(category: impl Into<String>, json: &str) -> CoreResult<Self> {
        let category = category.into();
        let records: Vec<MedicineRecord> =
            serde_json::from_str(json).map_err(|e| CoreError::MalformedPartition {
                partition: category.clone(),
                reason: e.to_string(),
            })?;

        Ok(CatalogPartition { category, records })
    }
}

// =============================================================================
// Catalog Store
// =============================================================================

/// Immutable catalog of medicine records.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    records: Vec<MedicineRecord>,
    index: HashMap<String, usize>,
    spans: Vec<(String, Range<usize>)>,
}

impl CatalogStore {
    /// Builds the store by concatenating `partitions` in order.
    ///
    /// ## Errors
    /// - [`CoreError::InvalidRecord`] if any record fails validation
    /// - [`CoreError::DuplicateId`] if an id appears twice, within a
    ///   partition or across partitions
    pub fn from_partitions(partitions: Vec<CatalogPartition>) -> CoreResult<Self> {
        let total: usize = partitions.iter().map(|p| p.records.len()).sum();
        let mut records = Vec::with_capacity(total);
        let mut index: HashMap<String, usize> = HashMap::with_capacity(total);
        let mut owner: HashMap<String, String> = HashMap::with_capacity(total);
        let mut spans = Vec::with_capacity(partitions.len());

        for partition in partitions {
            let start = records.len();

            for record in partition.records {
                validate_record(&record).map_err(|source| CoreError::InvalidRecord {
                    id: record.id.clone(),
                    partition: partition.category.clone(),
                    source,
                })?;

                if let Some(first) = owner.get(&record.id) {
                    return Err(CoreError::DuplicateId {
                        id: record.id.clone(),
                        first: first.clone(),
                        second: partition.category.clone(),
                    });
                }

                owner.insert(record.id.clone(), partition.category.clone());
                index.insert(record.id.clone(), records.len());
                records.push(record);
            }

            spans.push((partition.category, start..records.len()));
        }

        Ok(CatalogStore {
            records,
            index,
            spans,
        })
    }

    /// Builds the store from the partitions compiled into this crate.
    pub fn bundled() -> CoreResult<Self> {
        Self::from_partitions(crate::bundled::partitions()?)
    }

    /// All records in discovery order.
    pub fn all(&self) -> &[MedicineRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by its exact id.
    pub fn by_id(&self, id: &str) -> Option<&MedicineRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Records whose therapeutic class (or localized class) contains
    /// `substring`, case-insensitive, in discovery order.
    ///
    /// A blank `substring` matches nothing.
    pub fn by_therapeutic_class(&self, substring: &str) -> Vec<&MedicineRecord> {
        let needle = substring.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.records
            .iter()
            .filter(|r| {
                r.therapeutic_class.to_lowercase().contains(&needle)
                    || r
                        .therapeutic_class_bn
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Records with any indication (or localized indication) containing
    /// `term`, case-insensitive, in discovery order.
    ///
    /// A blank `term` matches nothing.
    pub fn by_indication(&self, term: &str) -> Vec<&MedicineRecord> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.records
            .iter()
            .filter(|r| {
                r.indication
                    .iter()
                    .chain(r.indication_bn.iter())
                    .any(|i| i.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// The records that came from one partition.
    pub fn partition(&self, category: &str) -> &[MedicineRecord] {
        self.spans
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, span)| &self.records[span.clone()])
            .unwrap_or(&[])
    }

    /// Partition names in load order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().map(|(name, _)| name.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PregnancyCategory, PriceRange};

    fn record(id: &str, generic: &str, brand: &str) -> MedicineRecord {
        let mut r = MedicineRecord::new(id, generic, brand);
        r.price_range = PriceRange::from_minor(100, 150);
        r.pregnancy_lactation.category = Some(PregnancyCategory::B);
        r
    }

    fn sample_store() -> CatalogStore {
        let mut napa = record("para-napa", "Paracetamol", "Napa");
        napa.therapeutic_class = "Analgesic & Antipyretic".to_string();
        napa.indication = vec!["Fever".to_string(), "Headache".to_string()];
        napa.indication_bn = vec!["জ্বর".to_string()];

        let mut amox = record("amox-moxacil", "Amoxicillin", "Moxacil");
        amox.therapeutic_class = "Penicillin Antibiotic".to_string();
        amox.indication = vec!["Respiratory tract infection".to_string()];

        CatalogStore::from_partitions(vec![
            CatalogPartition::new("analgesics", vec![napa]),
            CatalogPartition::new("antibiotics", vec![amox]),
        ])
        .unwrap()
    }

    #[test]
    fn test_concatenates_partitions_in_order() {
        let store = sample_store();
        assert_eq!(store.len(), 2);
        assert_eq!(store.all()[0].id, "para-napa");
        assert_eq!(store.all()[1].id, "amox-moxacil");
        assert_eq!(store.categories().collect::<Vec<_>>(), vec!["analgesics", "antibiotics"]);
        assert_eq!(store.partition("antibiotics")[0].brand_name, "Moxacil");
        assert!(store.partition("unknown").is_empty());
    }

    #[test]
    fn test_rejects_duplicate_ids_across_partitions() {
        let err = CatalogStore::from_partitions(vec![
            CatalogPartition::new("analgesics", vec![record("dup", "Paracetamol", "Napa")]),
            CatalogPartition::new("antipyretics", vec![record("dup", "Paracetamol", "Ace")]),
        ])
        .unwrap_err();

        match err {
            CoreError::DuplicateId { id, first, second } => {
                assert_eq!(id, "dup");
                assert_eq!(first, "analgesics");
                assert_eq!(second, "antipyretics");
            }
            other => panic!("expected DuplicateId, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_duplicate_ids_within_partition() {
        let result = CatalogStore::from_partitions(vec![CatalogPartition::new(
            "analgesics",
            vec![record("dup", "Paracetamol", "Napa"), record("dup", "Paracetamol", "Ace")],
        )]);
        assert!(matches!(result, Err(CoreError::DuplicateId { .. })));
    }

    #[test]
    fn test_rejects_invalid_record() {
        let mut bad = record("bad", "Paracetamol", "Napa");
        bad.price_range = PriceRange::from_minor(200, 100);

        let result = CatalogStore::from_partitions(vec![CatalogPartition::new("x", vec![bad])]);
        assert!(matches!(result, Err(CoreError::InvalidRecord { .. })));
    }

    #[test]
    fn test_malformed_partition_json() {
        let result = CatalogPartition::from_json("broken", "[{\"id\": 1}]");
        assert!(matches!(result, Err(CoreError::MalformedPartition { .. })));
    }

    #[test]
    fn test_by_id() {
        let store = sample_store();
        assert_eq!(store.by_id("amox-moxacil").map(|r| r.brand_name.as_str()), Some("Moxacil"));
        assert!(store.by_id("missing").is_none());
    }

    #[test]
    fn test_by_therapeutic_class_is_case_insensitive_substring() {
        let store = sample_store();
        let hits = store.by_therapeutic_class("ANTIBIOTIC");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "amox-moxacil");
        assert!(store.by_therapeutic_class("  ").is_empty());
    }

    #[test]
    fn test_by_indication_checks_localized_list() {
        let store = sample_store();
        assert_eq!(store.by_indication("fever")[0].id, "para-napa");
        assert_eq!(store.by_indication("জ্বর")[0].id, "para-napa");
        assert_eq!(store.by_indication("respiratory")[0].id, "amox-moxacil");
        assert!(store.by_indication("diabetes").is_empty());
    }
}
