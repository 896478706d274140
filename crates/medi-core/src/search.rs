//! # Search & Ranking Engine
//!
//! Free-text lookup over the Catalog Store.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          search(query, limit)                           │
//! │                                                                         │
//! │  1. normalize_query()      trim + lowercase, < 2 chars → []            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  2. FILTER (substring, not tokens: "cillin" finds "Amoxicillin")       │
//! │     generic / brand (+_bn) · manufacturer · therapeutic class ·        │
//! │     indication (+_bn) · keywords_bn · alternatives                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  3. RANK (stable)                                                       │
//! │     tier 0: brand or generic name EQUALS the query                      │
//! │     tier 1: everything else                                            │
//! │     ties keep catalog order                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  4. TRUNCATE to limit (after ranking, never before)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::types::MedicineRecord;
use crate::validation::normalize_query;

/// Relevance tier; lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    ExactName,
    Substring,
}

/// Read-only search over a shared [`CatalogStore`].
///
/// Cloning is cheap (one `Arc`), and any number of searches can run while a
/// sync reads the same store.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    store: Arc<CatalogStore>,
}

impl SearchEngine {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        SearchEngine { store }
    }

    /// The store this engine searches.
    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    /// Ranked substring search.
    ///
    /// ## Example
    /// ```rust
    /// use std::sync::Arc;
    /// use medi_core::{CatalogStore, SearchEngine};
    ///
    /// let engine = SearchEngine::new(Arc::new(CatalogStore::bundled().unwrap()));
    ///
    /// assert!(engine.search("a", 10).is_empty());
    /// assert!(engine
    ///     .search("cillin", 10)
    ///     .iter()
    ///     .all(|r| r.generic_name.to_lowercase().contains("cillin")));
    /// ```
    pub fn search(&self, query: &str, limit: usize) -> Vec<MedicineRecord> {
        let Some(needle) = normalize_query(query) else {
            return Vec::new();
        };

        let mut hits: Vec<(Tier, &MedicineRecord)> = self
            .store
            .all()
            .iter()
            .filter(|record| matches(record, &needle))
            .map(|record| {
                let tier = if record.is_named(&needle) {
                    Tier::ExactName
                } else {
                    Tier::Substring
                };
                (tier, record)
            })
            .collect();

        // sort_by_key is stable: equal tiers keep catalog order.
        hits.sort_by_key(|(tier, _)| *tier);

        hits.into_iter()
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Every record whose generic name equals `generic_name`, ignoring case,
    /// in catalog order.
    ///
    /// The `alternatives` lists in the data are not consulted: they are not
    /// guaranteed symmetric, and the generic name is the single source of
    /// truth for "same compound".
    pub fn alternatives_for(&self, generic_name: &str) -> Vec<MedicineRecord> {
        let wanted = generic_name.trim().to_lowercase();
        if wanted.is_empty() {
            return Vec::new();
        }

        self.store
            .all()
            .iter()
            .filter(|record| record.generic_name.to_lowercase() == wanted)
            .cloned()
            .collect()
    }
}

/// Substring predicate over every searchable field. `needle` is lower-case.
fn matches(record: &MedicineRecord, needle: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(needle);
    let contains_opt = |field: &Option<String>| field.as_deref().is_some_and(contains);
    let any = |fields: &[String]| fields.iter().any(|f| contains(f.as_str()));

    contains(&record.generic_name)
        || contains(&record.brand_name)
        || contains_opt(&record.generic_name_bn)
        || contains_opt(&record.brand_name_bn)
        || contains(&record.manufacturer)
        || contains(&record.therapeutic_class)
        || any(&record.indication)
        || any(&record.indication_bn)
        || any(&record.keywords_bn)
        || any(&record.alternatives)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogPartition;
    use crate::types::{PregnancyCategory, PriceRange};
    use crate::DEFAULT_SEARCH_LIMIT;

    fn record(id: &str, generic: &str, brand: &str) -> MedicineRecord {
        let mut r = MedicineRecord::new(id, generic, brand);
        r.price_range = PriceRange::from_minor(100, 120);
        r.pregnancy_lactation.category = Some(PregnancyCategory::B);
        r
    }

    fn engine(records: Vec<MedicineRecord>) -> SearchEngine {
        let store = CatalogStore::from_partitions(vec![CatalogPartition::new("test", records)])
            .unwrap();
        SearchEngine::new(Arc::new(store))
    }

    /// Two paracetamol brands where B ("Ace") mentions "napa" only through
    /// its alternatives list.
    fn napa_ace() -> SearchEngine {
        let mut ace = record("b", "Paracetamol", "Ace");
        ace.alternatives = vec!["Napa".to_string()];
        let napa = record("a", "Paracetamol", "Napa");
        engine(vec![ace, napa])
    }

    #[test]
    fn test_short_queries_return_nothing() {
        let engine = napa_ace();
        assert!(engine.search("", DEFAULT_SEARCH_LIMIT).is_empty());
        assert!(engine.search(" ", DEFAULT_SEARCH_LIMIT).is_empty());
        assert!(engine.search("a", DEFAULT_SEARCH_LIMIT).is_empty());
        assert!(!engine.search("ac", DEFAULT_SEARCH_LIMIT).is_empty());
    }

    #[test]
    fn test_exact_brand_match_ranks_first() {
        let results = napa_ace().search("napa", 10);
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        // Ace comes first in the catalog but only matches via alternatives.
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_exact_match_ignores_case() {
        let results = napa_ace().search("  NAPA ", 10);
        assert_eq!(results[0].id, "a");
    }

    #[test]
    fn test_partial_word_matches() {
        let engine = engine(vec![
            record("m1", "Amoxicillin", "Moxacil"),
            record("m2", "Cloxacillin", "Cloxin"),
            record("m3", "Paracetamol", "Napa"),
        ]);
        let ids: Vec<_> = engine.search("cillin", 10).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn test_matches_localized_fields() {
        let mut napa = record("a", "Paracetamol", "Napa");
        napa.brand_name_bn = Some("নাপা".to_string());
        napa.keywords_bn = vec!["জ্বরের ওষুধ".to_string()];
        let engine = engine(vec![napa]);

        assert_eq!(engine.search("নাপা", 10).len(), 1);
        assert_eq!(engine.search("ওষুধ", 10).len(), 1);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let mut records = Vec::new();
        for i in 0..6 {
            let mut r = record(&format!("m{i}"), "Omeprazole", &format!("Brand{i}"));
            r.therapeutic_class = "Proton Pump Inhibitor".to_string();
            records.push(r);
        }
        let engine = engine(records);

        let first: Vec<_> = engine.search("pump", 10).into_iter().map(|r| r.id).collect();
        let second: Vec<_> = engine.search("pump", 10).into_iter().map(|r| r.id).collect();
        assert_eq!(first, vec!["m0", "m1", "m2", "m3", "m4", "m5"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncates_after_ranking() {
        let mut records: Vec<_> = (0..5)
            .map(|i| {
                let mut r = record(&format!("s{i}"), "Other", &format!("Brand{i}"));
                r.indication = vec!["Fever".to_string()];
                r
            })
            .collect();
        // The exact match sits last in catalog order.
        records.push(record("exact", "Fever", "Feverex"));
        let engine = engine(records);

        let results = engine.search("fever", 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "exact");
        assert_eq!(results[1].id, "s0");
    }

    #[test]
    fn test_alternatives_for_uses_generic_name_only() {
        let mut stray = record("c", "Ibuprofen", "Inflam");
        stray.alternatives = vec!["Napa".to_string()];
        let engine = engine(vec![
            record("a", "Paracetamol", "Napa"),
            stray,
            record("b", "paracetamol", "Ace"),
        ]);

        let ids: Vec<_> = engine
            .alternatives_for("PARACETAMOL")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(engine.alternatives_for("").is_empty());
    }

    #[test]
    fn test_bundled_catalog_search() {
        let engine = SearchEngine::new(Arc::new(CatalogStore::bundled().unwrap()));

        let results = engine.search("napa", DEFAULT_SEARCH_LIMIT);
        assert_eq!(results[0].brand_name, "Napa");
        assert!(results.iter().any(|r| r.brand_name == "Napa Extra"));

        let paracetamol = engine.alternatives_for("Paracetamol");
        let brands: Vec<_> = paracetamol.iter().map(|r| r.brand_name.as_str()).collect();
        assert_eq!(brands, vec!["Napa", "Ace"]);
    }
}
