//! # Local Interaction Detection
//!
//! A coarse pairwise check used when the remote interaction service is
//! unavailable. It only knows what the catalog's `drug_interactions` lists
//! say; it is not a clinical decision engine.
//!
//! ## Rule
//! ```text
//! For every unordered pair (a, b) of the selected records:
//!
//!   a.drug_interactions (or _bn) mentions b.generic_name or b.brand_name
//!                       OR
//!   b.drug_interactions (or _bn) mentions a.generic_name or a.brand_name
//!
//!   → one InteractionPair { a.id, b.id, reasons }
//! ```
//! "Mentions" is a case-insensitive substring test in either direction, so
//! an entry `"Clopidogrel"` flags `generic_name = "Clopidogrel Bisulfate"`
//! and an entry `"Losartan"` flags `"Losartan Potassium"`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::MedicineRecord;

/// One interacting pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InteractionPair {
    pub first_id: String,
    pub second_id: String,
    /// The interaction entries that triggered the match, as written in the
    /// catalog.
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Result of checking a set of medicines against each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InteractionReport {
    #[serde(default)]
    pub pairs: Vec<InteractionPair>,
    /// Number of records that took part in the check.
    #[serde(default)]
    pub checked: usize,
}

impl InteractionReport {
    pub fn has_interactions(&self) -> bool {
        !self.pairs.is_empty()
    }

    /// Pairs that involve `id`.
    pub fn involving<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a InteractionPair> {
        self.pairs
            .iter()
            .filter(move |p| p.first_id == id || p.second_id == id)
    }
}

/// Checks every unordered pair in `records`.
///
/// Pairs come out in input order (`(0,1), (0,2), …, (1,2), …`). A record
/// never interacts with itself, and a record listed twice is only checked
/// once.
pub fn detect_interactions(records: &[&MedicineRecord]) -> InteractionReport {
    let mut unique: Vec<&MedicineRecord> = Vec::with_capacity(records.len());
    for record in records {
        if !unique.iter().any(|r| r.id == record.id) {
            unique.push(record);
        }
    }

    let mut pairs = Vec::new();
    for (i, a) in unique.iter().enumerate() {
        for b in &unique[i + 1..] {
            let mut reasons = mentions(a, b);
            for reason in mentions(b, a) {
                if !reasons.contains(&reason) {
                    reasons.push(reason);
                }
            }

            if !reasons.is_empty() {
                pairs.push(InteractionPair {
                    first_id: a.id.clone(),
                    second_id: b.id.clone(),
                    reasons,
                });
            }
        }
    }

    InteractionReport {
        pairs,
        checked: unique.len(),
    }
}

/// Entries of `source`'s interaction lists that name `target`.
fn mentions(source: &MedicineRecord, target: &MedicineRecord) -> Vec<String> {
    let names: Vec<String> = [
        Some(target.generic_name.as_str()),
        Some(target.brand_name.as_str()),
        target.generic_name_bn.as_deref(),
        target.brand_name_bn.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .map(str::to_lowercase)
    .collect();

    source
        .drug_interactions
        .iter()
        .chain(source.drug_interactions_bn.iter())
        .filter(|entry| {
            let entry = entry.trim().to_lowercase();
            !entry.is_empty()
                && names
                    .iter()
                    .any(|name| entry.contains(name.as_str()) || name.contains(entry.as_str()))
        })
        .cloned()
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
