//! Catalog partitions compiled into the binary.
//!
//! Each file under `data/` is a JSON array of [`MedicineRecord`]s for one
//! therapeutic category. Adding a category means adding a file and a line
//! to [`BUNDLED`].
//!
//! [`MedicineRecord`]: crate::types::MedicineRecord

use crate::catalog::CatalogPartition;
use crate::error::CoreResult;

/// `(category, json)` in load order.
const BUNDLED: &[(&str, &str)] = &[
    ("analgesics", include_str!("../data/analgesics.json")),
    ("antibiotics", include_str!("../data/antibiotics.json")),
    ("cardiovascular", include_str!("../data/cardiovascular.json")),
    ("respiratory", include_str!("../data/respiratory.json")),
    ("gastrointestinal", include_str!("../data/gastrointestinal.json")),
];

/// Parses every bundled partition.
pub(crate) fn partitions() -> CoreResult<Vec<CatalogPartition>> {
    BUNDLED
        .iter()
        .map(|(category, json)| CatalogPartition::from_json(*category, json))
        .collect()
}
