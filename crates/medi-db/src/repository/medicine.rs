//! # Medicine Repository
//!
//! Canonical catalog rows: idempotent batch upsert and the read queries the
//! lookup facade delegates to.
//!
//! ## Upsert Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 upsert_batch(rows)  ─  ONE transaction                  │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   for row in rows:                                                      │
//! │     SELECT 1 WHERE id = row.id      → counts inserted vs updated        │
//! │     INSERT … ON CONFLICT(id) DO UPDATE SET <every column but created_at>│
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure (CHECK price_min <= price_max, I/O, …) → ROLLBACK:         │
//! │  the batch applies entirely or not at all.                              │
//! │                                                                         │
//! │  Re-running the same batch: inserted = 0, updated = n, no duplicates.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! List fields are stored as JSON arrays in TEXT columns.

use chrono::{DateTime, Utc};
use medi_core::wire::{RemoteMedicineRow, SearchFilters};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Column list shared by every query, in `medicines` table order.
macro_rules! medicine_columns {
    () => {
        "id, generic_name, generic_name_bn, brand_name, \
         brand_name_bn, manufacturer, manufacturer_bn, strength, \
         form, form_bn, therapeutic_class, therapeutic_class_bn, \
         indication, indication_bn, alternatives, price_min, \
         price_max, currency, prescription_required, common_dosage, \
         common_dosage_bn, side_effects, side_effects_bn, contraindications, \
         contraindications_bn, drug_interactions, drug_interactions_bn, storage_instructions, \
         storage_instructions_bn, warnings_precautions, warnings_precautions_bn, pregnancy_category, \
         pregnancy_info, pregnancy_info_bn, lactation_info, lactation_info_bn, \
         product_images, keywords, is_active, created_at, \
         updated_at"
    };
}

/// True when any element of the JSON array column `$col` matches the LIKE
/// pattern `$pat`. Matching the raw TEXT would see JSON escaping (`\"`,
/// `\\`) and could match across element boundaries.
macro_rules! list_contains {
    ($col:literal, $pat:literal) => {
        concat!(
            "EXISTS (SELECT 1 FROM json_each(medicines.",
            $col,
            ") WHERE json_each.value LIKE ",
            $pat,
            " ESCAPE '\\')"
        )
    };
}

const UPSERT_SQL: &str = concat!(
    "INSERT INTO medicines (",
    medicine_columns!(),
    ") VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, \
     ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
     ON CONFLICT(id) DO UPDATE SET \
     generic_name = excluded.generic_name, \
     generic_name_bn = excluded.generic_name_bn, \
     brand_name = excluded.brand_name, \
     brand_name_bn = excluded.brand_name_bn, \
     manufacturer = excluded.manufacturer, \
     manufacturer_bn = excluded.manufacturer_bn, \
     strength = excluded.strength, \
     form = excluded.form, \
     form_bn = excluded.form_bn, \
     therapeutic_class = excluded.therapeutic_class, \
     therapeutic_class_bn = excluded.therapeutic_class_bn, \
     indication = excluded.indication, \
     indication_bn = excluded.indication_bn, \
     alternatives = excluded.alternatives, \
     price_min = excluded.price_min, \
     price_max = excluded.price_max, \
     currency = excluded.currency, \
     prescription_required = excluded.prescription_required, \
     common_dosage = excluded.common_dosage, \
     common_dosage_bn = excluded.common_dosage_bn, \
     side_effects = excluded.side_effects, \
     side_effects_bn = excluded.side_effects_bn, \
     contraindications = excluded.contraindications, \
     contraindications_bn = excluded.contraindications_bn, \
     drug_interactions = excluded.drug_interactions, \
     drug_interactions_bn = excluded.drug_interactions_bn, \
     storage_instructions = excluded.storage_instructions, \
     storage_instructions_bn = excluded.storage_instructions_bn, \
     warnings_precautions = excluded.warnings_precautions, \
     warnings_precautions_bn = excluded.warnings_precautions_bn, \
     pregnancy_category = excluded.pregnancy_category, \
     pregnancy_info = excluded.pregnancy_info, \
     pregnancy_info_bn = excluded.pregnancy_info_bn, \
     lactation_info = excluded.lactation_info, \
     lactation_info_bn = excluded.lactation_info_bn, \
     product_images = excluded.product_images, \
     keywords = excluded.keywords, \
     is_active = excluded.is_active, \
     updated_at = excluded.updated_at"
);

const SELECT_BY_ID_SQL: &str = concat!(
    "SELECT ",
    medicine_columns!(),
    " FROM medicines WHERE id = ?1"
);

// ?1 substring pattern (or NULL for "no text filter"), ?2..?5 filters,
// ?6 lower-cased query for the exact-name tier, ?7 limit, ?8 offset.
const SEARCH_SQL: &str = concat!(
    "SELECT ",
    medicine_columns!(),
    " FROM medicines \
     WHERE is_active = 1 \
       AND (?1 IS NULL \
            OR generic_name LIKE ?1 ESCAPE '\\' \
            OR brand_name LIKE ?1 ESCAPE '\\' \
            OR generic_name_bn LIKE ?1 ESCAPE '\\' \
            OR brand_name_bn LIKE ?1 ESCAPE '\\' \
            OR manufacturer LIKE ?1 ESCAPE '\\' \
            OR therapeutic_class LIKE ?1 ESCAPE '\\' OR ",
    list_contains!("indication", "?1"),
    " OR ",
    list_contains!("indication_bn", "?1"),
    " OR ",
    list_contains!("keywords", "?1"),
    " OR ",
    list_contains!("alternatives", "?1"),
    ") \
       AND (?2 IS NULL OR therapeutic_class LIKE ?2 ESCAPE '\\') \
       AND (?3 IS NULL OR form = ?3 COLLATE NOCASE) \
       AND (?4 IS NULL OR prescription_required = ?4) \
       AND (?5 IS NULL OR manufacturer LIKE ?5 ESCAPE '\\') \
     ORDER BY CASE WHEN brand_name = ?6 COLLATE NOCASE \
                     OR generic_name = ?6 COLLATE NOCASE THEN 0 ELSE 1 END, \
              rowid \
     LIMIT ?7 OFFSET ?8"
);

const SELECT_BY_GENERIC_SQL: &str = concat!(
    "SELECT ",
    medicine_columns!(),
    " FROM medicines \
     WHERE is_active = 1 AND generic_name = ?1 COLLATE NOCASE \
     ORDER BY rowid"
);

const SELECT_BY_INDICATION_SQL: &str = concat!(
    "SELECT ",
    medicine_columns!(),
    " FROM medicines \
     WHERE is_active = 1 AND (",
    list_contains!("indication", "?1"),
    " OR ",
    list_contains!("indication_bn", "?1"),
    ") ORDER BY rowid"
);

// =============================================================================
// Outcome
// =============================================================================

/// How many rows of a batch were new and how many overwrote existing ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub inserted: usize,
    pub updated: usize,
}

impl UpsertOutcome {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// One `medicines` row as SQLite returns it (lists still JSON text).
#[derive(Debug, sqlx::FromRow)]
struct MedicineRow {
    id: String,
    generic_name: String,
    generic_name_bn: Option<String>,
    brand_name: String,
    brand_name_bn: Option<String>,
    manufacturer: String,
    manufacturer_bn: Option<String>,
    strength: String,
    form: String,
    form_bn: Option<String>,
    therapeutic_class: String,
    therapeutic_class_bn: Option<String>,
    indication: String,
    indication_bn: String,
    alternatives: String,
    price_min: i64,
    price_max: i64,
    currency: String,
    prescription_required: bool,
    common_dosage: String,
    common_dosage_bn: Option<String>,
    side_effects: String,
    side_effects_bn: String,
    contraindications: String,
    contraindications_bn: String,
    drug_interactions: String,
    drug_interactions_bn: String,
    storage_instructions: String,
    storage_instructions_bn: Option<String>,
    warnings_precautions: String,
    warnings_precautions_bn: String,
    pregnancy_category: Option<String>,
    pregnancy_info: String,
    pregnancy_info_bn: Option<String>,
    lactation_info: String,
    lactation_info_bn: Option<String>,
    product_images: String,
    keywords: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MedicineRow {
    fn into_wire(self) -> DbResult<RemoteMedicineRow> {
        Ok(RemoteMedicineRow {
            id: self.id,
            generic_name: self.generic_name,
            generic_name_bn: self.generic_name_bn,
            brand_name: self.brand_name,
            brand_name_bn: self.brand_name_bn,
            manufacturer: self.manufacturer,
            manufacturer_bn: self.manufacturer_bn,
            strength: self.strength,
            form: self.form,
            form_bn: self.form_bn,
            therapeutic_class: self.therapeutic_class,
            therapeutic_class_bn: self.therapeutic_class_bn,
            indication: decode_list(&self.indication)?,
            indication_bn: decode_list(&self.indication_bn)?,
            alternatives: decode_list(&self.alternatives)?,
            price_min: self.price_min,
            price_max: self.price_max,
            currency: self.currency,
            prescription_required: self.prescription_required,
            common_dosage: self.common_dosage,
            common_dosage_bn: self.common_dosage_bn,
            side_effects: decode_list(&self.side_effects)?,
            side_effects_bn: decode_list(&self.side_effects_bn)?,
            contraindications: decode_list(&self.contraindications)?,
            contraindications_bn: decode_list(&self.contraindications_bn)?,
            drug_interactions: decode_list(&self.drug_interactions)?,
            drug_interactions_bn: decode_list(&self.drug_interactions_bn)?,
            storage_instructions: self.storage_instructions,
            storage_instructions_bn: self.storage_instructions_bn,
            warnings_precautions: decode_list(&self.warnings_precautions)?,
            warnings_precautions_bn: decode_list(&self.warnings_precautions_bn)?,
            pregnancy_category: self.pregnancy_category,
            pregnancy_info: self.pregnancy_info,
            pregnancy_info_bn: self.pregnancy_info_bn,
            lactation_info: self.lactation_info,
            lactation_info_bn: self.lactation_info_bn,
            product_images: decode_list(&self.product_images)?,
            keywords: decode_list(&self.keywords)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn decode_list(json: &str) -> DbResult<Vec<String>> {
    Ok(serde_json::from_str(json)?)
}

fn encode_list(list: &[String]) -> DbResult<String> {
    Ok(serde_json::to_string(list)?)
}

/// `%term%` with LIKE wildcards in `term` escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn into_wire_rows(rows: Vec<MedicineRow>) -> DbResult<Vec<RemoteMedicineRow>> {
    rows.into_iter().map(MedicineRow::into_wire).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for canonical medicine rows.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.medicines();
///
/// let outcome = repo.upsert_batch(&rows).await?;
/// let hits = repo.search("napa", 10, 0, &SearchFilters::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    /// Creates a new MedicineRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    /// Inserts or overwrites every row of the batch, keyed by `id`.
    ///
    /// ## Returns
    /// * `Ok(UpsertOutcome)` - how many rows were new vs overwritten
    /// * `Err(DbError)` - nothing from this batch was written
    pub async fn upsert_batch(&self, rows: &[RemoteMedicineRow]) -> DbResult<UpsertOutcome> {
        let mut outcome = UpsertOutcome::default();
        if rows.is_empty() {
            return Ok(outcome);
        }

        debug!(size = rows.len(), "Upserting medicine batch");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for row in rows {
            let existing: Option<i64> = sqlx::query_scalar("SELECT 1 FROM medicines WHERE id = ?1")
                .bind(&row.id)
                .fetch_optional(&mut *tx)
                .await?;

            sqlx::query(UPSERT_SQL)
                .bind(&row.id)
                .bind(&row.generic_name)
                .bind(&row.generic_name_bn)
                .bind(&row.brand_name)
                .bind(&row.brand_name_bn)
                .bind(&row.manufacturer)
                .bind(&row.manufacturer_bn)
                .bind(&row.strength)
                .bind(&row.form)
                .bind(&row.form_bn)
                .bind(&row.therapeutic_class)
                .bind(&row.therapeutic_class_bn)
                .bind(encode_list(&row.indication)?)
                .bind(encode_list(&row.indication_bn)?)
                .bind(encode_list(&row.alternatives)?)
                .bind(row.price_min)
                .bind(row.price_max)
                .bind(&row.currency)
                .bind(row.prescription_required)
                .bind(&row.common_dosage)
                .bind(&row.common_dosage_bn)
                .bind(encode_list(&row.side_effects)?)
                .bind(encode_list(&row.side_effects_bn)?)
                .bind(encode_list(&row.contraindications)?)
                .bind(encode_list(&row.contraindications_bn)?)
                .bind(encode_list(&row.drug_interactions)?)
                .bind(encode_list(&row.drug_interactions_bn)?)
                .bind(&row.storage_instructions)
                .bind(&row.storage_instructions_bn)
                .bind(encode_list(&row.warnings_precautions)?)
                .bind(encode_list(&row.warnings_precautions_bn)?)
                .bind(&row.pregnancy_category)
                .bind(&row.pregnancy_info)
                .bind(&row.pregnancy_info_bn)
                .bind(&row.lactation_info)
                .bind(&row.lactation_info_bn)
                .bind(encode_list(&row.product_images)?)
                .bind(encode_list(&row.keywords)?)
                .bind(row.is_active)
                .bind(row.created_at)
                .bind(row.updated_at)
                .execute(&mut *tx)
                .await?;

            if existing.is_some() {
                outcome.updated += 1;
            } else {
                outcome.inserted += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(
            inserted = outcome.inserted,
            updated = outcome.updated,
            "Medicine batch committed"
        );
        Ok(outcome)
    }

    /// Gets a medicine by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<RemoteMedicineRow>> {
        let row = sqlx::query_as::<_, MedicineRow>(SELECT_BY_ID_SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(MedicineRow::into_wire).transpose()
    }

    /// Substring search over names, classes, indications, keywords and
    /// alternatives.
    ///
    /// ## Ordering
    /// Rows whose brand or generic name equals the query (ignoring ASCII
    /// case) first, then insertion order. An empty query lists every active
    /// row that passes the filters.
    pub async fn search(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
        filters: &SearchFilters,
    ) -> DbResult<Vec<RemoteMedicineRow>> {
        let query = query.trim().to_lowercase();

        debug!(query = %query, limit, offset, "Searching medicines");

        let pattern = (!query.is_empty()).then(|| like_pattern(&query));
        let class = filters.therapeutic_class.as_deref().map(like_pattern);
        let form = filters.form.as_deref().map(str::trim);
        let manufacturer = filters.manufacturer.as_deref().map(like_pattern);

        let rows = sqlx::query_as::<_, MedicineRow>(SEARCH_SQL)
            .bind(pattern)
            .bind(class)
            .bind(form)
            .bind(filters.prescription_required)
            .bind(manufacturer)
            .bind(&query)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned medicines");
        into_wire_rows(rows)
    }

    /// Active rows whose generic name equals `generic_name`, ignoring ASCII
    /// case.
    pub async fn get_by_generic(&self, generic_name: &str) -> DbResult<Vec<RemoteMedicineRow>> {
        let rows = sqlx::query_as::<_, MedicineRow>(SELECT_BY_GENERIC_SQL)
            .bind(generic_name.trim())
            .fetch_all(&self.pool)
            .await?;

        into_wire_rows(rows)
    }

    /// Active rows with an indication (or localized indication) containing
    /// `term`. A blank term matches nothing.
    pub async fn get_by_indication(&self, term: &str) -> DbResult<Vec<RemoteMedicineRow>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, MedicineRow>(SELECT_BY_INDICATION_SQL)
            .bind(like_pattern(term))
            .fetch_all(&self.pool)
            .await?;

        into_wire_rows(rows)
    }

    /// Counts active medicines.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medicines WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use medi_core::types::{MedicineRecord, PregnancyCategory, PriceRange};
    use medi_core::wire::to_wire;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn row(id: &str, generic: &str, brand: &str) -> RemoteMedicineRow {
        let mut r = MedicineRecord::new(id, generic, brand);
        r.price_range = PriceRange::from_minor(100, 120);
        r.pregnancy_lactation.category = Some(PregnancyCategory::B);
        r.form = "Tablet".to_string();
        to_wire(&r, at(8))
    }

    async fn repo() -> MedicineRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().medicines()
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("napa"), "%napa%");
        assert_eq!(like_pattern("50%_x"), "%50\\%\\_x%");
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let repo = repo().await;
        let batch = vec![
            row("a", "Paracetamol", "Napa"),
            row("b", "Paracetamol", "Ace"),
            row("c", "Omeprazole", "Seclo"),
        ];

        let first = repo.upsert_batch(&batch).await.unwrap();
        assert_eq!(first, UpsertOutcome { inserted: 3, updated: 0 });

        let second = repo.upsert_batch(&batch).await.unwrap();
        assert_eq!(second, UpsertOutcome { inserted: 0, updated: 3 });
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_get_by_id_roundtrips_row() {
        let repo = repo().await;
        let mut original = row("a", "Paracetamol", "Napa");
        original.indication = vec!["Fever".to_string(), "জ্বর".to_string()];
        original.keywords = vec!["জ্বরের ওষুধ".to_string()];
        original.generic_name_bn = Some("প্যারাসিটামল".to_string());
        repo.upsert_batch(std::slice::from_ref(&original)).await.unwrap();

        let stored = repo.get_by_id("a").await.unwrap().unwrap();
        assert_eq!(stored, original);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_overwrites_but_keeps_created_at() {
        let repo = repo().await;
        repo.upsert_batch(&[row("a", "Paracetamol", "Napa")]).await.unwrap();

        let mut changed = row("a", "Paracetamol", "Napa");
        changed.price_max = 150;
        changed.created_at = at(10);
        changed.updated_at = at(10);
        repo.upsert_batch(&[changed]).await.unwrap();

        let stored = repo.get_by_id("a").await.unwrap().unwrap();
        assert_eq!(stored.price_max, 150);
        assert_eq!(stored.created_at, at(8));
        assert_eq!(stored.updated_at, at(10));
    }

    #[tokio::test]
    async fn test_failing_row_rolls_back_whole_batch() {
        let repo = repo().await;
        let mut bad = row("bad", "Paracetamol", "Broken");
        bad.price_min = 500;

        let err = repo
            .upsert_batch(&[row("a", "Paracetamol", "Napa"), bad])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation { .. }));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_ranks_exact_name_first() {
        let repo = repo().await;
        let mut ace = row("b", "Paracetamol", "Ace");
        ace.alternatives = vec!["Napa".to_string()];
        repo.upsert_batch(&[ace, row("a", "Paracetamol", "Napa")])
            .await
            .unwrap();

        let hits = repo
            .search("NAPA", 10, 0, &SearchFilters::default())
            .await
            .unwrap();
        let ids: Vec<_> = hits.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let paged = repo
            .search("napa", 1, 1, &SearchFilters::default())
            .await
            .unwrap();
        assert_eq!(paged[0].id, "b");
    }

    #[tokio::test]
    async fn test_search_filters() {
        let repo = repo().await;
        let mut rx = row("c", "Amoxicillin", "Moxacil");
        rx.prescription_required = true;
        rx.therapeutic_class = "Penicillin Antibiotic".to_string();
        rx.form = "Capsule".to_string();
        repo.upsert_batch(&[row("a", "Paracetamol", "Napa"), rx])
            .await
            .unwrap();

        let only_rx = SearchFilters {
            prescription_required: Some(true),
            ..Default::default()
        };
        let hits = repo.search("", 10, 0, &only_rx).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "c");

        let capsules = SearchFilters {
            form: Some("capsule".to_string()),
            therapeutic_class: Some("antibiotic".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.search("moxa", 10, 0, &capsules).await.unwrap().len(), 1);
        assert!(repo.search("napa", 10, 0, &capsules).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_generic_and_indication() {
        let repo = repo().await;
        let mut napa = row("a", "Paracetamol", "Napa");
        napa.indication = vec!["Fever".to_string()];
        napa.indication_bn = vec!["জ্বর".to_string()];
        repo.upsert_batch(&[napa, row("b", "paracetamol", "Ace"), row("c", "Omeprazole", "Seclo")])
            .await
            .unwrap();

        let generic: Vec<_> = repo
            .get_by_generic("PARACETAMOL")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(generic, vec!["a", "b"]);

        assert_eq!(repo.get_by_indication("fever").await.unwrap().len(), 1);
        assert_eq!(repo.get_by_indication("জ্বর").await.unwrap().len(), 1);
        assert!(repo.get_by_indication(" ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_columns_match_decoded_elements() {
        let repo = repo().await;
        let mut napa = row("a", "Paracetamol", "Napa");
        napa.keywords = vec!["12\" strip".to_string(), "extra".to_string()];
        napa.indication = vec!["Fever".to_string(), "Headache".to_string()];
        repo.upsert_batch(&[napa]).await.unwrap();

        let none = SearchFilters::default();
        // Stored as `["12\" strip","extra"]`; the quote must match unescaped.
        assert_eq!(repo.search("12\" strip", 10, 0, &none).await.unwrap().len(), 1);
        // Must not match across two elements of the array.
        assert!(repo.search("strip\",\"extra", 10, 0, &none).await.unwrap().is_empty());
        assert!(repo.get_by_indication("fever\",\"head").await.unwrap().is_empty());
        assert_eq!(repo.get_by_indication("headache").await.unwrap().len(), 1);
    }
}
