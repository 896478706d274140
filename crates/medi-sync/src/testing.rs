//! Test doubles shared by the orchestrator, facade and knowledge tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use medi_core::interactions::InteractionReport;
use medi_core::wire::to_wire;
use medi_core::{
    CatalogPartition, CatalogStore, MedicineRecord, PregnancyCategory, PriceRange,
    RemoteMedicineRow,
};

use crate::error::{RemoteError, RemoteResult};
use crate::remote::{RemoteCatalog, SearchFilters, UpsertOutcome};
use crate::retry::Sleeper;

/// Records every requested sleep instead of waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// A record that passes catalog validation: priced at ৳1.00 to ৳2.50,
/// pregnancy category B.
pub fn record(id: &str, generic: &str, brand: &str) -> MedicineRecord {
    let mut r = MedicineRecord::new(id, generic, brand);
    r.price_range = PriceRange::from_minor(100, 250);
    r.pregnancy_lactation.category = Some(PregnancyCategory::B);
    r
}

/// A store of `count` records with ids `med-000`, `med-001`, ...
pub fn numbered_store(count: usize) -> CatalogStore {
    let records = (0..count)
        .map(|i| record(&format!("med-{i:03}"), "Generic", &format!("Brand {i}")))
        .collect();
    CatalogStore::from_partitions(vec![CatalogPartition::new("test", records)]).unwrap()
}

pub fn napa_ace_store() -> CatalogStore {
    let mut napa = record("a", "Paracetamol", "Napa");
    napa.indication = vec!["Fever".into()];
    napa.drug_interactions = vec!["Warfarin".into()];
    let ace = record("b", "Paracetamol", "Ace");
    let warfarin = record("w", "Warfarin", "Warin");
    CatalogStore::from_partitions(vec![CatalogPartition::new(
        "analgesics",
        vec![napa, ace, warfarin],
    )])
    .unwrap()
}

pub fn wire(record: &MedicineRecord) -> RemoteMedicineRow {
    to_wire(record, chrono::Utc::now())
}

/// Scripted in-memory remote.
///
/// Upserts land in `rows`; a batch whose first id is listed in
/// `failures` fails that many times before succeeding.
#[derive(Default)]
pub struct FakeRemote {
    pub rows: Mutex<HashMap<String, RemoteMedicineRow>>,
    pub failures: Mutex<HashMap<String, u32>>,
    /// First id of every upsert call, in call order.
    pub upsert_calls: Mutex<Vec<String>>,
    pub search_calls: Mutex<u32>,
    pub search_response: Mutex<Option<RemoteResult<Vec<RemoteMedicineRow>>>>,
    pub read_error: Mutex<Option<RemoteError>>,
}

impl FakeRemote {
    /// Fails the batch starting with `first_id` `times` times.
    pub fn failing_batch(self, first_id: &str, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(first_id.to_string(), times);
        self
    }

    pub fn with_search(self, response: RemoteResult<Vec<RemoteMedicineRow>>) -> Self {
        *self.search_response.lock().unwrap() = Some(response);
        self
    }

    /// Every read call fails with `err`.
    pub fn failing_reads(self, err: RemoteError) -> Self {
        *self.read_error.lock().unwrap() = Some(err);
        self
    }

    pub fn calls_for(&self, first_id: &str) -> usize {
        self.upsert_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == first_id)
            .count()
    }

    fn read_guard(&self) -> RemoteResult<()> {
        match self.read_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn stored_where(&self, keep: impl Fn(&RemoteMedicineRow) -> bool) -> Vec<RemoteMedicineRow> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|row| keep(row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }
}

#[async_trait]
impl RemoteCatalog for FakeRemote {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        _offset: usize,
        _filters: &SearchFilters,
    ) -> RemoteResult<Vec<RemoteMedicineRow>> {
        *self.search_calls.lock().unwrap() += 1;
        if let Some(response) = self.search_response.lock().unwrap().clone() {
            return response;
        }
        self.read_guard()?;
        let needle = query.to_lowercase();
        let mut rows = self.stored_where(|row| row.brand_name.to_lowercase().contains(&needle));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn get_by_id(&self, id: &str) -> RemoteResult<Option<RemoteMedicineRow>> {
        self.read_guard()?;
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn get_alternatives(&self, generic_name: &str) -> RemoteResult<Vec<RemoteMedicineRow>> {
        self.read_guard()?;
        Ok(self.stored_where(|row| row.generic_name.eq_ignore_ascii_case(generic_name)))
    }

    async fn check_interactions(&self, ids: &[String]) -> RemoteResult<InteractionReport> {
        self.read_guard()?;
        Ok(InteractionReport {
            pairs: Vec::new(),
            checked: ids.len(),
        })
    }

    async fn get_by_indication(&self, term: &str) -> RemoteResult<Vec<RemoteMedicineRow>> {
        self.read_guard()?;
        let needle = term.to_lowercase();
        Ok(self.stored_where(|row| {
            row.indication
                .iter()
                .any(|i| i.to_lowercase().contains(&needle))
        }))
    }

    async fn upsert_batch(&self, rows: &[RemoteMedicineRow]) -> RemoteResult<UpsertOutcome> {
        let first = rows.first().map(|r| r.id.clone()).unwrap_or_default();
        self.upsert_calls.lock().unwrap().push(first.clone());

        if let Some(remaining) = self.failures.lock().unwrap().get_mut(&first) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RemoteError::Rejected {
                    status: Some(503),
                    message: format!("batch starting at {first} unavailable"),
                });
            }
        }

        let mut stored = self.rows.lock().unwrap();
        let mut outcome = UpsertOutcome::default();
        for row in rows {
            if stored.insert(row.id.clone(), row.clone()).is_some() {
                outcome.updated += 1;
            } else {
                outcome.inserted += 1;
            }
        }
        Ok(outcome)
    }
}

/// Remote whose upsert blocks until released.
#[derive(Default)]
pub struct GatedRemote {
    pub inner: FakeRemote,
    /// Notified when an upsert reaches the gate.
    pub entered: Notify,
    /// One permit lets one upsert through.
    pub release: Notify,
}

#[async_trait]
impl RemoteCatalog for GatedRemote {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
        filters: &SearchFilters,
    ) -> RemoteResult<Vec<RemoteMedicineRow>> {
        self.inner.search(query, limit, offset, filters).await
    }
    async fn get_by_id(&self, id: &str) -> RemoteResult<Option<RemoteMedicineRow>> {
        self.inner.get_by_id(id).await
    }
    async fn get_alternatives(&self, g: &str) -> RemoteResult<Vec<RemoteMedicineRow>> {
        self.inner.get_alternatives(g).await
    }
    async fn check_interactions(&self, ids: &[String]) -> RemoteResult<InteractionReport> {
        self.inner.check_interactions(ids).await
    }
    async fn get_by_indication(&self, t: &str) -> RemoteResult<Vec<RemoteMedicineRow>> {
        self.inner.get_by_indication(t).await
    }
    async fn upsert_batch(&self, rows: &[RemoteMedicineRow]) -> RemoteResult<UpsertOutcome> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.upsert_batch(rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medi_core::validation::validate_record;

    #[test]
    fn test_fixture_records_pass_catalog_validation() {
        let bare = MedicineRecord::new("bare", "Paracetamol", "Napa");
        assert!(validate_record(&bare).is_err());

        assert!(validate_record(&record("a", "Paracetamol", "Napa")).is_ok());
    }

    #[test]
    fn test_fixture_stores_load() {
        assert_eq!(numbered_store(120).len(), 120);

        let store = napa_ace_store();
        assert_eq!(store.len(), 3);
        assert!(store.all().iter().all(|r| validate_record(r).is_ok()));
    }
}
