//! # SQLite Catalog
//!
//! `RemoteCatalog` over the local `medi-db` canonical store. Used for
//! staging without the hosted backend and for end-to-end sync tests.

use std::sync::Arc;

use async_trait::async_trait;

use medi_core::interactions::detect_interactions;
use medi_core::wire::from_wire;
use medi_core::{InteractionReport, MedicineRecord, RemoteMedicineRow};
use medi_db::Database;

use super::{RemoteCatalog, SearchFilters, UpsertOutcome};
use crate::error::RemoteResult;

/// Canonical store backed by a SQLite database.
#[derive(Clone)]
pub struct SqliteCatalog {
    db: Arc<Database>,
}

impl SqliteCatalog {
    pub fn new(db: Arc<Database>) -> Self {
        SqliteCatalog { db }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

fn clamp(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[async_trait]
impl RemoteCatalog for SqliteCatalog {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
        filters: &SearchFilters,
    ) -> RemoteResult<Vec<RemoteMedicineRow>> {
        Ok(self
            .db
            .medicines()
            .search(query, clamp(limit), clamp(offset), filters)
            .await?)
    }

    async fn get_by_id(&self, id: &str) -> RemoteResult<Option<RemoteMedicineRow>> {
        Ok(self.db.medicines().get_by_id(id).await?)
    }

    async fn get_alternatives(&self, generic_name: &str) -> RemoteResult<Vec<RemoteMedicineRow>> {
        Ok(self.db.medicines().get_by_generic(generic_name).await?)
    }

    /// Same substring rule the local fallback uses; unknown ids are skipped.
    async fn check_interactions(&self, ids: &[String]) -> RemoteResult<InteractionReport> {
        let repo = self.db.medicines();
        let mut records: Vec<MedicineRecord> = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(row) = repo.get_by_id(id).await? {
                records.push(from_wire(row));
            }
        }

        let refs: Vec<&MedicineRecord> = records.iter().collect();
        Ok(detect_interactions(&refs))
    }

    async fn get_by_indication(&self, term: &str) -> RemoteResult<Vec<RemoteMedicineRow>> {
        Ok(self.db.medicines().get_by_indication(term).await?)
    }

    async fn upsert_batch(&self, rows: &[RemoteMedicineRow]) -> RemoteResult<UpsertOutcome> {
        Ok(self.db.medicines().upsert_batch(rows).await?)
    }
}
