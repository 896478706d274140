//! # Remote Catalog Client
//!
//! The narrow contract the core calls against the canonical catalog.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       RemoteCatalog (trait)                             │
//! │                                                                         │
//! │  search(query, limit, offset, filters)  → Vec<RemoteMedicineRow>       │
//! │  get_by_id(id)                          → Option<RemoteMedicineRow>    │
//! │  get_alternatives(generic_name)         → Vec<RemoteMedicineRow>       │
//! │  check_interactions(ids)                → InteractionReport            │
//! │  get_by_indication(term)                → Vec<RemoteMedicineRow>       │
//! │  upsert_batch(rows)                     → UpsertOutcome                │
//! │                                                                         │
//! │  Every call returns Result<_, RemoteError>; callers branch explicitly. │
//! │  No retries and no caching here: the orchestrator retries writes, the  │
//! │  facade decides what a failed read falls back to.                      │
//! │                                                                         │
//! │  Implementations:                                                      │
//! │  • RestCatalogClient  hosted PostgREST-style backend (reqwest)         │
//! │  • SqliteCatalog      local canonical store (medi-db)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use medi_core::{InteractionReport, RemoteMedicineRow};

use crate::error::{RemoteError, RemoteResult};

pub mod rest;
pub mod sqlite;

pub use medi_core::SearchFilters;
pub use medi_db::UpsertOutcome;
pub use rest::RestCatalogClient;
pub use sqlite::SqliteCatalog;

/// The canonical catalog, as seen from this core.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Ranked substring search with optional filters.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
        filters: &SearchFilters,
    ) -> RemoteResult<Vec<RemoteMedicineRow>>;

    /// A single record; `Ok(None)` when the id is unknown.
    async fn get_by_id(&self, id: &str) -> RemoteResult<Option<RemoteMedicineRow>>;

    /// Records sharing the given generic name.
    async fn get_alternatives(&self, generic_name: &str) -> RemoteResult<Vec<RemoteMedicineRow>>;

    /// Pairwise interaction report for the given ids.
    async fn check_interactions(&self, ids: &[String]) -> RemoteResult<InteractionReport>;

    /// Records whose indications mention `term`.
    async fn get_by_indication(&self, term: &str) -> RemoteResult<Vec<RemoteMedicineRow>>;

    /// Insert-or-update keyed by `id`, overwriting on conflict.
    ///
    /// Must either apply the whole batch or fail.
    async fn upsert_batch(&self, rows: &[RemoteMedicineRow]) -> RemoteResult<UpsertOutcome>;
}

/// Bounds a remote call; an elapsed deadline becomes [`RemoteError::Timeout`].
pub async fn with_timeout<T, F>(duration: Duration, call: F) -> RemoteResult<T>
where
    F: Future<Output = RemoteResult<T>>,
{
    match tokio::time::timeout(duration, call).await {
        Ok(result) => result,
        Err(_) => Err(RemoteError::Timeout { after: duration }),
    }
}
