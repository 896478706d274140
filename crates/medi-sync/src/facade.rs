//! # Unified Lookup Facade
//!
//! One read API over the remote canonical store and the local catalog.
//!
//! ## Fallback Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lookup("paracetamol", 5)                                              │
//! │       │                                                                 │
//! │       ├── query < 2 chars ──────────────────────────► Empty            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  remote.search (with timeout)                                          │
//! │       ├── Ok(rows), rows non-empty ─────────────────► Remote(records)  │
//! │       ├── Ok([]), TrustEmpty ───────────────────────► Empty            │
//! │       ├── Ok([]), EmptyIsFailure ──┐                                    │
//! │       └── Err(_) ──────────────────┴──► SearchEngine ─► Local / Empty  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Remote failures are logged and never reach the caller. Nothing is cached;
//! every call is a fresh remote attempt.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use medi_core::interactions::detect_interactions;
use medi_core::validation::normalize_query;
use medi_core::wire::from_wire_checked;
use medi_core::{InteractionReport, MedicineRecord, RemoteMedicineRow, SearchEngine, SearchFilters};

use crate::config::FallbackPolicy;
use crate::error::RemoteResult;
use crate::remote::{with_timeout, RemoteCatalog};

// =============================================================================
// Lookup Result
// =============================================================================

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Remote,
    Local,
}

/// A lookup answer tagged with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    /// Served by the canonical store.
    Remote(Vec<MedicineRecord>),
    /// Served by the bundled catalog after the remote path failed.
    Local(Vec<MedicineRecord>),
    /// No records, from either path.
    Empty,
}

impl LookupResult {
    fn local(records: Vec<MedicineRecord>) -> Self {
        if records.is_empty() {
            LookupResult::Empty
        } else {
            LookupResult::Local(records)
        }
    }

    pub fn records(&self) -> &[MedicineRecord] {
        match self {
            LookupResult::Remote(records) | LookupResult::Local(records) => records,
            LookupResult::Empty => &[],
        }
    }

    pub fn into_records(self) -> Vec<MedicineRecord> {
        match self {
            LookupResult::Remote(records) | LookupResult::Local(records) => records,
            LookupResult::Empty => Vec::new(),
        }
    }

    /// `None` for [`LookupResult::Empty`].
    pub fn provenance(&self) -> Option<Provenance> {
        match self {
            LookupResult::Remote(_) => Some(Provenance::Remote),
            LookupResult::Local(_) => Some(Provenance::Local),
            LookupResult::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }
}

/// An interaction report tagged with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionCheck {
    pub report: InteractionReport,
    pub provenance: Provenance,
}

// =============================================================================
// Facade
// =============================================================================

/// Remote-first reads with a local fallback.
pub struct LookupFacade {
    remote: Arc<dyn RemoteCatalog>,
    engine: SearchEngine,
    policy: FallbackPolicy,
    request_timeout: Duration,
}

impl LookupFacade {
    pub fn new(
        remote: Arc<dyn RemoteCatalog>,
        engine: SearchEngine,
        policy: FallbackPolicy,
        request_timeout: Duration,
    ) -> Self {
        LookupFacade {
            remote,
            engine,
            policy,
            request_timeout,
        }
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Ranked search. Short queries return `Empty` without a remote call.
    pub async fn lookup(&self, query: &str, limit: usize) -> LookupResult {
        self.lookup_filtered(query, limit, &SearchFilters::default())
            .await
    }

    /// [`lookup`](Self::lookup) narrowed by filters on both paths.
    pub async fn lookup_filtered(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> LookupResult {
        let Some(normalized) = normalize_query(query) else {
            debug!("Query too short, skipping lookup");
            return LookupResult::Empty;
        };
        if limit == 0 {
            return LookupResult::Empty;
        }

        let remote = self
            .remote_call(self.remote.search(&normalized, limit, 0, filters))
            .await;

        self.resolve("search", remote, limit, || {
            let candidates = if filters.is_empty() {
                self.engine.search(&normalized, limit)
            } else {
                self.engine.search(&normalized, usize::MAX)
            };
            candidates
                .into_iter()
                .filter(|r| filters.matches(r))
                .take(limit)
                .collect()
        })
    }

    /// Every record sharing `generic_name`, the queried brand included.
    pub async fn alternatives(&self, generic_name: &str) -> LookupResult {
        let generic_name = generic_name.trim();
        if generic_name.is_empty() {
            return LookupResult::Empty;
        }

        let remote = self
            .remote_call(self.remote.get_alternatives(generic_name))
            .await;

        self.resolve("alternatives", remote, usize::MAX, || {
            self.engine.alternatives_for(generic_name)
        })
    }

    /// A single record; at most one entry in the result.
    ///
    /// "Not found" remotely is treated like an empty answer.
    pub async fn by_id(&self, id: &str) -> LookupResult {
        let id = id.trim();
        if id.is_empty() {
            return LookupResult::Empty;
        }

        let remote = self
            .remote_call(self.remote.get_by_id(id))
            .await
            .map(|row| row.into_iter().collect::<Vec<_>>());

        self.resolve("by_id", remote, 1, || {
            self.engine.store().by_id(id).cloned().into_iter().collect()
        })
    }

    /// Records whose indications mention `term`.
    pub async fn by_indication(&self, term: &str) -> LookupResult {
        let term = term.trim();
        if term.is_empty() {
            return LookupResult::Empty;
        }

        let remote = self.remote_call(self.remote.get_by_indication(term)).await;

        self.resolve("by_indication", remote, usize::MAX, || {
            self.engine
                .store()
                .by_indication(term)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    /// Pairwise interactions among `ids`.
    ///
    /// A remote report that checked no records counts as empty under
    /// [`FallbackPolicy::EmptyIsFailure`]; ids unknown locally are skipped by
    /// the fallback.
    pub async fn check_interactions(&self, ids: &[String]) -> InteractionCheck {
        let local = || {
            let records: Vec<&MedicineRecord> = ids
                .iter()
                .filter_map(|id| self.engine.store().by_id(id))
                .collect();
            InteractionCheck {
                report: detect_interactions(&records),
                provenance: Provenance::Local,
            }
        };

        if ids.len() < 2 {
            return local();
        }

        match self.remote_call(self.remote.check_interactions(ids)).await {
            Ok(report) if report.checked > 0 || !self.policy.falls_back_on_empty() => {
                InteractionCheck {
                    report,
                    provenance: Provenance::Remote,
                }
            }
            Ok(_) => {
                debug!("Remote interaction check was empty, using local catalog");
                local()
            }
            Err(e) => {
                warn!(error = %e, "Remote interaction check failed, using local catalog");
                local()
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn remote_call<T>(
        &self,
        call: impl std::future::Future<Output = RemoteResult<T>>,
    ) -> RemoteResult<T> {
        with_timeout(self.request_timeout, call).await
    }

    /// Applies the fallback policy to a remote answer.
    fn resolve(
        &self,
        operation: &'static str,
        remote: RemoteResult<Vec<RemoteMedicineRow>>,
        limit: usize,
        local: impl FnOnce() -> Vec<MedicineRecord>,
    ) -> LookupResult {
        match remote {
            Ok(rows) => {
                let records = decode_rows(rows, limit);
                if !records.is_empty() {
                    return LookupResult::Remote(records);
                }
                if !self.policy.falls_back_on_empty() {
                    return LookupResult::Empty;
                }
                debug!(operation, "Remote answer was empty, using local catalog");
            }
            Err(e) => {
                warn!(operation, error = %e, "Remote lookup failed, using local catalog");
            }
        }

        LookupResult::local(local())
    }
}

/// Converts remote rows to records, dropping rows that break the price
/// invariant.
fn decode_rows(rows: Vec<RemoteMedicineRow>, limit: usize) -> Vec<MedicineRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            match from_wire_checked(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(id = %id, error = %e, "Dropping malformed remote row");
                    None
                }
            }
        })
        .take(limit)
        .collect()
}
