//! # medi-sync: Remote Client, Sync Orchestrator and Lookup Facade
//!
//! The async layer of the medicine knowledge core. Everything that waits
//! (remote calls, backoff sleeps, inter-batch pauses, request timeouts)
//! lives in this crate.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Medi Async Layer                                 │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  MedicineKnowledge (entry point)                 │  │
//! │  │        held by UI collaborators, built from SyncConfig           │  │
//! │  └───────────────┬──────────────────────────────┬───────────────────┘  │
//! │                  ▼                              ▼                       │
//! │  ┌────────────────────────────┐  ┌────────────────────────────────┐    │
//! │  │       LookupFacade         │  │       SyncOrchestrator         │    │
//! │  │                            │  │                                │    │
//! │  │ remote first, local        │  │ batches of 50, RetryPolicy     │    │
//! │  │ SearchEngine on failure    │  │ (2s, 4s), progress per batch,  │    │
//! │  │ LookupResult::{Remote,     │  │ CancellationToken, rejects     │    │
//! │  │   Local, Empty}            │  │ concurrent runs                │    │
//! │  └─────────────┬──────────────┘  └───────────────┬────────────────┘    │
//! │                └────────────────┬─────────────────┘                     │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    RemoteCatalog (trait)                         │  │
//! │  │   RestCatalogClient (reqwest)  │  SqliteCatalog (medi-db)        │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - TOML + `MEDI_*` environment configuration
//! - [`error`] - `SyncError` and per-call `RemoteError`
//! - [`remote`] - Remote Catalog Client contract and implementations
//! - [`retry`] - Backoff policy and injectable sleeper
//! - [`orchestrator`] - Batched catalog upload
//! - [`facade`] - Remote-first lookups with local fallback
//! - [`knowledge`] - `MedicineKnowledge` entry point
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medi_sync::{MedicineKnowledge, SyncConfig};
//!
//! let config = SyncConfig::load_or_default(None);
//! let knowledge = MedicineKnowledge::builder(config).build()?;
//!
//! let hits = knowledge.lookup("paracetamol", 5).await;
//! println!("{} results from {:?}", hits.len(), hits.provenance());
//!
//! let result = knowledge
//!     .sync_all(&|p: &medi_core::SyncProgress| println!("{}%", p.percentage))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod facade;
pub mod knowledge;
pub mod orchestrator;
pub mod remote;
pub mod retry;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{FallbackPolicy, SyncConfig};
pub use error::{MediResult, RemoteError, RemoteResult, SyncError};
pub use facade::{InteractionCheck, LookupFacade, LookupResult, Provenance};
pub use knowledge::{MedicineKnowledge, MedicineKnowledgeBuilder};
pub use orchestrator::{NoOpSink, ProgressSink, SyncOptions, SyncOrchestrator, SyncRun, SyncState};
pub use remote::{RemoteCatalog, RestCatalogClient, SearchFilters, SqliteCatalog};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
