//! # medi-core: Pure Domain Logic for the Medicine Knowledge Engine
//!
//! This crate holds the medicine catalog and everything that can be computed
//! from it without touching the network or a database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Medicine Knowledge Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI collaborators                             │   │
//! │  │    lookup ──► alternatives ──► by_id ──► sync_all              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        medi-sync (facade, orchestrator, remote client)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ medi-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  catalog  │  │  search   │  │interactions│ │   wire    │  │   │
//! │  │   │  Store    │  │  Engine   │  │  Report   │  │ RemoteRow │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                 │   │
//! │  │   │   types   │  │   money   │  │ validation│                 │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO ASYNC                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  medi-db (canonical store)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (MedicineRecord, SyncResult, SyncProgress)
//! - [`catalog`] - Immutable Catalog Store built from partitions
//! - [`search`] - Substring search with two-tier stable ranking
//! - [`interactions`] - Local pairwise interaction detection
//! - [`wire`] - Remote upsert row and its transforms
//! - [`money`] - Integer money for price ranges
//! - [`error`] - Domain error types
//! - [`validation`] - Record, query and tunable validation
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use medi_core::{CatalogStore, SearchEngine};
//!
//! let store = Arc::new(CatalogStore::bundled().unwrap());
//! let engine = SearchEngine::new(store);
//!
//! let hits = engine.search("napa", 10);
//! assert_eq!(hits[0].brand_name, "Napa");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

mod bundled;
pub mod catalog;
pub mod error;
pub mod interactions;
pub mod money;
pub mod search;
pub mod types;
pub mod validation;
pub mod wire;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{CatalogPartition, CatalogStore};
pub use error::{CoreError, CoreResult, ValidationError};
pub use interactions::{detect_interactions, InteractionPair, InteractionReport};
pub use money::Money;
pub use search::SearchEngine;
pub use types::*;
pub use wire::{RemoteMedicineRow, SearchFilters};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Result count when the caller does not pass a limit.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Shortest query (in chars, after trimming) that triggers a search.
///
/// ## Business Reason
/// A single character matches most of the catalog and is almost always a
/// keystroke on the way to a real query.
pub const MIN_QUERY_CHARS: usize = 2;

/// Longer queries are truncated to this many chars.
pub const MAX_QUERY_CHARS: usize = 100;

/// Maximum length of a medicine id.
pub const MAX_ID_LEN: usize = 64;

/// Records per upsert batch unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Upper bound for the configurable batch size.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Upsert attempts per batch unless configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Upper bound for the configurable attempt count.
pub const MAX_SYNC_ATTEMPTS: u32 = 10;
