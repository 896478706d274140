//! # medi-db: Canonical Catalog Store
//!
//! A SQLite implementation of the canonical medicine store the sync
//! orchestrator writes to and the lookup facade reads from.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Medi Data Flow                                   │
//! │                                                                         │
//! │  SyncOrchestrator ──upsert_batch──┐      ┌──search / get_by_id── Facade │
//! │                                   ▼      ▼                              │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            SqliteCatalog (medi-sync::remote::sqlite)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                     medi-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌─────────────┐ │   │
//! │  │   │   Database    │    │ MedicineRepository │  │ Migrations  │ │   │
//! │  │   │   (pool.rs)   │◄───│  upsert_batch      │  │ (embedded)  │ │   │
//! │  │   │  SqlitePool   │    │  get_by_id, search │  │ 001_...sql  │ │   │
//! │  │   └───────────────┘    └────────────────────┘  └─────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │                                ▼                                        │
//! │                       medi.db (SQLite, WAL)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - The medicine repository
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medi_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("medi.db")).await?;
//!
//! let outcome = db.medicines().upsert_batch(&rows).await?;
//! let napa = db.medicines().get_by_id("para-napa-500").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::medicine::{MedicineRepository, UpsertOutcome};
