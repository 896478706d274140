//! # Repository Module
//!
//! Database repository implementations for the canonical catalog.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  SqliteCatalog (medi-sync)                                             │
//! │       │                                                                 │
//! │       │  db.medicines().upsert_batch(&rows)                            │
//! │       ▼                                                                 │
//! │  MedicineRepository                                                    │
//! │  ├── upsert_batch(&self, rows)      one transaction per batch          │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── search(&self, q, limit, offset, filters)                          │
//! │  ├── get_by_generic(&self, generic_name)                               │
//! │  ├── get_by_indication(&self, term)                                    │
//! │  └── count(&self)                                                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`MedicineRepository`](medicine::MedicineRepository) - Catalog rows

pub mod medicine;
