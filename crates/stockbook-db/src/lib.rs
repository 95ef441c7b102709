//! # stockbook-db: Database Layer for Stockbook
//!
//! This crate provides database access for the Stockbook sync server.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Data Flow                              │
//! │                                                                         │
//! │  HTTP handler / sync engine                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockbook-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  SyncStore   │  │   │
//! │  │   │   (pool.rs)   │    │ (sale.rs ...) │    │  (store.rs)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ SaleRepo      │    │ per-entity   │  │   │
//! │  │   │ Connection    │◄───│ ProductRepo   │    │ insert/fetch │  │   │
//! │  │   │ Management    │    │ LedgerRepo    │    │ wipe/changes │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode, foreign keys on)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`store`] - Per-entity sync persistence (SyncStore trait)
//! - [`repository`] - Repository implementations (product, sale, ledger, ...)

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{count_for_user, wipe_user_data, SyncStore};

// Repository re-exports for convenience
pub use repository::audit::AuditRepository;
pub use repository::contact::ContactRepository;
pub use repository::daybook::DaybookRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::returns::ReturnRepository;
pub use repository::sale::SaleRepository;
