//! # stockbook-sync: Sync Engine for Stockbook
//!
//! Server-side reconciliation between offline clients and the canonical
//! store. Pure logic over `stockbook-db`; the HTTP surface lives in the
//! `sync-api` app.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Sync Engine                                    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │   Reconciler   │  │    Snapshot    │  │       changes          │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Incremental    │  │ Full download  │  │ updated_at > cursor    │    │
//! │  │ upload, last-  │  │ (nested) and   │  │ pull, keyed by wire    │    │
//! │  │ writer-wins    │  │ wipe+replace   │  │ store name             │    │
//! │  │ conflict check │  │ upload         │  │                        │    │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │          │                   │                       │                 │
//! │          └───────────────────┼───────────────────────┘                 │
//! │                              ▼                                         │
//! │                SyncStore trait (stockbook-db)                          │
//! │           typed insert/update/fetch per entity kind                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conflict Model
//! Last writer wins, detected with the server-stamped `updated_at` clock:
//! a server row newer than the client's `lastSyncTimestamp` was changed
//! by another device, so the engine writes nothing and returns both
//! versions for the client to resolve. Conflicts are data, not errors.

pub mod changes;
pub mod error;
pub mod protocol;
pub mod reconciler;
pub mod snapshot;

pub use changes::{changes_since, parse_sync_timestamp};
pub use error::{SyncError, SyncResult};
pub use protocol::{
    BatchResult, ConflictRecord, IncrementalUploadRequest, ReconcileOutcome, RecordFailure,
    SnapshotData, SnapshotUploadRequest, SyncData,
};
pub use reconciler::Reconciler;
pub use snapshot::Snapshot;
