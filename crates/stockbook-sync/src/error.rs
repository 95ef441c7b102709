//! # Sync Error Types
//!
//! Error types for sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Input       │  │    Database     │  │     Per-Record          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidInput   │  │  DatabaseError  │  │  (never surfaced as     │ │
//! │  │  InvalidTimestamp│ │                 │  │   SyncError — isolated  │ │
//! │  │  Serialization  │  │                 │  │   into BatchResult)     │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conflicts are data, not errors: a detected conflict travels in the
//! reconcile outcome, never through this type.

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering batch-level failures.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The request payload is unusable as a whole (e.g. empty data map).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A timestamp could not be parsed.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Failed to serialize an entity for export.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Database operation failed outside any single record's scope
    /// (wipe transaction, connection loss).
    #[error("Database error: {0}")]
    DatabaseError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<stockbook_db::DbError> for SyncError {
    fn from(err: stockbook_db::DbError) -> Self {
        SyncError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}
