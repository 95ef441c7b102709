//! # Incremental Reconciler
//!
//! Applies a client's changed-records batch against the server copy,
//! detecting conflicts with the last-writer clock.
//!
//! ## Decision Table (per record)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  server row absent                          → INSERT, created += 1      │
//! │  server row present,                                                    │
//! │    server.updated_at >  last_sync           → CONFLICT, no write        │
//! │    server.updated_at <= last_sync           → UPDATE, updated += 1      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Kinds are processed parents-before-children so a batch that creates a
//! sale together with its items never trips a foreign key. Records are
//! applied sequentially; any single failure is captured and the batch
//! continues.

use serde_json::Value;
use sqlx::SqlitePool;
use tracing::warn;

use stockbook_core::entity::{EntityKind, INSERT_ORDER};
use stockbook_core::types::{
    Branch, BulkPurchase, BulkPurchaseItem, Contact, Employee, Expense, LoanTransaction, Product,
    Sale, SaleItem, SaleReturn, SaleReturnItem, ShopSettings,
};
use stockbook_db::SyncStore;

use crate::error::{SyncError, SyncResult};
use crate::protocol::{ConflictRecord, RecordFailure, ReconcileOutcome, SyncData};

/// Applies incremental upload batches for one database.
#[derive(Debug, Clone)]
pub struct Reconciler {
    pool: SqlitePool,
}

impl Reconciler {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reconciles one upload batch for `user_id`.
    ///
    /// `last_sync` is the server timestamp of the client's previous sync;
    /// any server row stamped after it has been changed by someone else
    /// and comes back as a conflict instead of being overwritten.
    pub async fn reconcile(
        &self,
        user_id: &str,
        data: &SyncData,
        last_sync: chrono::DateTime<chrono::Utc>,
    ) -> SyncResult<ReconcileOutcome> {
        if data.is_empty() {
            return Err(SyncError::InvalidInput(
                "upload contained no data".to_string(),
            ));
        }

        for store_name in data.keys() {
            if EntityKind::from_store_name(store_name).is_none() {
                warn!(store = %store_name, "skipping unknown store in upload");
            }
        }

        let mut outcome = ReconcileOutcome::default();

        // Parents before children, regardless of payload key order.
        for kind in INSERT_ORDER {
            let Some(rows) = data.get(kind.store_name()) else {
                continue;
            };
            self.apply_kind(kind, user_id, rows, last_sync, &mut outcome)
                .await;
        }

        Ok(outcome)
    }

    async fn apply_kind(
        &self,
        kind: EntityKind,
        user_id: &str,
        rows: &[Value],
        last_sync: chrono::DateTime<chrono::Utc>,
        outcome: &mut ReconcileOutcome,
    ) {
        match kind {
            EntityKind::ShopSettings => {
                self.apply::<ShopSettings>(user_id, rows, last_sync, outcome)
                    .await
            }
            EntityKind::Product => self.apply::<Product>(user_id, rows, last_sync, outcome).await,
            EntityKind::Contact => self.apply::<Contact>(user_id, rows, last_sync, outcome).await,
            EntityKind::Branch => self.apply::<Branch>(user_id, rows, last_sync, outcome).await,
            EntityKind::Employee => {
                self.apply::<Employee>(user_id, rows, last_sync, outcome)
                    .await
            }
            EntityKind::Expense => self.apply::<Expense>(user_id, rows, last_sync, outcome).await,
            EntityKind::LoanTransaction => {
                self.apply::<LoanTransaction>(user_id, rows, last_sync, outcome)
                    .await
            }
            EntityKind::SaleReturn => {
                self.apply::<SaleReturn>(user_id, rows, last_sync, outcome)
                    .await
            }
            EntityKind::BulkPurchase => {
                self.apply::<BulkPurchase>(user_id, rows, last_sync, outcome)
                    .await
            }
            EntityKind::Sale => self.apply::<Sale>(user_id, rows, last_sync, outcome).await,
            EntityKind::SaleReturnItem => {
                self.apply::<SaleReturnItem>(user_id, rows, last_sync, outcome)
                    .await
            }
            EntityKind::BulkPurchaseItem => {
                self.apply::<BulkPurchaseItem>(user_id, rows, last_sync, outcome)
                    .await
            }
            EntityKind::SaleItem => {
                self.apply::<SaleItem>(user_id, rows, last_sync, outcome)
                    .await
            }
        }
    }

    /// Applies every row of one kind. Failures are recorded per record,
    /// never propagated: a corrupt row must not block the rest.
    async fn apply<T: SyncStore>(
        &self,
        user_id: &str,
        rows: &[Value],
        last_sync: chrono::DateTime<chrono::Utc>,
        outcome: &mut ReconcileOutcome,
    ) {
        let now = chrono::Utc::now();

        for row in rows {
            let id = row
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string);

            let mut record: T = match serde_json::from_value(row.clone()) {
                Ok(record) => record,
                Err(err) => {
                    outcome.failed.push(RecordFailure {
                        id,
                        entity_type: T::KIND.model_name().to_string(),
                        message: format!("malformed record: {err}"),
                    });
                    continue;
                }
            };

            let existing = match T::fetch(&self.pool, record.id(), user_id).await {
                Ok(existing) => existing,
                Err(err) => {
                    outcome.failed.push(RecordFailure {
                        id,
                        entity_type: T::KIND.model_name().to_string(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            let result = match existing {
                None => {
                    record.stamp(user_id, now);
                    record.insert(&self.pool).await.map(|()| {
                        outcome.created += 1;
                    })
                }
                Some(server) if server.updated_at() > last_sync => {
                    // Someone else won the race since the client last
                    // synced. Neither version is written; both go back.
                    let server_data =
                        serde_json::to_value(&server).unwrap_or(Value::Null);
                    outcome.conflicts.push(ConflictRecord {
                        id: server.id().to_string(),
                        entity_type: T::KIND.model_name().to_string(),
                        server_data,
                        client_data: row.clone(),
                    });
                    Ok(())
                }
                Some(_) => {
                    record.stamp(user_id, now);
                    record.update(&self.pool).await.map(|()| {
                        outcome.updated += 1;
                    })
                }
            };

            if let Err(err) = result {
                outcome.failed.push(RecordFailure {
                    id,
                    entity_type: T::KIND.model_name().to_string(),
                    message: err.to_string(),
                });
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
