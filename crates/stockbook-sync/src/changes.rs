//! # Incremental Download
//!
//! Serves "what changed since I last synced" pulls. Rows are selected by
//! a strict `updated_at > since` comparison so a client polling with the
//! timestamp it was handed never re-receives the same change.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use sqlx::SqlitePool;

use stockbook_core::entity::{EntityKind, INSERT_ORDER};
use stockbook_core::types::{
    Branch, BulkPurchase, BulkPurchaseItem, Contact, Employee, Expense, LoanTransaction, Product,
    Sale, SaleItem, SaleReturn, SaleReturnItem, ShopSettings,
};
use stockbook_db::SyncStore;

use crate::error::{SyncError, SyncResult};
use crate::protocol::SyncData;

/// Parses a client-supplied sync cursor.
///
/// Accepts RFC 3339 (`2026-08-30T09:00:00Z`) or unix epoch milliseconds;
/// older clients send the latter.
pub fn parse_sync_timestamp(raw: &str) -> SyncResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(millis) = raw.parse::<i64>() {
        if let Some(parsed) = Utc.timestamp_millis_opt(millis).single() {
            return Ok(parsed);
        }
    }
    Err(SyncError::InvalidTimestamp(raw.to_string()))
}

/// Collects every row of every kind changed after `since`, keyed by wire
/// store name. Kinds with no changes are omitted entirely, so an
/// up-to-date client gets an empty map.
pub async fn changes_since(
    pool: &SqlitePool,
    user_id: &str,
    since: DateTime<Utc>,
) -> SyncResult<SyncData> {
    let mut data = SyncData::new();

    for kind in INSERT_ORDER {
        let rows = match kind {
            EntityKind::ShopSettings => collect::<ShopSettings>(pool, user_id, since).await?,
            EntityKind::Product => collect::<Product>(pool, user_id, since).await?,
            EntityKind::Contact => collect::<Contact>(pool, user_id, since).await?,
            EntityKind::Branch => collect::<Branch>(pool, user_id, since).await?,
            EntityKind::Employee => collect::<Employee>(pool, user_id, since).await?,
            EntityKind::Expense => collect::<Expense>(pool, user_id, since).await?,
            EntityKind::LoanTransaction => {
                collect::<LoanTransaction>(pool, user_id, since).await?
            }
            EntityKind::SaleReturn => collect::<SaleReturn>(pool, user_id, since).await?,
            EntityKind::BulkPurchase => collect::<BulkPurchase>(pool, user_id, since).await?,
            EntityKind::Sale => collect::<Sale>(pool, user_id, since).await?,
            EntityKind::SaleReturnItem => {
                collect::<SaleReturnItem>(pool, user_id, since).await?
            }
            EntityKind::BulkPurchaseItem => {
                collect::<BulkPurchaseItem>(pool, user_id, since).await?
            }
            EntityKind::SaleItem => collect::<SaleItem>(pool, user_id, since).await?,
        };

        if !rows.is_empty() {
            data.insert(kind.store_name().to_string(), rows);
        }
    }

    Ok(data)
}

async fn collect<T: SyncStore>(
    pool: &SqlitePool,
    user_id: &str,
    since: DateTime<Utc>,
) -> SyncResult<Vec<Value>> {
    let rows = T::changed_since(pool, user_id, since).await?;
    let mut values = Vec::with_capacity(rows.len());
    for row in &rows {
        values.push(serde_json::to_value(row)?);
    }
    Ok(values)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use stockbook_db::{Database, DbConfig};

    use crate::reconciler::Reconciler;

    #[test]
    fn test_timestamp_accepts_rfc3339_and_millis() {
        let iso = parse_sync_timestamp("2026-08-30T09:00:00Z").unwrap();
        let millis = parse_sync_timestamp(&iso.timestamp_millis().to_string()).unwrap();
        assert_eq!(iso, millis);

        assert!(matches!(
            parse_sync_timestamp("yesterday"),
            Err(SyncError::InvalidTimestamp(_))
        ));
    }

    #[tokio::test]
    async fn test_changes_are_strictly_after_cursor() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let reconciler = Reconciler::new(db.pool().clone());

        let mut data = SyncData::new();
        data.insert(
            "products".into(),
            vec![json!({
                "id": "p1", "userId": "x", "name": "Valve", "quantity": 10,
                "retailPrice": 500.0, "wholesalePrice": 450.0,
                "purchasePrice": 4000.0, "perUnitPurchasePrice": 400.0,
                "createdAt": "2026-08-01T10:00:00Z",
                "updatedAt": "2026-08-01T10:00:00Z"
            })],
        );
        reconciler
            .reconcile("u1", &data, Utc::now())
            .await
            .unwrap();

        let before = Utc::now() - Duration::hours(1);
        let changed = changes_since(db.pool(), "u1", before).await.unwrap();
        assert_eq!(changed["products"].len(), 1);

        // Polling again with the stamp just handed out returns nothing.
        use stockbook_core::types::Product;
        let stamp = Product::fetch(db.pool(), "p1", "u1")
            .await
            .unwrap()
            .unwrap()
            .updated_at;
        let unchanged = changes_since(db.pool(), "u1", stamp).await.unwrap();
        assert!(unchanged.is_empty());
    }

    #[tokio::test]
    async fn test_changes_are_tenant_scoped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let reconciler = Reconciler::new(db.pool().clone());

        let mut data = SyncData::new();
        data.insert(
            "contacts".into(),
            vec![json!({
                "id": "c1", "userId": "x", "name": "Karim Traders",
                "contactType": "customer",
                "createdAt": "2026-08-01T10:00:00Z",
                "updatedAt": "2026-08-01T10:00:00Z"
            })],
        );
        reconciler
            .reconcile("u1", &data, Utc::now())
            .await
            .unwrap();

        let other = changes_since(db.pool(), "u2", Utc::now() - Duration::days(1))
            .await
            .unwrap();
        assert!(other.is_empty());
    }
}
