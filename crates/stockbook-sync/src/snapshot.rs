//! # Full Snapshot Transfer
//!
//! Whole-account export and wipe-and-replace import.
//!
//! ## Upload Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. WIPE      one transaction, children before parents — atomic.       │
//! │  2. INSERT    parents before children, row by row — best effort.       │
//! │                                                                         │
//! │  A failed wipe aborts the whole upload with the old data intact.       │
//! │  A failed insert is recorded and skipped; the rest of the snapshot     │
//! │  still lands. The client sees exactly which rows were dropped.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Download flattens nothing away: every entity list is present, and the
//! sale/purchase/return exports additionally embed their children so the
//! client can render documents without joining.

use std::collections::HashMap;

use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{info, warn};

use stockbook_core::entity::{EntityKind, INSERT_ORDER};
use stockbook_core::types::{
    Branch, BulkPurchase, BulkPurchaseItem, Contact, Employee, Expense, LoanTransaction, Product,
    Sale, SaleItem, SaleReturn, SaleReturnItem, ShopSettings,
};
use stockbook_db::{wipe_user_data, SyncStore};

use crate::error::SyncResult;
use crate::protocol::{
    BatchResult, BulkPurchaseExport, RecordFailure, SaleExport, SaleItemExport, SaleReturnExport,
    SnapshotData, SyncData,
};

/// Whole-account export/import for one database.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pool: SqlitePool,
}

impl Snapshot {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Download
    // =========================================================================

    /// Exports everything `user_id` owns.
    pub async fn download(&self, user_id: &str) -> SyncResult<SnapshotData> {
        let shop_settings = ShopSettings::list_for_user(&self.pool, user_id).await?;
        let products = Product::list_for_user(&self.pool, user_id).await?;
        let contacts = Contact::list_for_user(&self.pool, user_id).await?;
        let branches = Branch::list_for_user(&self.pool, user_id).await?;
        let employees = Employee::list_for_user(&self.pool, user_id).await?;
        let expenses = Expense::list_for_user(&self.pool, user_id).await?;
        let loan_transactions = LoanTransaction::list_for_user(&self.pool, user_id).await?;
        let sales = Sale::list_for_user(&self.pool, user_id).await?;
        let bulk_purchases = BulkPurchase::list_for_user(&self.pool, user_id).await?;
        let sale_returns = SaleReturn::list_for_user(&self.pool, user_id).await?;
        let sale_items = SaleItem::list_for_user(&self.pool, user_id).await?;
        let bulk_purchase_items = BulkPurchaseItem::list_for_user(&self.pool, user_id).await?;
        let sale_return_items = SaleReturnItem::list_for_user(&self.pool, user_id).await?;

        // Product projection for item enrichment.
        let product_labels: HashMap<&str, (&str, Option<&str>)> = products
            .iter()
            .map(|p| (p.id.as_str(), (p.name.as_str(), p.sku.as_deref())))
            .collect();

        let mut items_by_sale: HashMap<&str, Vec<SaleItemExport>> = HashMap::new();
        for item in &sale_items {
            let (product_name, product_sku) = product_labels
                .get(item.product_id.as_str())
                .map(|(name, sku)| (name.to_string(), sku.map(str::to_string)))
                .unwrap_or_default();
            items_by_sale
                .entry(item.sale_id.as_str())
                .or_default()
                .push(SaleItemExport {
                    item: item.clone(),
                    product_name,
                    product_sku,
                });
        }

        let mut items_by_return: HashMap<&str, Vec<SaleReturnItem>> = HashMap::new();
        for item in &sale_return_items {
            items_by_return
                .entry(item.return_id.as_str())
                .or_default()
                .push(item.clone());
        }

        let return_exports: Vec<SaleReturnExport> = sale_returns
            .iter()
            .map(|ret| SaleReturnExport {
                sale_return: ret.clone(),
                items: items_by_return.remove(ret.id.as_str()).unwrap_or_default(),
            })
            .collect();

        let mut returns_by_sale: HashMap<&str, Vec<SaleReturnExport>> = HashMap::new();
        for export in &return_exports {
            returns_by_sale
                .entry(export.sale_return.sale_id.as_str())
                .or_default()
                .push(export.clone());
        }

        let sale_exports: Vec<SaleExport> = sales
            .into_iter()
            .map(|sale| {
                let items = items_by_sale.remove(sale.id.as_str()).unwrap_or_default();
                let returns = returns_by_sale.remove(sale.id.as_str()).unwrap_or_default();
                SaleExport {
                    sale,
                    items,
                    returns,
                }
            })
            .collect();

        let mut items_by_purchase: HashMap<&str, Vec<BulkPurchaseItem>> = HashMap::new();
        for item in &bulk_purchase_items {
            items_by_purchase
                .entry(item.purchase_id.as_str())
                .or_default()
                .push(item.clone());
        }

        let purchase_exports: Vec<BulkPurchaseExport> = bulk_purchases
            .into_iter()
            .map(|purchase| {
                let items = items_by_purchase
                    .remove(purchase.id.as_str())
                    .unwrap_or_default();
                BulkPurchaseExport { purchase, items }
            })
            .collect();

        Ok(SnapshotData {
            shop_settings,
            products,
            contacts,
            branches,
            employees,
            expenses,
            loan_transactions,
            sales: sale_exports,
            bulk_purchases: purchase_exports,
            sale_returns: return_exports,
            sale_items,
            bulk_purchase_items,
            sale_return_items,
        })
    }

    // =========================================================================
    // Upload
    // =========================================================================

    /// Replaces everything `user_id` owns with the uploaded snapshot.
    ///
    /// The wipe is atomic; the insert phase is best effort per row with
    /// failures reported in the result.
    pub async fn upload(&self, user_id: &str, data: &SyncData) -> SyncResult<BatchResult> {
        wipe_user_data(&self.pool, user_id).await?;

        for store_name in data.keys() {
            if EntityKind::from_store_name(store_name).is_none() {
                warn!(store = %store_name, "skipping unknown store in snapshot");
            }
        }

        let mut result = BatchResult::default();

        for kind in INSERT_ORDER {
            let Some(rows) = data.get(kind.store_name()) else {
                continue;
            };
            self.insert_kind(kind, user_id, rows, &mut result).await;
        }

        info!(
            user = %user_id,
            inserted = result.inserted,
            failed = result.failed.len(),
            "snapshot upload complete"
        );
        Ok(result)
    }

    async fn insert_kind(
        &self,
        kind: EntityKind,
        user_id: &str,
        rows: &[Value],
        result: &mut BatchResult,
    ) {
        match kind {
            EntityKind::ShopSettings => {
                self.insert_rows::<ShopSettings>(user_id, rows, result).await
            }
            EntityKind::Product => self.insert_rows::<Product>(user_id, rows, result).await,
            EntityKind::Contact => self.insert_rows::<Contact>(user_id, rows, result).await,
            EntityKind::Branch => self.insert_rows::<Branch>(user_id, rows, result).await,
            EntityKind::Employee => self.insert_rows::<Employee>(user_id, rows, result).await,
            EntityKind::Expense => self.insert_rows::<Expense>(user_id, rows, result).await,
            EntityKind::LoanTransaction => {
                self.insert_rows::<LoanTransaction>(user_id, rows, result)
                    .await
            }
            EntityKind::SaleReturn => self.insert_rows::<SaleReturn>(user_id, rows, result).await,
            EntityKind::BulkPurchase => {
                self.insert_rows::<BulkPurchase>(user_id, rows, result).await
            }
            EntityKind::Sale => self.insert_rows::<Sale>(user_id, rows, result).await,
            EntityKind::SaleReturnItem => {
                self.insert_rows::<SaleReturnItem>(user_id, rows, result)
                    .await
            }
            EntityKind::BulkPurchaseItem => {
                self.insert_rows::<BulkPurchaseItem>(user_id, rows, result)
                    .await
            }
            EntityKind::SaleItem => self.insert_rows::<SaleItem>(user_id, rows, result).await,
        }
    }

    async fn insert_rows<T: SyncStore>(
        &self,
        user_id: &str,
        rows: &[Value],
        result: &mut BatchResult,
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
                    result.failed.push(RecordFailure {
                        id,
                        entity_type: T::KIND.model_name().to_string(),
                        message: format!("malformed record: {err}"),
                    });
                    continue;
                }
            };

            record.stamp(user_id, now);
            match record.insert(&self.pool).await {
                Ok(()) => result.inserted += 1,
                Err(err) => result.failed.push(RecordFailure {
                    id,
                    entity_type: T::KIND.model_name().to_string(),
                    message: err.to_string(),
                }),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockbook_core::entity::EntityKind;
    use stockbook_db::{count_for_user, Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// A snapshot with the full parent/child chain: contact ← sale ← item,
    /// sale ← return ← return item, plus a purchase with an item.
    fn full_payload() -> SyncData {
        let mut data = SyncData::new();
        data.insert(
            "contacts".into(),
            vec![json!({
                "id": "c1", "userId": "x", "name": "Karim Traders",
                "contactType": "customer", "createdAt": "2026-08-01T10:00:00Z",
                "updatedAt": "2026-08-01T10:00:00Z"
            })],
        );
        data.insert(
            "products".into(),
            vec![json!({
                "id": "p1", "userId": "x", "name": "Valve", "quantity": 40,
                "retailPrice": 500.0, "wholesalePrice": 450.0,
                "purchasePrice": 16000.0, "perUnitPurchasePrice": 400.0,
                "createdAt": "2026-08-01T10:00:00Z",
                "updatedAt": "2026-08-01T10:00:00Z"
            })],
        );
        data.insert(
            "sales".into(),
            vec![json!({
                "id": "s1", "userId": "x", "billNumber": "B-1",
                "totalAmount": 1000.0, "originalTotalAmount": 1000.0,
                "paidAmount": 500.0, "saleDate": "2026-08-02T11:00:00Z",
                "contactId": "c1",
                "createdAt": "2026-08-02T11:00:00Z",
                "updatedAt": "2026-08-02T11:00:00Z"
            })],
        );
        data.insert(
            "saleItems".into(),
            vec![json!({
                "id": "si1", "userId": "x", "saleId": "s1", "productId": "p1",
                "quantity": 2, "price": 500.0, "purchasePrice": 400.0,
                "createdAt": "2026-08-02T11:00:00Z",
                "updatedAt": "2026-08-02T11:00:00Z"
            })],
        );
        data.insert(
            "saleReturns".into(),
            vec![json!({
                "id": "r1", "userId": "x", "returnNumber": "R-1", "saleId": "s1",
                "totalAmount": 500.0, "refundAmount": 500.0, "refundPaid": true,
                "refundDate": "2026-08-03T09:00:00Z",
                "createdAt": "2026-08-03T09:00:00Z",
                "updatedAt": "2026-08-03T09:00:00Z"
            })],
        );
        data.insert(
            "saleReturnItems".into(),
            vec![json!({
                "id": "ri1", "userId": "x", "returnId": "r1", "productId": "p1",
                "quantity": 1, "price": 500.0, "removeFromStock": false,
                "createdAt": "2026-08-03T09:00:00Z",
                "updatedAt": "2026-08-03T09:00:00Z"
            })],
        );
        data.insert(
            "bulkPurchases".into(),
            vec![json!({
                "id": "bp1", "userId": "x", "invoiceNumber": "INV-1",
                "totalAmount": 16000.0, "paidAmount": 16000.0,
                "purchaseDate": "2026-08-01T09:00:00Z",
                "createdAt": "2026-08-01T09:00:00Z",
                "updatedAt": "2026-08-01T09:00:00Z"
            })],
        );
        data.insert(
            "bulkPurchaseItems".into(),
            vec![json!({
                "id": "bpi1", "userId": "x", "purchaseId": "bp1",
                "productId": "p1", "quantity": 40, "price": 400.0,
                "createdAt": "2026-08-01T09:00:00Z",
                "updatedAt": "2026-08-01T09:00:00Z"
            })],
        );
        data
    }

    #[tokio::test]
    async fn test_upload_orders_parents_before_children() {
        let db = test_db().await;
        let snapshot = Snapshot::new(db.pool().clone());

        // Payload key order is alphabetical (BTreeMap), which puts
        // bulkPurchaseItems before bulkPurchases. Insert order must not
        // follow it, or the foreign keys reject the children.
        let result = snapshot.upload("u1", &full_payload()).await.unwrap();
        assert_eq!(result.inserted, 8);
        assert!(result.failed.is_empty(), "{:?}", result.failed);
    }

    #[tokio::test]
    async fn test_upload_wipes_previous_snapshot() {
        let db = test_db().await;
        let snapshot = Snapshot::new(db.pool().clone());

        snapshot.upload("u1", &full_payload()).await.unwrap();

        // Second upload with a single product: everything else must go.
        let mut data = SyncData::new();
        data.insert(
            "products".into(),
            vec![json!({
                "id": "p9", "userId": "x", "name": "Gasket", "quantity": 5,
                "retailPrice": 50.0, "wholesalePrice": 40.0,
                "purchasePrice": 150.0, "perUnitPurchasePrice": 30.0,
                "createdAt": "2026-08-10T10:00:00Z",
                "updatedAt": "2026-08-10T10:00:00Z"
            })],
        );
        snapshot.upload("u1", &data).await.unwrap();

        assert_eq!(
            count_for_user(db.pool(), EntityKind::Product, "u1")
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            count_for_user(db.pool(), EntityKind::Sale, "u1").await.unwrap(),
            0
        );
        assert_eq!(
            count_for_user(db.pool(), EntityKind::SaleItem, "u1")
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_upload_does_not_touch_other_tenants() {
        let db = test_db().await;
        let snapshot = Snapshot::new(db.pool().clone());

        snapshot.upload("u1", &full_payload()).await.unwrap();
        snapshot.upload("u2", &full_payload()).await.unwrap();

        // u2's wipe must not have removed u1's rows. Same ids across
        // tenants do collide on the primary key, so u2's copies fail
        // as inserts rather than silently stealing u1's rows.
        assert_eq!(
            count_for_user(db.pool(), EntityKind::Sale, "u1").await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_download_embeds_children_and_product_labels() {
        let db = test_db().await;
        let snapshot = Snapshot::new(db.pool().clone());

        snapshot.upload("u1", &full_payload()).await.unwrap();
        let export = snapshot.download("u1").await.unwrap();

        assert_eq!(export.sales.len(), 1);
        let sale = &export.sales[0];
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].product_name, "Valve");
        assert_eq!(sale.returns.len(), 1);
        assert_eq!(sale.returns[0].items.len(), 1);
        assert_eq!(export.bulk_purchases[0].items.len(), 1);
    }

    #[tokio::test]
    async fn test_download_then_upload_round_trips_every_row() {
        let db = test_db().await;
        let snapshot = Snapshot::new(db.pool().clone());

        snapshot.upload("u1", &full_payload()).await.unwrap();
        let export = snapshot.download("u1").await.unwrap();

        let reupload = export.into_sync_data().unwrap();
        let result = snapshot.upload("u1", &reupload).await.unwrap();
        assert!(result.failed.is_empty(), "{:?}", result.failed);

        for kind in EntityKind::all() {
            let expected = match kind {
                EntityKind::Contact
                | EntityKind::Product
                | EntityKind::Sale
                | EntityKind::SaleItem
                | EntityKind::SaleReturn
                | EntityKind::SaleReturnItem
                | EntityKind::BulkPurchase
                | EntityKind::BulkPurchaseItem => 1,
                _ => 0,
            };
            assert_eq!(
                count_for_user(db.pool(), *kind, "u1").await.unwrap(),
                expected,
                "row count for {kind:?}"
            );
        }
    }
}
