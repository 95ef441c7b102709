//! # Sync Protocol Types
//!
//! Request/response payloads shared between the sync engine and the HTTP
//! layer. Field names are camelCase on the wire, matching the offline
//! client's JSON.
//!
//! ## Payload Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Upload / incremental upload:                                           │
//! │    { "data": { "products": [...], "sales": [...], ... },                │
//! │      "lastSyncTimestamp": "2026-08-30T09:00:00Z" }                      │
//! │                                                                         │
//! │  Download:                                                              │
//! │    { "products": [...],                                                 │
//! │      "sales": [ { ...sale, "items": [ { ...item,                        │
//! │                                         "productName": "...",           │
//! │                                         "productSku": "..." } ],        │
//! │                  "returns": [ { ...return, "items": [...] } ] } ],      │
//! │      "saleItems": [...], ... }      ← flat lists kept alongside         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows travel as raw JSON objects keyed by wire store name; typed
//! deserialization happens per record inside the engine so one malformed
//! row cannot poison a batch.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use stockbook_core::types::{
    Branch, BulkPurchase, BulkPurchaseItem, Contact, Employee, Expense, LoanTransaction, Product,
    Sale, SaleItem, SaleReturn, SaleReturnItem, ShopSettings,
};

/// Raw sync payload: wire store name → list of JSON rows.
///
/// A BTreeMap so iteration order is deterministic, though the engine
/// processes kinds in its own fixed order regardless.
pub type SyncData = BTreeMap<String, Vec<Value>>;

// =============================================================================
// Requests
// =============================================================================

/// Body of a full-snapshot upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotUploadRequest {
    pub data: SyncData,
    /// Client's wall clock at export time. Informational only.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Body of an incremental upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementalUploadRequest {
    pub data: SyncData,
    /// The server time the client last synced at; the conflict threshold.
    pub last_sync_timestamp: DateTime<Utc>,
}

// =============================================================================
// Outcomes
// =============================================================================

/// A detected write conflict. The server row was newer than the client's
/// last known state, so nothing was written: both versions travel back
/// and the client must choose.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub id: String,
    /// Model name, e.g. "Sale".
    pub entity_type: String,
    #[ts(type = "any")]
    pub server_data: Value,
    #[ts(type = "any")]
    pub client_data: Value,
}

/// One record that could not be applied. Isolated per record: a failure
/// never aborts the rest of the batch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RecordFailure {
    /// The record's ID when it could be read from the payload.
    pub id: Option<String>,
    pub entity_type: String,
    pub message: String,
}

/// Result of an incremental reconcile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    pub created: u64,
    pub updated: u64,
    pub conflicts: Vec<ConflictRecord>,
    pub failed: Vec<RecordFailure>,
}

/// Result of a full-snapshot upload's insert phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub inserted: u64,
    pub failed: Vec<RecordFailure>,
}

// =============================================================================
// Snapshot Export
// =============================================================================

/// A sale line enriched with a product projection for display.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemExport {
    #[serde(flatten)]
    pub item: SaleItem,
    pub product_name: String,
    #[serde(default)]
    pub product_sku: Option<String>,
}

/// A sale return with its item list.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleReturnExport {
    #[serde(flatten)]
    pub sale_return: SaleReturn,
    pub items: Vec<SaleReturnItem>,
}

/// A sale with its items (enriched) and its returns (nested).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleExport {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItemExport>,
    pub returns: Vec<SaleReturnExport>,
}

/// A bulk purchase with its item list.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BulkPurchaseExport {
    #[serde(flatten)]
    pub purchase: BulkPurchase,
    pub items: Vec<BulkPurchaseItem>,
}

/// Everything one account owns, shaped for a full download.
///
/// Parent exports embed their children for the client's display layer,
/// and the flat per-kind lists are kept alongside so a re-upload of this
/// exact payload reproduces every row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    pub shop_settings: Vec<ShopSettings>,
    pub products: Vec<Product>,
    pub contacts: Vec<Contact>,
    pub branches: Vec<Branch>,
    pub employees: Vec<Employee>,
    pub expenses: Vec<Expense>,
    pub loan_transactions: Vec<LoanTransaction>,
    pub sales: Vec<SaleExport>,
    pub bulk_purchases: Vec<BulkPurchaseExport>,
    pub sale_returns: Vec<SaleReturnExport>,
    pub sale_items: Vec<SaleItem>,
    pub bulk_purchase_items: Vec<BulkPurchaseItem>,
    pub sale_return_items: Vec<SaleReturnItem>,
}

impl SnapshotData {
    /// Re-keys the snapshot as a raw upload payload.
    pub fn into_sync_data(self) -> Result<SyncData, serde_json::Error> {
        fn rows<T: Serialize>(items: &[T]) -> Result<Vec<Value>, serde_json::Error> {
            items.iter().map(serde_json::to_value).collect()
        }

        let mut data = SyncData::new();
        data.insert("shopSettings".into(), rows(&self.shop_settings)?);
        data.insert("products".into(), rows(&self.products)?);
        data.insert("contacts".into(), rows(&self.contacts)?);
        data.insert("branches".into(), rows(&self.branches)?);
        data.insert("employees".into(), rows(&self.employees)?);
        data.insert("expenses".into(), rows(&self.expenses)?);
        data.insert("loanTransactions".into(), rows(&self.loan_transactions)?);
        data.insert("sales".into(), rows(&self.sales)?);
        data.insert("bulkPurchases".into(), rows(&self.bulk_purchases)?);
        data.insert("saleReturns".into(), rows(&self.sale_returns)?);
        data.insert("saleItems".into(), rows(&self.sale_items)?);
        data.insert("bulkPurchaseItems".into(), rows(&self.bulk_purchase_items)?);
        data.insert("saleReturnItems".into(), rows(&self.sale_return_items)?);
        Ok(data)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incremental_request_wire_names() {
        let json = r#"{
            "data": { "products": [] },
            "lastSyncTimestamp": "2026-08-30T09:00:00Z"
        }"#;
        let request: IncrementalUploadRequest = serde_json::from_str(json).unwrap();
        assert!(request.data.contains_key("products"));
    }

    #[test]
    fn test_sale_export_flattens_sale_fields() {
        use chrono::Utc;
        use stockbook_core::Money;

        let export = SaleExport {
            sale: Sale {
                id: "s1".into(),
                user_id: "u1".into(),
                bill_number: "B-1".into(),
                total_amount: Money::from_minor(10000),
                original_total_amount: Money::from_minor(10000),
                discount: Money::zero(),
                paid_amount: Money::zero(),
                sale_date: Utc::now(),
                contact_id: None,
                employee_id: None,
                transport_name: None,
                transport_fare: Money::zero(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            items: vec![],
            returns: vec![],
        };
        let json = serde_json::to_value(&export).unwrap();
        // Sale fields at the top level, children as arrays.
        assert_eq!(json["billNumber"], "B-1");
        assert!(json["items"].as_array().unwrap().is_empty());
        assert!(json["returns"].as_array().unwrap().is_empty());
    }
}
