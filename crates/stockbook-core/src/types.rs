//! # Domain Types
//!
//! Core domain types used throughout Stockbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐    ┌──────────────────┐    ┌──────────────────┐      │
//! │  │   Product    │    │      Sale        │    │  BulkPurchase    │      │
//! │  │ ───────────  │    │ ──────────────   │    │ ──────────────   │      │
//! │  │ quantity     │◄───│ SaleItem[]       │    │ BulkPurchase     │      │
//! │  │ damaged_qty  │    │ SaleReturn[]     │    │ Item[]           │      │
//! │  └──────────────┘    └──────────────────┘    └──────────────────┘      │
//! │                                                                         │
//! │  ┌──────────────┐    ┌──────────────────┐    ┌──────────────────┐      │
//! │  │   Contact    │◄───│ LoanTransaction  │    │    Expense       │      │
//! │  │ customer /   │    │ GIVEN / TAKEN /  │    │                  │      │
//! │  │ supplier     │    │ RETURNED_*       │    │                  │      │
//! │  └──────────────┘    └──────────────────┘    └──────────────────┘      │
//! │                                                                         │
//! │  Branch · Employee · ShopSettings · AuditTrail                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - Every entity is scoped by an owning `user_id` (tenant isolation)
//! - Every entity carries `created_at` (immutable insertion time) and
//!   `updated_at` (the change clock used for conflict detection)
//! - Wire field names are camelCase, matching the offline client's JSON
//! - Business dates (`sale_date`, `purchase_date`, ...) are user-editable
//!   and may be backdated; `created_at` is the replay-order truth

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Enums
// =============================================================================

/// Whether a contact buys from us or sells to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    Customer,
    Supplier,
}

/// Which price list a sale line was charged from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Retail,
    Wholesale,
}

impl Default for PriceType {
    fn default() -> Self {
        PriceType::Retail
    }
}

/// Direction of a loan movement.
///
/// ## Sign Convention
/// GIVEN and RETURNED_TO_CONTACT increase what the contact owes us (debit);
/// TAKEN and RETURNED_BY_CONTACT decrease it (credit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanKind {
    Given,
    Taken,
    ReturnedByContact,
    ReturnedToContact,
}

impl LoanKind {
    /// True when this movement increases "contact owes us".
    pub fn is_debit(&self) -> bool {
        matches!(self, LoanKind::Given | LoanKind::ReturnedToContact)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
///
/// ## Invariants
/// - `quantity >= 0` always
/// - damage/restore move units between `quantity` and `damaged_quantity`
///   conservatively: their sum is unchanged by the pair of operations
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning account. Stamped server-side on every write.
    pub user_id: String,

    /// Display name, unique per account.
    pub name: String,

    /// SKU / barcode, unique per account when present.
    #[serde(default)]
    pub sku: Option<String>,

    /// Units currently in sellable stock.
    pub quantity: i64,

    /// Alert threshold for low-stock reporting.
    #[serde(default)]
    pub low_stock_threshold: i64,

    #[ts(as = "f64")]
    pub retail_price: Money,

    #[ts(as = "f64")]
    pub wholesale_price: Money,

    /// Total cost of the last purchase lot.
    #[ts(as = "f64")]
    pub purchase_price: Money,

    /// Cost per unit from the last purchase lot.
    #[ts(as = "f64")]
    pub per_unit_purchase_price: Money,

    /// Raw materials feed manufacturing and are excluded from sale lists.
    #[serde(default)]
    pub is_raw_material: bool,

    /// Units set aside as damaged (not sellable).
    #[serde(default)]
    pub damaged_quantity: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Total units owned, sellable or not.
    #[inline]
    pub fn total_units(&self) -> i64 {
        self.quantity + self.damaged_quantity
    }
}

// =============================================================================
// Contact
// =============================================================================

/// A customer or supplier. Referenced by sales, purchases, loans and
/// expenses; the statement builder derives a running balance per contact.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub user_id: String,
    /// Unique per account.
    pub name: String,
    pub contact_type: ContactType,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A sale bill. Owns an ordered collection of [`SaleItem`] and zero or
/// more [`SaleReturn`] children.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub user_id: String,
    pub bill_number: String,
    #[ts(as = "f64")]
    pub total_amount: Money,
    /// Total before discount was applied.
    #[ts(as = "f64")]
    pub original_total_amount: Money,
    #[ts(as = "f64")]
    #[serde(default)]
    pub discount: Money,
    #[ts(as = "f64")]
    #[serde(default)]
    pub paid_amount: Money,
    /// User-editable business date; may be backdated.
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub transport_name: Option<String>,
    #[ts(as = "f64")]
    #[serde(default)]
    pub transport_fare: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A line item in a sale. Price and cost are snapshots frozen at sale time
/// so history survives later product edits.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub user_id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price charged.
    #[ts(as = "f64")]
    pub price: Money,
    /// Unit cost at sale time (profit snapshot).
    #[ts(as = "f64")]
    pub purchase_price: Money,
    #[serde(default)]
    pub price_type: PriceType,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Bulk Purchase
// =============================================================================

/// A supplier invoice. Creating one increments each referenced product's
/// stock and refreshes its purchase prices; deleting reverses that.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BulkPurchase {
    pub id: String,
    pub user_id: String,
    pub invoice_number: String,
    #[ts(as = "f64")]
    pub total_amount: Money,
    #[ts(as = "f64")]
    #[serde(default)]
    pub paid_amount: Money,
    #[ts(as = "f64")]
    #[serde(default)]
    pub discount: Money,
    /// User-editable business date; may be backdated.
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub transport_name: Option<String>,
    #[ts(as = "f64")]
    #[serde(default)]
    pub transport_fare: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A line item in a bulk purchase.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BulkPurchaseItem {
    pub id: String,
    pub user_id: String,
    pub purchase_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Unit cost on this invoice.
    #[ts(as = "f64")]
    pub price: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Return
// =============================================================================

/// A return against a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleReturn {
    pub id: String,
    pub user_id: String,
    pub return_number: String,
    pub sale_id: String,
    #[ts(as = "f64")]
    pub total_amount: Money,
    #[ts(as = "f64")]
    #[serde(default)]
    pub refund_amount: Money,
    /// Only refunds actually paid out appear on the contact's ledger.
    #[serde(default)]
    pub refund_paid: bool,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub refund_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A returned line. `remove_from_stock` is captured at creation time:
/// damaged goods are removed, resellable ones restock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleReturnItem {
    pub id: String,
    pub user_id: String,
    pub return_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "f64")]
    pub price: Money,
    #[serde(default)]
    pub remove_from_stock: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Loan Transaction
// =============================================================================

/// A loan movement with a contact. See [`LoanKind`] for the sign convention.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoanTransaction {
    pub id: String,
    pub user_id: String,
    pub contact_id: String,
    #[ts(as = "f64")]
    pub amount: Money,
    #[serde(rename = "type")]
    pub kind: LoanKind,
    /// User-editable business date.
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Expense
// =============================================================================

/// A business expense, optionally tied to a contact or product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    #[ts(as = "f64")]
    pub amount: Money,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Organization
// =============================================================================

/// A shop branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// An employee, optionally assigned to a branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[ts(as = "Option<f64>")]
    #[serde(default)]
    pub salary: Option<Money>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Per-account shop configuration.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShopSettings {
    pub id: String,
    pub user_id: String,
    pub shop_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub receipt_footer: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "PKR".to_string()
}

// =============================================================================
// Audit Trail
// =============================================================================

/// An immutable field-change record. Appended when a tracked numeric field
/// (principally `paidAmount`) actually changes value; never updated or
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrail {
    pub id: String,
    pub user_id: String,
    /// Entity model name: "Sale", "BulkPurchase", "SaleReturn".
    pub table_name: String,
    pub record_id: String,
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Denormalized for efficient per-sale trail queries.
    #[serde(default)]
    pub sale_id: Option<String>,
    /// Denormalized for efficient per-purchase trail queries.
    #[serde(default)]
    pub purchase_id: Option<String>,
    #[ts(as = "String")]
    pub changed_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_kind_sign_convention() {
        assert!(LoanKind::Given.is_debit());
        assert!(LoanKind::ReturnedToContact.is_debit());
        assert!(!LoanKind::Taken.is_debit());
        assert!(!LoanKind::ReturnedByContact.is_debit());
    }

    #[test]
    fn test_loan_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&LoanKind::ReturnedByContact).unwrap(),
            "\"RETURNED_BY_CONTACT\""
        );
        let kind: LoanKind = serde_json::from_str("\"GIVEN\"").unwrap();
        assert_eq!(kind, LoanKind::Given);
    }

    #[test]
    fn test_sale_wire_field_names() {
        let sale = Sale {
            id: "s1".into(),
            user_id: "u1".into(),
            bill_number: "B-1".into(),
            total_amount: Money::from_minor(10000),
            original_total_amount: Money::from_minor(11000),
            discount: Money::from_minor(1000),
            paid_amount: Money::from_minor(5000),
            sale_date: Utc::now(),
            contact_id: None,
            employee_id: None,
            transport_name: None,
            transport_fare: Money::zero(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["billNumber"], "B-1");
        assert_eq!(json["paidAmount"], 50.0);
        assert!(json.get("bill_number").is_none());
    }

    #[test]
    fn test_product_total_units() {
        let mut product = Product {
            id: "p1".into(),
            user_id: "u1".into(),
            name: "Sugar 1kg".into(),
            sku: None,
            quantity: 40,
            low_stock_threshold: 5,
            retail_price: Money::from_minor(15000),
            wholesale_price: Money::from_minor(14000),
            purchase_price: Money::from_minor(500000),
            per_unit_purchase_price: Money::from_minor(12500),
            is_raw_material: false,
            damaged_quantity: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(product.total_units(), 42);
        product.quantity -= 3;
        product.damaged_quantity += 3;
        assert_eq!(product.total_units(), 42);
    }
}
