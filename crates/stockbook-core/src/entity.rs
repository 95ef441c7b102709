//! # Entity Kinds
//!
//! A closed enumeration of every synced entity, with its three names:
//!
//! | Name kind   | Example              | Used by                        |
//! |-------------|----------------------|--------------------------------|
//! | store name  | `bulkPurchaseItems`  | wire payload keys (plural)     |
//! | model name  | `BulkPurchaseItem`   | audit trail, error messages    |
//! | table name  | `bulk_purchase_items`| SQL                            |
//!
//! The wipe and replay orderings live here too, so every consumer deletes
//! and inserts in the same dependency-safe sequence.

use serde::{Deserialize, Serialize};

/// Every entity kind that participates in sync.
///
/// Adding a variant here forces the compiler to flag every match that must
/// learn about it: the store dispatch, the snapshot ordering checks, the
/// wire-name mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Product,
    Contact,
    Sale,
    SaleItem,
    BulkPurchase,
    BulkPurchaseItem,
    SaleReturn,
    SaleReturnItem,
    LoanTransaction,
    Expense,
    Branch,
    Employee,
    ShopSettings,
}

/// Deletion order for a full wipe: children strictly before the rows they
/// reference, so no delete trips a foreign key.
pub const DELETE_ORDER: [EntityKind; 13] = [
    EntityKind::SaleItem,
    EntityKind::BulkPurchaseItem,
    EntityKind::SaleReturnItem,
    EntityKind::Sale,
    EntityKind::BulkPurchase,
    EntityKind::SaleReturn,
    EntityKind::LoanTransaction,
    EntityKind::Expense,
    EntityKind::Employee,
    EntityKind::Branch,
    EntityKind::Contact,
    EntityKind::Product,
    EntityKind::ShopSettings,
];

/// Insertion order for replay: the exact reverse of [`DELETE_ORDER`], so
/// every parent exists before its children arrive.
pub const INSERT_ORDER: [EntityKind; 13] = [
    EntityKind::ShopSettings,
    EntityKind::Product,
    EntityKind::Contact,
    EntityKind::Branch,
    EntityKind::Employee,
    EntityKind::Expense,
    EntityKind::LoanTransaction,
    EntityKind::SaleReturn,
    EntityKind::BulkPurchase,
    EntityKind::Sale,
    EntityKind::SaleReturnItem,
    EntityKind::BulkPurchaseItem,
    EntityKind::SaleItem,
];

impl EntityKind {
    /// All kinds, in insertion order.
    pub fn all() -> &'static [EntityKind; 13] {
        &INSERT_ORDER
    }

    /// Plural camelCase key used in sync payloads.
    pub fn store_name(&self) -> &'static str {
        match self {
            EntityKind::Product => "products",
            EntityKind::Contact => "contacts",
            EntityKind::Sale => "sales",
            EntityKind::SaleItem => "saleItems",
            EntityKind::BulkPurchase => "bulkPurchases",
            EntityKind::BulkPurchaseItem => "bulkPurchaseItems",
            EntityKind::SaleReturn => "saleReturns",
            EntityKind::SaleReturnItem => "saleReturnItems",
            EntityKind::LoanTransaction => "loanTransactions",
            EntityKind::Expense => "expenses",
            EntityKind::Branch => "branches",
            EntityKind::Employee => "employees",
            EntityKind::ShopSettings => "shopSettings",
        }
    }

    /// Singular PascalCase name used in audit rows and error messages.
    pub fn model_name(&self) -> &'static str {
        match self {
            EntityKind::Product => "Product",
            EntityKind::Contact => "Contact",
            EntityKind::Sale => "Sale",
            EntityKind::SaleItem => "SaleItem",
            EntityKind::BulkPurchase => "BulkPurchase",
            EntityKind::BulkPurchaseItem => "BulkPurchaseItem",
            EntityKind::SaleReturn => "SaleReturn",
            EntityKind::SaleReturnItem => "SaleReturnItem",
            EntityKind::LoanTransaction => "LoanTransaction",
            EntityKind::Expense => "Expense",
            EntityKind::Branch => "Branch",
            EntityKind::Employee => "Employee",
            EntityKind::ShopSettings => "ShopSettings",
        }
    }

    /// SQL table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Product => "products",
            EntityKind::Contact => "contacts",
            EntityKind::Sale => "sales",
            EntityKind::SaleItem => "sale_items",
            EntityKind::BulkPurchase => "bulk_purchases",
            EntityKind::BulkPurchaseItem => "bulk_purchase_items",
            EntityKind::SaleReturn => "sale_returns",
            EntityKind::SaleReturnItem => "sale_return_items",
            EntityKind::LoanTransaction => "loan_transactions",
            EntityKind::Expense => "expenses",
            EntityKind::Branch => "branches",
            EntityKind::Employee => "employees",
            EntityKind::ShopSettings => "shop_settings",
        }
    }

    /// Look up a kind by its wire store name. `None` for unknown keys,
    /// which callers skip rather than fail the batch.
    pub fn from_store_name(name: &str) -> Option<EntityKind> {
        EntityKind::all()
            .iter()
            .copied()
            .find(|kind| kind.store_name() == name)
    }

    /// Look up a kind by its model name.
    pub fn from_model_name(name: &str) -> Option<EntityKind> {
        EntityKind::all()
            .iter()
            .copied()
            .find(|kind| kind.model_name() == name)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.model_name())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_orders_cover_every_kind_once() {
        let deletes: HashSet<_> = DELETE_ORDER.iter().collect();
        let inserts: HashSet<_> = INSERT_ORDER.iter().collect();
        assert_eq!(deletes.len(), 13);
        assert_eq!(inserts.len(), 13);
        assert_eq!(deletes, inserts);
    }

    #[test]
    fn test_insert_order_is_reverse_of_delete_order() {
        let mut reversed = DELETE_ORDER;
        reversed.reverse();
        assert_eq!(reversed, INSERT_ORDER);
    }

    #[test]
    fn test_children_delete_before_parents() {
        let position = |kind: EntityKind| {
            DELETE_ORDER
                .iter()
                .position(|k| *k == kind)
                .expect("kind in delete order")
        };
        assert!(position(EntityKind::SaleItem) < position(EntityKind::Sale));
        assert!(position(EntityKind::SaleItem) < position(EntityKind::Product));
        assert!(position(EntityKind::BulkPurchaseItem) < position(EntityKind::BulkPurchase));
        assert!(position(EntityKind::SaleReturnItem) < position(EntityKind::SaleReturn));
        assert!(position(EntityKind::Sale) < position(EntityKind::Contact));
        assert!(position(EntityKind::Employee) < position(EntityKind::Branch));
        assert!(position(EntityKind::LoanTransaction) < position(EntityKind::Contact));
    }

    #[test]
    fn test_store_name_round_trip() {
        for kind in EntityKind::all() {
            assert_eq!(EntityKind::from_store_name(kind.store_name()), Some(*kind));
            assert_eq!(EntityKind::from_model_name(kind.model_name()), Some(*kind));
        }
        assert_eq!(EntityKind::from_store_name("widgets"), None);
    }
}
