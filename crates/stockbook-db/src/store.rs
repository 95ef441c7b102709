//! # Sync Store
//!
//! Typed persistence for every synced entity, plus the generic operations
//! the sync engine needs over all of them.
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncStore Trait                                  │
//! │                                                                         │
//! │  Per-entity (hand-written, compile-time checked columns):              │
//! │    insert(pool)      - INSERT with the full column list                │
//! │    update(pool)      - UPDATE of every mutable column                  │
//! │    stamp(user, now)  - overwrite user_id + updated_at server-side      │
//! │                                                                         │
//! │  Generic (default impls over EntityKind::table_name):                  │
//! │    fetch(pool, id, user)        - row by primary key                   │
//! │    list_for_user(pool, user)    - full snapshot export                 │
//! │    changed_since(pool, user, t) - incremental pull (updated_at > t)    │
//! │                                                                         │
//! │  Free functions:                                                       │
//! │    wipe_user_data  - DELETE in child-before-parent order, one txn      │
//! │    count_for_user  - row count per kind                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The trait is deliberately not object-safe: the sync engine dispatches
//! with an exhaustive match over [`EntityKind`], so adding an entity is a
//! compile error until every consumer handles it.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};

use stockbook_core::entity::{EntityKind, DELETE_ORDER};
use stockbook_core::types::{
    Branch, BulkPurchase, BulkPurchaseItem, Contact, Employee, Expense, LoanTransaction, Product,
    Sale, SaleItem, SaleReturn, SaleReturnItem, ShopSettings,
};

use crate::error::DbResult;

// =============================================================================
// Trait
// =============================================================================

/// A synced entity that knows how to persist itself.
pub trait SyncStore:
    Sized
    + Send
    + Sync
    + Unpin
    + Serialize
    + DeserializeOwned
    + for<'r> FromRow<'r, SqliteRow>
{
    /// Which entity kind this type is.
    const KIND: EntityKind;

    /// Primary key.
    fn id(&self) -> &str;

    /// Change clock value.
    fn updated_at(&self) -> DateTime<Utc>;

    /// Overwrites the tenant owner and change clock before a server write.
    /// Client-supplied values for these two fields are never trusted.
    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>);

    /// Inserts the row.
    fn insert(&self, pool: &SqlitePool) -> impl std::future::Future<Output = DbResult<()>> + Send;

    /// Updates every mutable column of the row.
    fn update(&self, pool: &SqlitePool) -> impl std::future::Future<Output = DbResult<()>> + Send;

    /// Fetches a row by primary key, scoped to its owner.
    fn fetch(
        pool: &SqlitePool,
        id: &str,
        user_id: &str,
    ) -> impl std::future::Future<Output = DbResult<Option<Self>>> + Send {
        async move {
            let sql = format!(
                "SELECT * FROM {} WHERE id = ? AND user_id = ?",
                Self::KIND.table_name()
            );
            let row = sqlx::query_as::<_, Self>(&sql)
                .bind(id)
                .bind(user_id)
                .fetch_optional(pool)
                .await?;
            Ok(row)
        }
    }

    /// All rows for an account, in creation order.
    fn list_for_user(
        pool: &SqlitePool,
        user_id: &str,
    ) -> impl std::future::Future<Output = DbResult<Vec<Self>>> + Send {
        async move {
            let sql = format!(
                "SELECT * FROM {} WHERE user_id = ? ORDER BY created_at",
                Self::KIND.table_name()
            );
            let rows = sqlx::query_as::<_, Self>(&sql)
                .bind(user_id)
                .fetch_all(pool)
                .await?;
            Ok(rows)
        }
    }

    /// Rows whose change clock is strictly newer than `since`.
    fn changed_since(
        pool: &SqlitePool,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> impl std::future::Future<Output = DbResult<Vec<Self>>> + Send {
        async move {
            let sql = format!(
                "SELECT * FROM {} WHERE user_id = ? AND updated_at > ? ORDER BY updated_at",
                Self::KIND.table_name()
            );
            let rows = sqlx::query_as::<_, Self>(&sql)
                .bind(user_id)
                .bind(since)
                .fetch_all(pool)
                .await?;
            Ok(rows)
        }
    }
}

// =============================================================================
// Free Functions
// =============================================================================

/// Deletes everything an account owns, child tables strictly before the
/// tables they reference, in a single transaction. Either all entity data
/// is gone or none of it is. The audit trail is append-only and survives.
pub async fn wipe_user_data(pool: &SqlitePool, user_id: &str) -> DbResult<()> {
    let mut tx = pool.begin().await?;

    for kind in DELETE_ORDER {
        let sql = format!("DELETE FROM {} WHERE user_id = ?", kind.table_name());
        sqlx::query(&sql).bind(user_id).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Row count for one entity kind and account.
pub async fn count_for_user(
    pool: &SqlitePool,
    kind: EntityKind,
    user_id: &str,
) -> DbResult<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE user_id = ?",
        kind.table_name()
    );
    let count: i64 = sqlx::query_scalar(&sql).bind(user_id).fetch_one(pool).await?;
    Ok(count)
}

// =============================================================================
// Implementations
// =============================================================================

impl SyncStore for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, user_id, name, sku, quantity, low_stock_threshold,
                retail_price, wholesale_price, purchase_price,
                per_unit_purchase_price, is_raw_material, damaged_quantity,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.name)
        .bind(&self.sku)
        .bind(self.quantity)
        .bind(self.low_stock_threshold)
        .bind(self.retail_price)
        .bind(self.wholesale_price)
        .bind(self.purchase_price)
        .bind(self.per_unit_purchase_price)
        .bind(self.is_raw_material)
        .bind(self.damaged_quantity)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE products SET
                name = ?, sku = ?, quantity = ?, low_stock_threshold = ?,
                retail_price = ?, wholesale_price = ?, purchase_price = ?,
                per_unit_purchase_price = ?, is_raw_material = ?,
                damaged_quantity = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.name)
        .bind(&self.sku)
        .bind(self.quantity)
        .bind(self.low_stock_threshold)
        .bind(self.retail_price)
        .bind(self.wholesale_price)
        .bind(self.purchase_price)
        .bind(self.per_unit_purchase_price)
        .bind(self.is_raw_material)
        .bind(self.damaged_quantity)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for Contact {
    const KIND: EntityKind = EntityKind::Contact;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO contacts (
                id, user_id, name, contact_type, phone_number, address,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.name)
        .bind(self.contact_type)
        .bind(&self.phone_number)
        .bind(&self.address)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE contacts SET
                name = ?, contact_type = ?, phone_number = ?, address = ?,
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.name)
        .bind(self.contact_type)
        .bind(&self.phone_number)
        .bind(&self.address)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for Sale {
    const KIND: EntityKind = EntityKind::Sale;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, user_id, bill_number, total_amount, original_total_amount,
                discount, paid_amount, sale_date, contact_id, employee_id,
                transport_name, transport_fare, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.bill_number)
        .bind(self.total_amount)
        .bind(self.original_total_amount)
        .bind(self.discount)
        .bind(self.paid_amount)
        .bind(self.sale_date)
        .bind(&self.contact_id)
        .bind(&self.employee_id)
        .bind(&self.transport_name)
        .bind(self.transport_fare)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sales SET
                bill_number = ?, total_amount = ?, original_total_amount = ?,
                discount = ?, paid_amount = ?, sale_date = ?, contact_id = ?,
                employee_id = ?, transport_name = ?, transport_fare = ?,
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.bill_number)
        .bind(self.total_amount)
        .bind(self.original_total_amount)
        .bind(self.discount)
        .bind(self.paid_amount)
        .bind(self.sale_date)
        .bind(&self.contact_id)
        .bind(&self.employee_id)
        .bind(&self.transport_name)
        .bind(self.transport_fare)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for SaleItem {
    const KIND: EntityKind = EntityKind::SaleItem;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, user_id, sale_id, product_id, quantity, price,
                purchase_price, price_type, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.sale_id)
        .bind(&self.product_id)
        .bind(self.quantity)
        .bind(self.price)
        .bind(self.purchase_price)
        .bind(self.price_type)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sale_items SET
                sale_id = ?, product_id = ?, quantity = ?, price = ?,
                purchase_price = ?, price_type = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.sale_id)
        .bind(&self.product_id)
        .bind(self.quantity)
        .bind(self.price)
        .bind(self.purchase_price)
        .bind(self.price_type)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for BulkPurchase {
    const KIND: EntityKind = EntityKind::BulkPurchase;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bulk_purchases (
                id, user_id, invoice_number, total_amount, paid_amount,
                discount, purchase_date, contact_id, transport_name,
                transport_fare, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.invoice_number)
        .bind(self.total_amount)
        .bind(self.paid_amount)
        .bind(self.discount)
        .bind(self.purchase_date)
        .bind(&self.contact_id)
        .bind(&self.transport_name)
        .bind(self.transport_fare)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE bulk_purchases SET
                invoice_number = ?, total_amount = ?, paid_amount = ?,
                discount = ?, purchase_date = ?, contact_id = ?,
                transport_name = ?, transport_fare = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.invoice_number)
        .bind(self.total_amount)
        .bind(self.paid_amount)
        .bind(self.discount)
        .bind(self.purchase_date)
        .bind(&self.contact_id)
        .bind(&self.transport_name)
        .bind(self.transport_fare)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for BulkPurchaseItem {
    const KIND: EntityKind = EntityKind::BulkPurchaseItem;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bulk_purchase_items (
                id, user_id, purchase_id, product_id, quantity, price,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.purchase_id)
        .bind(&self.product_id)
        .bind(self.quantity)
        .bind(self.price)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE bulk_purchase_items SET
                purchase_id = ?, product_id = ?, quantity = ?, price = ?,
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.purchase_id)
        .bind(&self.product_id)
        .bind(self.quantity)
        .bind(self.price)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for SaleReturn {
    const KIND: EntityKind = EntityKind::SaleReturn;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_returns (
                id, user_id, return_number, sale_id, total_amount,
                refund_amount, refund_paid, refund_date, reason,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.return_number)
        .bind(&self.sale_id)
        .bind(self.total_amount)
        .bind(self.refund_amount)
        .bind(self.refund_paid)
        .bind(self.refund_date)
        .bind(&self.reason)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sale_returns SET
                return_number = ?, sale_id = ?, total_amount = ?,
                refund_amount = ?, refund_paid = ?, refund_date = ?,
                reason = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.return_number)
        .bind(&self.sale_id)
        .bind(self.total_amount)
        .bind(self.refund_amount)
        .bind(self.refund_paid)
        .bind(self.refund_date)
        .bind(&self.reason)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for SaleReturnItem {
    const KIND: EntityKind = EntityKind::SaleReturnItem;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_return_items (
                id, user_id, return_id, product_id, quantity, price,
                remove_from_stock, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.return_id)
        .bind(&self.product_id)
        .bind(self.quantity)
        .bind(self.price)
        .bind(self.remove_from_stock)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sale_return_items SET
                return_id = ?, product_id = ?, quantity = ?, price = ?,
                remove_from_stock = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.return_id)
        .bind(&self.product_id)
        .bind(self.quantity)
        .bind(self.price)
        .bind(self.remove_from_stock)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for LoanTransaction {
    const KIND: EntityKind = EntityKind::LoanTransaction;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO loan_transactions (
                id, user_id, contact_id, amount, kind, date, note,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.contact_id)
        .bind(self.amount)
        .bind(self.kind)
        .bind(self.date)
        .bind(&self.note)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE loan_transactions SET
                contact_id = ?, amount = ?, kind = ?, date = ?, note = ?,
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.contact_id)
        .bind(self.amount)
        .bind(self.kind)
        .bind(self.date)
        .bind(&self.note)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for Expense {
    const KIND: EntityKind = EntityKind::Expense;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, user_id, amount, date, category, description,
                contact_id, product_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(self.amount)
        .bind(self.date)
        .bind(&self.category)
        .bind(&self.description)
        .bind(&self.contact_id)
        .bind(&self.product_id)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE expenses SET
                amount = ?, date = ?, category = ?, description = ?,
                contact_id = ?, product_id = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(self.amount)
        .bind(self.date)
        .bind(&self.category)
        .bind(&self.description)
        .bind(&self.contact_id)
        .bind(&self.product_id)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for Branch {
    const KIND: EntityKind = EntityKind::Branch;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO branches (
                id, user_id, name, address, phone_number, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.name)
        .bind(&self.address)
        .bind(&self.phone_number)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE branches SET
                name = ?, address = ?, phone_number = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.name)
        .bind(&self.address)
        .bind(&self.phone_number)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for Employee {
    const KIND: EntityKind = EntityKind::Employee;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO employees (
                id, user_id, name, phone_number, branch_id, salary,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.name)
        .bind(&self.phone_number)
        .bind(&self.branch_id)
        .bind(self.salary)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE employees SET
                name = ?, phone_number = ?, branch_id = ?, salary = ?,
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.name)
        .bind(&self.phone_number)
        .bind(&self.branch_id)
        .bind(self.salary)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl SyncStore for ShopSettings {
    const KIND: EntityKind = EntityKind::ShopSettings;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.user_id = user_id.to_string();
        self.updated_at = now;
    }

    async fn insert(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shop_settings (
                id, user_id, shop_name, address, phone_number, currency,
                receipt_footer, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.user_id)
        .bind(&self.shop_name)
        .bind(&self.address)
        .bind(&self.phone_number)
        .bind(&self.currency)
        .bind(&self.receipt_footer)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pool: &SqlitePool) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE shop_settings SET
                shop_name = ?, address = ?, phone_number = ?, currency = ?,
                receipt_footer = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&self.shop_name)
        .bind(&self.address)
        .bind(&self.phone_number)
        .bind(&self.currency)
        .bind(&self.receipt_footer)
        .bind(self.updated_at)
        .bind(&self.id)
        .bind(&self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
