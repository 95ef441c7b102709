//! # Bulk Purchase Repository
//!
//! Database operations for supplier invoices and their line items.
//!
//! Creating a purchase increments each product's stock and refreshes its
//! purchase prices (lot cost and per-unit cost). Deleting a purchase
//! reverses the stock effect. Both run as single transactions with the
//! parent row.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::audit::AuditRepository;
use crate::store::SyncStore;
use stockbook_core::{BulkPurchase, BulkPurchaseItem, Money, Product};

/// Input for one purchase line.
#[derive(Debug, Clone)]
pub struct NewPurchaseItem {
    pub product_id: String,
    pub quantity: i64,
    /// Unit cost on this invoice.
    pub price: Money,
}

/// Input for a new bulk purchase.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub invoice_number: String,
    pub purchase_date: DateTime<Utc>,
    pub contact_id: Option<String>,
    pub discount: Money,
    pub paid_amount: Money,
    pub transport_name: Option<String>,
    pub transport_fare: Money,
    pub items: Vec<NewPurchaseItem>,
}

/// Repository for bulk purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Creates a purchase with its lines, increments stock and refreshes
    /// each product's purchase prices, in one transaction.
    pub async fn create(&self, user_id: &str, new_purchase: NewPurchase) -> DbResult<BulkPurchase> {
        if new_purchase.items.is_empty() {
            return Err(DbError::conflict("A purchase needs at least one item"));
        }

        let now = Utc::now();
        let purchase_id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        let mut total = Money::zero();
        for item in &new_purchase.items {
            if item.quantity <= 0 {
                return Err(DbError::conflict("Purchase line quantity must be positive"));
            }
            total += item.price * item.quantity;
        }
        total -= new_purchase.discount;

        let purchase = BulkPurchase {
            id: purchase_id.clone(),
            user_id: user_id.to_string(),
            invoice_number: new_purchase.invoice_number,
            total_amount: total,
            paid_amount: new_purchase.paid_amount,
            discount: new_purchase.discount,
            purchase_date: new_purchase.purchase_date,
            contact_id: new_purchase.contact_id,
            transport_name: new_purchase.transport_name,
            transport_fare: new_purchase.transport_fare,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO bulk_purchases (
                id, user_id, invoice_number, total_amount, paid_amount,
                discount, purchase_date, contact_id, transport_name,
                transport_fare, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.user_id)
        .bind(&purchase.invoice_number)
        .bind(purchase.total_amount)
        .bind(purchase.paid_amount)
        .bind(purchase.discount)
        .bind(purchase.purchase_date)
        .bind(&purchase.contact_id)
        .bind(&purchase.transport_name)
        .bind(purchase.transport_fare)
        .bind(purchase.created_at)
        .bind(purchase.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &new_purchase.items {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM products WHERE id = ? AND user_id = ?",
            )
            .bind(&item.product_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
            if exists == 0 {
                return Err(DbError::not_found("Product", &item.product_id));
            }

            sqlx::query(
                r#"
                INSERT INTO bulk_purchase_items (
                    id, user_id, purchase_id, product_id, quantity, price,
                    created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(&purchase_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            // Stock up and remember what this lot cost.
            sqlx::query(
                r#"
                UPDATE products SET
                    quantity = quantity + ?,
                    purchase_price = ?,
                    per_unit_purchase_price = ?,
                    updated_at = ?
                WHERE id = ? AND user_id = ?
                "#,
            )
            .bind(item.quantity)
            .bind(item.price * item.quantity)
            .bind(item.price)
            .bind(now)
            .bind(&item.product_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(id = %purchase.id, invoice = %purchase.invoice_number, "Bulk purchase created");
        Ok(purchase)
    }

    /// Fetches a purchase by ID, scoped to its owner.
    pub async fn get_by_id(&self, id: &str, user_id: &str) -> DbResult<BulkPurchase> {
        BulkPurchase::fetch(&self.pool, id, user_id)
            .await?
            .ok_or_else(|| DbError::not_found("BulkPurchase", id))
    }

    /// Lines of a purchase, in creation order.
    pub async fn items(&self, purchase_id: &str, user_id: &str) -> DbResult<Vec<BulkPurchaseItem>> {
        let items = sqlx::query_as::<_, BulkPurchaseItem>(
            "SELECT * FROM bulk_purchase_items WHERE purchase_id = ? AND user_id = ? ORDER BY created_at",
        )
        .bind(purchase_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Changes the paid amount on a purchase, appending an audit row when
    /// the numeric value actually changed.
    pub async fn update_paid_amount(
        &self,
        id: &str,
        user_id: &str,
        paid_amount: Money,
    ) -> DbResult<BulkPurchase> {
        let purchase = self.get_by_id(id, user_id).await?;

        sqlx::query(
            "UPDATE bulk_purchases SET paid_amount = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(paid_amount)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        AuditRepository::new(self.pool.clone())
            .log_change(
                user_id,
                "bulk_purchases",
                id,
                "paidAmount",
                &purchase.paid_amount.major().to_string(),
                &paid_amount.major().to_string(),
                Some("Paid amount updated"),
            )
            .await;

        self.get_by_id(id, user_id).await
    }

    /// Deletes a purchase: decrements each line's stock back out, removes
    /// the lines, then the parent row, all in one transaction.
    ///
    /// Fails (and rolls back) when reversing a line would drive a
    /// product's stock negative, e.g. when the purchased units were
    /// already sold on.
    pub async fn delete(&self, id: &str, user_id: &str) -> DbResult<()> {
        let items = self.items(id, user_id).await?;
        self.get_by_id(id, user_id).await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for item in &items {
            let product = sqlx::query_as::<_, Product>(
                "SELECT * FROM products WHERE id = ? AND user_id = ?",
            )
            .bind(&item.product_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;

            if product.quantity < item.quantity {
                return Err(DbError::conflict(format!(
                    "Cannot delete purchase: only {} unit(s) of '{}' left in stock, {} came from this invoice",
                    product.quantity, product.name, item.quantity
                )));
            }

            sqlx::query(
                "UPDATE products SET quantity = quantity - ?, updated_at = ? WHERE id = ? AND user_id = ?",
            )
            .bind(item.quantity)
            .bind(now)
            .bind(&item.product_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM bulk_purchase_items WHERE purchase_id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM bulk_purchases WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_purchase_create_then_delete_restores_stock() {
        let db = test_db().await;
        let product = db
            .products()
            .create("u1", "Sugar 1kg", None, 5, Money::zero(), Money::zero())
            .await
            .unwrap();

        let purchase = db
            .purchases()
            .create(
                "u1",
                NewPurchase {
                    invoice_number: "INV-1".into(),
                    purchase_date: Utc::now(),
                    contact_id: None,
                    discount: Money::zero(),
                    paid_amount: Money::zero(),
                    transport_name: None,
                    transport_fare: Money::zero(),
                    items: vec![NewPurchaseItem {
                        product_id: product.id.clone(),
                        quantity: 20,
                        price: Money::from_minor(12000),
                    }],
                },
            )
            .await
            .unwrap();
        assert_eq!(purchase.total_amount, Money::from_minor(240000));

        let stocked = db.products().get_by_id(&product.id, "u1").await.unwrap();
        assert_eq!(stocked.quantity, 25);
        assert_eq!(stocked.per_unit_purchase_price, Money::from_minor(12000));

        db.purchases().delete(&purchase.id, "u1").await.unwrap();
        let reversed = db.products().get_by_id(&product.id, "u1").await.unwrap();
        assert_eq!(reversed.quantity, 5);
    }

    #[tokio::test]
    async fn test_delete_refuses_when_units_already_sold() {
        let db = test_db().await;
        let product = db
            .products()
            .create("u1", "Sugar 1kg", None, 0, Money::from_minor(15000), Money::zero())
            .await
            .unwrap();

        let purchase = db
            .purchases()
            .create(
                "u1",
                NewPurchase {
                    invoice_number: "INV-1".into(),
                    purchase_date: Utc::now(),
                    contact_id: None,
                    discount: Money::zero(),
                    paid_amount: Money::zero(),
                    transport_name: None,
                    transport_fare: Money::zero(),
                    items: vec![NewPurchaseItem {
                        product_id: product.id.clone(),
                        quantity: 10,
                        price: Money::from_minor(12000),
                    }],
                },
            )
            .await
            .unwrap();

        // Sell 8 of the 10 purchased units.
        db.sales()
            .create(
                "u1",
                crate::repository::sale::NewSale {
                    bill_number: "B-1".into(),
                    sale_date: Utc::now(),
                    contact_id: None,
                    employee_id: None,
                    discount: Money::zero(),
                    paid_amount: Money::zero(),
                    transport_name: None,
                    transport_fare: Money::zero(),
                    items: vec![crate::repository::sale::NewSaleItem {
                        product_id: product.id.clone(),
                        quantity: 8,
                        price: Money::from_minor(15000),
                        price_type: Default::default(),
                    }],
                },
            )
            .await
            .unwrap();

        assert!(db.purchases().delete(&purchase.id, "u1").await.is_err());
        // Rollback left stock untouched.
        let product = db.products().get_by_id(&product.id, "u1").await.unwrap();
        assert_eq!(product.quantity, 2);
    }
}
