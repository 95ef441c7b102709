//! # Sale Repository
//!
//! Database operations for sales and their line items.
//!
//! ## Transaction Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create():                                                              │
//! │    BEGIN                                                                │
//! │      check stock for every line                                         │
//! │      INSERT sale                                                        │
//! │      INSERT sale_items (price + cost snapshots frozen)                  │
//! │      UPDATE products SET quantity = quantity - line.quantity            │
//! │    COMMIT          ← stock never observably diverges from the items     │
//! │                                                                         │
//! │  delete():                                                              │
//! │    BEGIN                                                                │
//! │      UPDATE products SET quantity = quantity + line.quantity            │
//! │      DELETE sale_items   ← children before parent                       │
//! │      DELETE sale                                                        │
//! │    COMMIT                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::audit::AuditRepository;
use crate::store::SyncStore;
use stockbook_core::{Money, PriceType, Product, Sale, SaleItem};

/// Input for one sale line.
#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
    pub price: Money,
    pub price_type: PriceType,
}

/// Input for a new sale.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub bill_number: String,
    pub sale_date: DateTime<Utc>,
    pub contact_id: Option<String>,
    pub employee_id: Option<String>,
    pub discount: Money,
    pub paid_amount: Money,
    pub transport_name: Option<String>,
    pub transport_fare: Money,
    pub items: Vec<NewSaleItem>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Creates a sale with its line items and decrements product stock,
    /// all in one transaction.
    ///
    /// Each line freezes the charged price and the product's current unit
    /// cost, so profit reporting survives later product edits.
    pub async fn create(&self, user_id: &str, new_sale: NewSale) -> DbResult<Sale> {
        if new_sale.items.is_empty() {
            return Err(DbError::conflict("A sale needs at least one item"));
        }

        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        let mut original_total = Money::zero();
        let mut lines: Vec<SaleItem> = Vec::with_capacity(new_sale.items.len());

        for item in &new_sale.items {
            let product = sqlx::query_as::<_, Product>(
                "SELECT * FROM products WHERE id = ? AND user_id = ?",
            )
            .bind(&item.product_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;

            if item.quantity <= 0 || item.quantity > product.quantity {
                return Err(DbError::conflict(format!(
                    "Insufficient stock for '{}': available {}, requested {}",
                    product.name, product.quantity, item.quantity
                )));
            }

            original_total += item.price * item.quantity;
            lines.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                sale_id: sale_id.clone(),
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                price: item.price,
                purchase_price: product.per_unit_purchase_price,
                price_type: item.price_type,
                created_at: now,
                updated_at: now,
            });
        }

        let sale = Sale {
            id: sale_id,
            user_id: user_id.to_string(),
            bill_number: new_sale.bill_number,
            total_amount: original_total - new_sale.discount,
            original_total_amount: original_total,
            discount: new_sale.discount,
            paid_amount: new_sale.paid_amount,
            sale_date: new_sale.sale_date,
            contact_id: new_sale.contact_id,
            employee_id: new_sale.employee_id,
            transport_name: new_sale.transport_name,
            transport_fare: new_sale.transport_fare,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, user_id, bill_number, total_amount, original_total_amount,
                discount, paid_amount, sale_date, contact_id, employee_id,
                transport_name, transport_fare, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.user_id)
        .bind(&sale.bill_number)
        .bind(sale.total_amount)
        .bind(sale.original_total_amount)
        .bind(sale.discount)
        .bind(sale.paid_amount)
        .bind(sale.sale_date)
        .bind(&sale.contact_id)
        .bind(&sale.employee_id)
        .bind(&sale.transport_name)
        .bind(sale.transport_fare)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, user_id, sale_id, product_id, quantity, price,
                    purchase_price, price_type, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&line.id)
            .bind(&line.user_id)
            .bind(&line.sale_id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.price)
            .bind(line.purchase_price)
            .bind(line.price_type)
            .bind(line.created_at)
            .bind(line.updated_at)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE products SET quantity = quantity - ?, updated_at = ? WHERE id = ? AND user_id = ?",
            )
            .bind(line.quantity)
            .bind(now)
            .bind(&line.product_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(id = %sale.id, bill = %sale.bill_number, "Sale created");
        Ok(sale)
    }

    /// Fetches a sale by ID, scoped to its owner.
    pub async fn get_by_id(&self, id: &str, user_id: &str) -> DbResult<Sale> {
        Sale::fetch(&self.pool, id, user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Lines of a sale, in creation order.
    pub async fn items(&self, sale_id: &str, user_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = ? AND user_id = ? ORDER BY created_at",
        )
        .bind(sale_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Changes the paid amount on a sale, appending an audit row when the
    /// numeric value actually changed.
    pub async fn update_paid_amount(
        &self,
        id: &str,
        user_id: &str,
        paid_amount: Money,
    ) -> DbResult<Sale> {
        let sale = self.get_by_id(id, user_id).await?;

        sqlx::query("UPDATE sales SET paid_amount = ?, updated_at = ? WHERE id = ? AND user_id = ?")
            .bind(paid_amount)
            .bind(Utc::now())
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        // Fire-and-forget: a failed audit write never fails the edit.
        AuditRepository::new(self.pool.clone())
            .log_change(
                user_id,
                "sales",
                id,
                "paidAmount",
                &sale.paid_amount.major().to_string(),
                &paid_amount.major().to_string(),
                Some("Paid amount updated"),
            )
            .await;

        self.get_by_id(id, user_id).await
    }

    /// Deletes a sale: restores each line's stock, removes the lines, then
    /// the parent row, all in one transaction.
    pub async fn delete(&self, id: &str, user_id: &str) -> DbResult<()> {
        let items = self.items(id, user_id).await?;
        self.get_by_id(id, user_id).await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for item in &items {
            sqlx::query(
                "UPDATE products SET quantity = quantity + ?, updated_at = ? WHERE id = ? AND user_id = ?",
            )
            .bind(item.quantity)
            .bind(now)
            .bind(&item.product_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM sales WHERE id = ? AND user_id = ?")
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

    async fn seed_product(db: &Database, quantity: i64) -> Product {
        db.products()
            .create(
                "u1",
                "Sugar 1kg",
                None,
                quantity,
                Money::from_minor(15000),
                Money::from_minor(14000),
            )
            .await
            .unwrap()
    }

    fn new_sale(product_id: &str, quantity: i64, paid: i64) -> NewSale {
        NewSale {
            bill_number: "B-1".into(),
            sale_date: Utc::now(),
            contact_id: None,
            employee_id: None,
            discount: Money::zero(),
            paid_amount: Money::from_minor(paid),
            transport_name: None,
            transport_fare: Money::zero(),
            items: vec![NewSaleItem {
                product_id: product_id.into(),
                quantity,
                price: Money::from_minor(15000),
                price_type: PriceType::Retail,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_decrements_stock_and_delete_restores_it() {
        let db = test_db().await;
        let product = seed_product(&db, 10).await;

        let sale = db
            .sales()
            .create("u1", new_sale(&product.id, 3, 45000))
            .await
            .unwrap();
        assert_eq!(sale.total_amount, Money::from_minor(45000));

        let after_sale = db.products().get_by_id(&product.id, "u1").await.unwrap();
        assert_eq!(after_sale.quantity, 7);

        db.sales().delete(&sale.id, "u1").await.unwrap();
        let after_delete = db.products().get_by_id(&product.id, "u1").await.unwrap();
        assert_eq!(after_delete.quantity, 10);
    }

    #[tokio::test]
    async fn test_oversell_rolls_back_everything() {
        let db = test_db().await;
        let product = seed_product(&db, 2).await;

        let result = db.sales().create("u1", new_sale(&product.id, 5, 0)).await;
        assert!(result.is_err());

        let untouched = db.products().get_by_id(&product.id, "u1").await.unwrap();
        assert_eq!(untouched.quantity, 2);
        let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(sales, 0);
    }

    #[tokio::test]
    async fn test_paid_amount_edit_appends_exactly_one_audit_row() {
        let db = test_db().await;
        let product = seed_product(&db, 10).await;
        let sale = db
            .sales()
            .create("u1", new_sale(&product.id, 1, 10000))
            .await
            .unwrap();

        // Numerically identical value: no audit row.
        db.sales()
            .update_paid_amount(&sale.id, "u1", Money::from_minor(10000))
            .await
            .unwrap();
        let rows = db.audit().trail_for_record(&sale.id, "u1").await.unwrap();
        assert!(rows.is_empty());

        // Real change: exactly one row with stringified old/new.
        db.sales()
            .update_paid_amount(&sale.id, "u1", Money::from_minor(15000))
            .await
            .unwrap();
        let rows = db.audit().trail_for_record(&sale.id, "u1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].old_value, "100");
        assert_eq!(rows[0].new_value, "150");
        assert_eq!(rows[0].sale_id.as_deref(), Some(sale.id.as_str()));
    }
}
