//! # Sale Return Repository
//!
//! Database operations for returns against sales.
//!
//! Each returned line carries a `remove_from_stock` flag captured at
//! creation time: resellable units go back into stock, units flagged for
//! removal are deducted instead (damaged goods leaving circulation).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::store::SyncStore;
use stockbook_core::{Money, Product, SaleReturn, SaleReturnItem};

/// Input for one returned line.
#[derive(Debug, Clone)]
pub struct NewReturnItem {
    pub product_id: String,
    pub quantity: i64,
    pub price: Money,
    pub remove_from_stock: bool,
}

/// Input for a new sale return.
#[derive(Debug, Clone)]
pub struct NewReturn {
    pub return_number: String,
    pub sale_id: String,
    pub refund_amount: Money,
    pub refund_paid: bool,
    pub refund_date: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub items: Vec<NewReturnItem>,
}

/// Repository for sale return database operations.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Creates a return with its lines and applies each line's stock
    /// effect, in one transaction.
    pub async fn create(&self, user_id: &str, new_return: NewReturn) -> DbResult<SaleReturn> {
        if new_return.items.is_empty() {
            return Err(DbError::conflict("A return needs at least one item"));
        }

        let sale_exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sales WHERE id = ? AND user_id = ?",
        )
        .bind(&new_return.sale_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        if sale_exists == 0 {
            return Err(DbError::not_found("Sale", &new_return.sale_id));
        }

        let now = Utc::now();
        let return_id = Uuid::new_v4().to_string();

        let mut total = Money::zero();
        for item in &new_return.items {
            if item.quantity <= 0 {
                return Err(DbError::conflict("Return line quantity must be positive"));
            }
            total += item.price * item.quantity;
        }

        let sale_return = SaleReturn {
            id: return_id.clone(),
            user_id: user_id.to_string(),
            return_number: new_return.return_number,
            sale_id: new_return.sale_id,
            total_amount: total,
            refund_amount: new_return.refund_amount,
            refund_paid: new_return.refund_paid,
            refund_date: new_return.refund_date,
            reason: new_return.reason,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sale_returns (
                id, user_id, return_number, sale_id, total_amount,
                refund_amount, refund_paid, refund_date, reason,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale_return.id)
        .bind(&sale_return.user_id)
        .bind(&sale_return.return_number)
        .bind(&sale_return.sale_id)
        .bind(sale_return.total_amount)
        .bind(sale_return.refund_amount)
        .bind(sale_return.refund_paid)
        .bind(sale_return.refund_date)
        .bind(&sale_return.reason)
        .bind(sale_return.created_at)
        .bind(sale_return.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &new_return.items {
            sqlx::query(
                r#"
                INSERT INTO sale_return_items (
                    id, user_id, return_id, product_id, quantity, price,
                    remove_from_stock, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(&return_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.remove_from_stock)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if item.remove_from_stock {
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
                        "Cannot remove {} unit(s) of '{}' from stock: {} available",
                        item.quantity, product.name, product.quantity
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
            } else {
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
        }

        tx.commit().await?;

        debug!(id = %sale_return.id, number = %sale_return.return_number, "Sale return created");
        Ok(sale_return)
    }

    /// Fetches a return by ID, scoped to its owner.
    pub async fn get_by_id(&self, id: &str, user_id: &str) -> DbResult<SaleReturn> {
        SaleReturn::fetch(&self.pool, id, user_id)
            .await?
            .ok_or_else(|| DbError::not_found("SaleReturn", id))
    }

    /// Lines of a return, in creation order.
    pub async fn items(&self, return_id: &str, user_id: &str) -> DbResult<Vec<SaleReturnItem>> {
        let items = sqlx::query_as::<_, SaleReturnItem>(
            "SELECT * FROM sale_return_items WHERE return_id = ? AND user_id = ? ORDER BY created_at",
        )
        .bind(return_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Returns attached to a sale.
    pub async fn for_sale(&self, sale_id: &str, user_id: &str) -> DbResult<Vec<SaleReturn>> {
        let returns = sqlx::query_as::<_, SaleReturn>(
            "SELECT * FROM sale_returns WHERE sale_id = ? AND user_id = ? ORDER BY created_at",
        )
        .bind(sale_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(returns)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::sale::{NewSale, NewSaleItem};

    #[tokio::test]
    async fn test_return_restocks_or_deducts_per_line_flag() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .create("u1", "Sugar 1kg", None, 10, Money::from_minor(15000), Money::zero())
            .await
            .unwrap();

        let sale = db
            .sales()
            .create(
                "u1",
                NewSale {
                    bill_number: "B-1".into(),
                    sale_date: Utc::now(),
                    contact_id: None,
                    employee_id: None,
                    discount: Money::zero(),
                    paid_amount: Money::zero(),
                    transport_name: None,
                    transport_fare: Money::zero(),
                    items: vec![NewSaleItem {
                        product_id: product.id.clone(),
                        quantity: 4,
                        price: Money::from_minor(15000),
                        price_type: Default::default(),
                    }],
                },
            )
            .await
            .unwrap();
        // 10 - 4 sold = 6 in stock.

        db.returns()
            .create(
                "u1",
                NewReturn {
                    return_number: "R-1".into(),
                    sale_id: sale.id.clone(),
                    refund_amount: Money::from_minor(30000),
                    refund_paid: false,
                    refund_date: None,
                    reason: None,
                    items: vec![
                        // Resellable: back into stock.
                        NewReturnItem {
                            product_id: product.id.clone(),
                            quantity: 2,
                            price: Money::from_minor(15000),
                            remove_from_stock: false,
                        },
                        // Damaged: leaves circulation.
                        NewReturnItem {
                            product_id: product.id.clone(),
                            quantity: 1,
                            price: Money::from_minor(15000),
                            remove_from_stock: true,
                        },
                    ],
                },
            )
            .await
            .unwrap();

        let after = db.products().get_by_id(&product.id, "u1").await.unwrap();
        assert_eq!(after.quantity, 7); // 6 + 2 - 1
    }
}
