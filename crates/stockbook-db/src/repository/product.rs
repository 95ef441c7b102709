//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD with tenant scoping
//! - Stock adjustment (always inside the caller's business transaction)
//! - Damage / restore pairs that conserve total units
//!
//! ## Damage / Restore
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quantity: 40      damaged_quantity: 2      total: 42                   │
//! │       │                                                                 │
//! │       ▼  mark_damaged(3)                                                │
//! │  quantity: 37      damaged_quantity: 5      total: 42  ← conserved      │
//! │       │                                                                 │
//! │       ▼  restore_damaged(5)                                             │
//! │  quantity: 42      damaged_quantity: 0      total: 42  ← conserved      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::store::SyncStore;
use stockbook_core::{Money, Product};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product with a fresh UUID and server timestamps.
    pub async fn create(
        &self,
        user_id: &str,
        name: &str,
        sku: Option<String>,
        quantity: i64,
        retail_price: Money,
        wholesale_price: Money,
    ) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            sku,
            quantity,
            low_stock_threshold: 0,
            retail_price,
            wholesale_price,
            purchase_price: Money::zero(),
            per_unit_purchase_price: Money::zero(),
            is_raw_material: false,
            damaged_quantity: 0,
            created_at: now,
            updated_at: now,
        };
        product.insert(&self.pool).await?;

        debug!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Fetches a product by ID, scoped to its owner.
    pub async fn get_by_id(&self, id: &str, user_id: &str) -> DbResult<Product> {
        Product::fetch(&self.pool, id, user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Lists every product for an account.
    pub async fn list(&self, user_id: &str) -> DbResult<Vec<Product>> {
        Product::list_for_user(&self.pool, user_id).await
    }

    /// Deletes a product.
    ///
    /// Refused while any sale line references it: deleting would orphan
    /// sale history. Surfaced as a descriptive error, never a cascade.
    pub async fn delete(&self, id: &str, user_id: &str) -> DbResult<()> {
        let product = self.get_by_id(id, user_id).await?;

        let references: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sale_items WHERE product_id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if references > 0 {
            return Err(DbError::conflict(format!(
                "Product '{}' is used in {} sale item(s) and cannot be deleted",
                product.name, references
            )));
        }

        sqlx::query("DELETE FROM products WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Moves units from sellable stock into the damaged bucket.
    /// `quantity + damaged_quantity` is unchanged.
    pub async fn mark_damaged(&self, id: &str, user_id: &str, units: i64) -> DbResult<Product> {
        let product = self.get_by_id(id, user_id).await?;

        if units <= 0 || units > product.quantity {
            return Err(DbError::conflict(format!(
                "Cannot mark {} unit(s) of '{}' damaged: {} in stock",
                units, product.name, product.quantity
            )));
        }

        sqlx::query(
            r#"
            UPDATE products SET
                quantity = quantity - ?,
                damaged_quantity = damaged_quantity + ?,
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(units)
        .bind(units)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id, user_id).await
    }

    /// Moves units from the damaged bucket back into sellable stock.
    pub async fn restore_damaged(&self, id: &str, user_id: &str, units: i64) -> DbResult<Product> {
        let product = self.get_by_id(id, user_id).await?;

        if units <= 0 || units > product.damaged_quantity {
            return Err(DbError::conflict(format!(
                "Cannot restore {} unit(s) of '{}': {} marked damaged",
                units, product.name, product.damaged_quantity
            )));
        }

        sqlx::query(
            r#"
            UPDATE products SET
                quantity = quantity + ?,
                damaged_quantity = damaged_quantity - ?,
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(units)
        .bind(units)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id, user_id).await
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
    async fn test_damage_restore_conserves_total_units() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo
            .create(
                "u1",
                "Sugar 1kg",
                None,
                40,
                Money::from_minor(15000),
                Money::from_minor(14000),
            )
            .await
            .unwrap();

        let total_before = product.total_units();

        let damaged = repo.mark_damaged(&product.id, "u1", 3).await.unwrap();
        assert_eq!(damaged.quantity, 37);
        assert_eq!(damaged.damaged_quantity, 3);
        assert_eq!(damaged.total_units(), total_before);

        let restored = repo.restore_damaged(&product.id, "u1", 3).await.unwrap();
        assert_eq!(restored.quantity, 40);
        assert_eq!(restored.damaged_quantity, 0);
        assert_eq!(restored.total_units(), total_before);
    }

    #[tokio::test]
    async fn test_mark_damaged_rejects_overdraw() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo
            .create("u1", "Salt 1kg", None, 2, Money::zero(), Money::zero())
            .await
            .unwrap();

        assert!(repo.mark_damaged(&product.id, "u1", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_per_account() {
        let db = test_db().await;
        let repo = db.products();

        repo.create("u1", "Sugar 1kg", None, 1, Money::zero(), Money::zero())
            .await
            .unwrap();
        let dup = repo
            .create("u1", "Sugar 1kg", None, 1, Money::zero(), Money::zero())
            .await;
        assert!(matches!(dup, Err(DbError::UniqueViolation { .. })));

        // Same name under another account is fine.
        repo.create("u2", "Sugar 1kg", None, 1, Money::zero(), Money::zero())
            .await
            .unwrap();
    }
}
