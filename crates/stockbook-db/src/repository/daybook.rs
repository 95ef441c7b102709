//! # Day-Book Repository
//!
//! Per-day transaction listing. What a day's totals looked like must not
//! be rewritten by a later payment correction, so each sale row carries
//! `original_paid_amount`: the first-ever recorded paid amount, recovered
//! from the oldest audit trail row when one exists.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use ts_rs::TS;

use crate::error::DbResult;
use crate::repository::audit::AuditRepository;
use stockbook_core::{Money, Sale};

/// One day-book row.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DaybookEntry {
    #[serde(flatten)]
    pub sale: Sale,
    /// Paid amount as it was first recorded, before any edits.
    #[ts(as = "f64")]
    pub original_paid_amount: Money,
}

/// Repository for day-book reporting.
#[derive(Debug, Clone)]
pub struct DaybookRepository {
    pool: SqlitePool,
}

impl DaybookRepository {
    /// Creates a new DaybookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DaybookRepository { pool }
    }

    /// Sales whose business date falls on `date`, with their original
    /// paid amounts.
    pub async fn entries_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> DbResult<Vec<DaybookEntry>> {
        let day_start: DateTime<Utc> = date
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc();
        let day_end = day_start + Duration::days(1);

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT * FROM sales
            WHERE user_id = ? AND sale_date >= ? AND sale_date < ?
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_all(&self.pool)
        .await?;

        let audit = AuditRepository::new(self.pool.clone());
        let mut entries = Vec::with_capacity(sales.len());

        for sale in sales {
            let original_paid_amount = match audit
                .original_value(&sale.id, "paidAmount", user_id)
                .await?
            {
                Some(value) => value
                    .parse::<f64>()
                    .map(Money::from_major)
                    .unwrap_or(sale.paid_amount),
                None => sale.paid_amount,
            };

            entries.push(DaybookEntry {
                sale,
                original_paid_amount,
            });
        }

        Ok(entries)
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
    async fn test_daybook_shows_original_paid_amount_after_edit() {
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
                    paid_amount: Money::from_minor(5000),
                    transport_name: None,
                    transport_fare: Money::zero(),
                    items: vec![NewSaleItem {
                        product_id: product.id,
                        quantity: 1,
                        price: Money::from_minor(15000),
                        price_type: Default::default(),
                    }],
                },
            )
            .await
            .unwrap();

        // A later correction must not rewrite how the day looked.
        db.sales()
            .update_paid_amount(&sale.id, "u1", Money::from_minor(15000))
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let entries = db.daybook().entries_for_date("u1", today).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sale.paid_amount, Money::from_minor(15000));
        assert_eq!(entries[0].original_paid_amount, Money::from_minor(5000));
    }
}
