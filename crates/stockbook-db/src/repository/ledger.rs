//! # Ledger Repository
//!
//! Row fetching for the contact statement builder. The signing, sorting
//! and balance arithmetic live in `stockbook_core::ledger`; this module
//! only assembles the inputs.
//!
//! ## Two-Pass Window
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │         ... history ...   │  start          end  │                      │
//! │  ─────────────────────────┼──────────────────────┼───────────────►      │
//! │                                                                         │
//! │  Pass 1 (opening): every row strictly BEFORE start, no end bound —      │
//! │    a transaction from two years ago still affects today's balance.      │
//! │  Pass 2 (window):  rows in [start, end], become the statement lines.    │
//! │                                                                         │
//! │  Both passes filter on the BUSINESS date; the lines themselves are      │
//! │  then sorted by created_at inside the builder.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};
use stockbook_core::ledger::{build_statement, signed_total, ContactStatement, LedgerSource};
use stockbook_core::{BulkPurchase, LoanTransaction, Sale, SaleReturn};

/// Repository assembling contact statements.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Builds the statement for one contact over an optional window.
    pub async fn statement(
        &self,
        user_id: &str,
        contact_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DbResult<ContactStatement> {
        let exists: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM contacts WHERE id = ? AND user_id = ?")
                .bind(contact_id)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        if exists == 0 {
            return Err(DbError::not_found("Contact", contact_id));
        }

        let opening = match start {
            // Second unbounded-end pass over everything before the window.
            Some(start) => {
                let history = self.fetch_source(user_id, contact_id, None, Some(start), true).await?;
                signed_total(&history)
            }
            None => stockbook_core::Money::zero(),
        };

        let window = self.fetch_source(user_id, contact_id, start, end, false).await?;
        Ok(build_statement(contact_id, opening, &window))
    }

    /// Fetches a contact's rows filtered by their business-date fields.
    /// When `exclusive_end` is set the end bound is strict (used for the
    /// opening-balance pass, which covers everything before `start`).
    async fn fetch_source(
        &self,
        user_id: &str,
        contact_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        exclusive_end: bool,
    ) -> DbResult<LedgerSource> {
        let end_op = if exclusive_end { "<" } else { "<=" };

        let sales = self
            .fetch_rows::<Sale>("sales", "sale_date", user_id, contact_id, start, end, end_op)
            .await?;
        let purchases = self
            .fetch_rows::<BulkPurchase>(
                "bulk_purchases",
                "purchase_date",
                user_id,
                contact_id,
                start,
                end,
                end_op,
            )
            .await?;
        let loans = self
            .fetch_rows::<LoanTransaction>(
                "loan_transactions",
                "date",
                user_id,
                contact_id,
                start,
                end,
                end_op,
            )
            .await?;

        // Returns reach their contact through the parent sale.
        let mut returns_sql = String::from(
            r#"
            SELECT r.* FROM sale_returns r
            JOIN sales s ON s.id = r.sale_id AND s.user_id = r.user_id
            WHERE r.user_id = ? AND s.contact_id = ?
            "#,
        );
        // refund_date is nullable; undated refunds fall back to created_at,
        // matching the business date the statement builder assigns them.
        if start.is_some() {
            returns_sql.push_str(" AND COALESCE(r.refund_date, r.created_at) >= ?");
        }
        if end.is_some() {
            returns_sql.push_str(&format!(
                " AND COALESCE(r.refund_date, r.created_at) {} ?",
                end_op
            ));
        }
        let mut returns_query = sqlx::query_as::<_, SaleReturn>(&returns_sql)
            .bind(user_id)
            .bind(contact_id);
        if let Some(start) = start {
            returns_query = returns_query.bind(start);
        }
        if let Some(end) = end {
            returns_query = returns_query.bind(end);
        }
        let returns = returns_query.fetch_all(&self.pool).await?;

        Ok(LedgerSource {
            sales,
            purchases,
            loans,
            returns,
        })
    }

    async fn fetch_rows<T>(
        &self,
        table: &str,
        date_column: &str,
        user_id: &str,
        contact_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        end_op: &str,
    ) -> DbResult<Vec<T>>
    where
        T: Send + Unpin + for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow>,
    {
        let mut sql = format!(
            "SELECT * FROM {table} WHERE user_id = ? AND contact_id = ?"
        );
        if start.is_some() {
            sql.push_str(&format!(" AND {date_column} >= ?"));
        }
        if end.is_some() {
            sql.push_str(&format!(" AND {date_column} {end_op} ?"));
        }

        let mut query = sqlx::query_as::<_, T>(&sql).bind(user_id).bind(contact_id);
        if let Some(start) = start {
            query = query.bind(start);
        }
        if let Some(end) = end {
            query = query.bind(end);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::store::SyncStore;
    use chrono::Duration;
    use stockbook_core::{ContactType, LoanKind, Money};

    async fn seed(db: &Database) -> String {
        let contact = db
            .contacts()
            .create("u1", "Ali Traders", ContactType::Customer, None, None)
            .await
            .unwrap();
        contact.id
    }

    fn loan(contact_id: &str, amount: i64, kind: LoanKind, when: DateTime<Utc>) -> LoanTransaction {
        LoanTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "u1".into(),
            contact_id: contact_id.into(),
            amount: Money::from_minor(amount),
            kind,
            date: when,
            note: None,
            created_at: when,
            updated_at: when,
        }
    }

    #[tokio::test]
    async fn test_opening_balance_covers_all_history_before_start() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let contact_id = seed(&db).await;
        let now = Utc::now();

        // Two years old, still counts toward the opening balance.
        loan(&contact_id, 80000, LoanKind::Given, now - Duration::days(730))
            .insert(db.pool())
            .await
            .unwrap();
        // Inside the window.
        loan(&contact_id, 20000, LoanKind::ReturnedByContact, now)
            .insert(db.pool())
            .await
            .unwrap();

        let statement = db
            .ledger()
            .statement("u1", &contact_id, Some(now - Duration::days(7)), None)
            .await
            .unwrap();

        assert_eq!(statement.opening_balance, Money::from_minor(80000));
        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.closing_balance, Money::from_minor(60000));
    }

    #[tokio::test]
    async fn test_windowed_statement_keeps_undated_paid_refund() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let contact_id = seed(&db).await;
        let now = Utc::now();

        Sale {
            id: "s1".into(),
            user_id: "u1".into(),
            bill_number: "B-1".into(),
            total_amount: Money::from_minor(10000),
            original_total_amount: Money::from_minor(10000),
            discount: Money::zero(),
            paid_amount: Money::from_minor(10000),
            sale_date: now,
            contact_id: Some(contact_id.clone()),
            employee_id: None,
            transport_name: None,
            transport_fare: Money::zero(),
            created_at: now,
            updated_at: now,
        }
        .insert(db.pool())
        .await
        .unwrap();

        // Refund was paid out but never dated; it must still appear in a
        // windowed statement, dated by its creation time.
        SaleReturn {
            id: "r1".into(),
            user_id: "u1".into(),
            return_number: "R-1".into(),
            sale_id: "s1".into(),
            total_amount: Money::from_minor(4000),
            refund_amount: Money::from_minor(4000),
            refund_paid: true,
            refund_date: None,
            reason: None,
            created_at: now,
            updated_at: now,
        }
        .insert(db.pool())
        .await
        .unwrap();

        let full = db
            .ledger()
            .statement("u1", &contact_id, None, None)
            .await
            .unwrap();
        let windowed = db
            .ledger()
            .statement(
                "u1",
                &contact_id,
                Some(now - Duration::days(7)),
                Some(now + Duration::days(1)),
            )
            .await
            .unwrap();

        assert_eq!(full.closing_balance, Money::from_minor(-4000));
        assert_eq!(windowed.transactions.len(), full.transactions.len());
        assert_eq!(windowed.closing_balance, full.closing_balance);
    }

    #[tokio::test]
    async fn test_unknown_contact_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let result = db.ledger().statement("u1", "missing", None, None).await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));
    }
}
