//! # Audit Trail Repository
//!
//! Append-only field-change log, consumed by the day-book and statement
//! views.
//!
//! ## Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  log_change(table, record, field, old, new)                             │
//! │       │                                                                 │
//! │       ├── amount field? coerce both sides to numbers first              │
//! │       │     "100.00" vs "100"  → equal  → NO row                        │
//! │       │                                                                 │
//! │       ├── values equal? → NO row (no-op edits never log)                │
//! │       │                                                                 │
//! │       └── INSERT row; on failure: warn-log and move on.                 │
//! │           Audit must never fail the business transaction.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are never updated or deleted. The oldest row for a record+field is
//! the first-ever recorded value; the day-book uses its `old_value` as the
//! "original paid amount before any edits".

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::error::DbResult;
use stockbook_core::AuditTrail;

/// Fields whose old/new values are compared numerically.
const AMOUNT_FIELDS: &[&str] = &["paidAmount", "refundAmount", "totalAmount", "discount"];

/// Repository for the append-only audit trail.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    /// Creates a new AuditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Appends a field-change row, unless the value did not actually
    /// change. Fire-and-forget: any failure is warn-logged and swallowed.
    pub async fn log_change(
        &self,
        user_id: &str,
        table: &str,
        record_id: &str,
        field: &str,
        old_value: &str,
        new_value: &str,
        description: Option<&str>,
    ) {
        if values_equal(field, old_value, new_value) {
            return;
        }

        // Denormalized parent key lets per-sale/per-purchase trail queries
        // skip a polymorphic join.
        let (sale_id, purchase_id) = match table {
            "sales" => (Some(record_id), None),
            "bulk_purchases" => (None, Some(record_id)),
            _ => (None, None),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO audit_trail (
                id, user_id, table_name, record_id, field_name,
                old_value, new_value, description, sale_id, purchase_id,
                changed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(table)
        .bind(record_id)
        .bind(field)
        .bind(old_value)
        .bind(new_value)
        .bind(description)
        .bind(sale_id)
        .bind(purchase_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            warn!(
                table = table,
                record_id = record_id,
                field = field,
                error = %err,
                "Audit trail write failed; continuing"
            );
        }
    }

    /// All audit rows for a record, oldest first.
    pub async fn trail_for_record(&self, record_id: &str, user_id: &str) -> DbResult<Vec<AuditTrail>> {
        let rows = sqlx::query_as::<_, AuditTrail>(
            "SELECT * FROM audit_trail WHERE record_id = ? AND user_id = ? ORDER BY changed_at",
        )
        .bind(record_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// The first-ever recorded value of a field on a record: the oldest
    /// audit row's `old_value`. `None` when the field was never edited.
    pub async fn original_value(
        &self,
        record_id: &str,
        field: &str,
        user_id: &str,
    ) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(
            r#"
            SELECT old_value FROM audit_trail
            WHERE record_id = ? AND field_name = ? AND user_id = ?
            ORDER BY changed_at ASC
            LIMIT 1
            "#,
        )
        .bind(record_id)
        .bind(field)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }
}

/// Equality check used to suppress no-op log entries.
///
/// Amount fields are compared numerically so representation differences
/// ("100.00" vs "100") are not mistaken for changes. Other fields compare
/// raw strings.
fn values_equal(field: &str, old_value: &str, new_value: &str) -> bool {
    if AMOUNT_FIELDS.contains(&field) {
        if let (Ok(old_num), Ok(new_num)) = (old_value.parse::<f64>(), new_value.parse::<f64>()) {
            return old_num == new_num;
        }
    }
    old_value == new_value
}

// =============================================================================
// Unit Tests
// =============================================================================
