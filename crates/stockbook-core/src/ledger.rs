//! # Contact Ledger
//!
//! Builds a contact statement (running balance) from heterogeneous
//! transaction rows. Pure logic: callers fetch the rows, this module
//! signs, sorts and accumulates.
//!
//! ## Sign Convention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Balance = what the contact owes us (debit − credit, cumulative)        │
//! │                                                                         │
//! │  Sale              debit += totalAmount    credit += paidAmount         │
//! │  BulkPurchase      credit += total − paid  (unpaid part is our debt)    │
//! │    payment line    debit += paidAmount     (only when nonzero)          │
//! │  Loan GIVEN /                                                           │
//! │    RETURNED_TO     debit += amount                                      │
//! │  Loan TAKEN /                                                           │
//! │    RETURNED_BY     credit += amount                                     │
//! │  SaleReturn        credit += refundAmount  (only when refund was paid)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering Rule
//! Lines are sorted by `sort_date` — the row's immutable `created_at` —
//! never by the user-editable business date. Backdating a sale must not
//! reshuffle the running balance: the balance replays in the order money
//! actually moved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{BulkPurchase, LoanTransaction, Sale, SaleReturn};

// =============================================================================
// Statement Types
// =============================================================================

/// What kind of transaction produced a ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum LedgerEntryType {
    Sale,
    Purchase,
    PurchasePayment,
    Loan,
    SaleReturn,
}

/// One row of a contact statement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LedgerLine {
    /// Source row ID.
    pub id: String,
    pub entry_type: LedgerEntryType,
    /// Human reference: bill number, invoice number, loan note.
    pub reference: String,
    /// User-facing business date.
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    /// Immutable creation timestamp; the sort key.
    #[ts(as = "String")]
    pub sort_date: DateTime<Utc>,
    #[ts(as = "f64")]
    pub debit: Money,
    #[ts(as = "f64")]
    pub credit: Money,
    /// Balance after this line was applied.
    #[ts(as = "f64")]
    pub running_balance: Money,
}

/// A complete contact statement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ContactStatement {
    pub contact_id: String,
    #[ts(as = "f64")]
    pub opening_balance: Money,
    #[ts(as = "f64")]
    pub closing_balance: Money,
    pub transactions: Vec<LedgerLine>,
}

/// The raw rows a statement is built from. Fetched per contact, already
/// filtered to the requested date window by their business-date fields.
#[derive(Debug, Clone, Default)]
pub struct LedgerSource {
    pub sales: Vec<Sale>,
    pub purchases: Vec<BulkPurchase>,
    pub loans: Vec<LoanTransaction>,
    pub returns: Vec<SaleReturn>,
}

// =============================================================================
// Statement Builder
// =============================================================================

/// Turns raw rows into unsorted ledger lines with zeroed running balances.
fn collect_lines(source: &LedgerSource) -> Vec<LedgerLine> {
    let mut lines = Vec::new();

    for sale in &source.sales {
        lines.push(LedgerLine {
            id: sale.id.clone(),
            entry_type: LedgerEntryType::Sale,
            reference: sale.bill_number.clone(),
            date: sale.sale_date,
            sort_date: sale.created_at,
            debit: sale.total_amount,
            credit: sale.paid_amount,
            running_balance: Money::zero(),
        });
    }

    for purchase in &source.purchases {
        let owed = purchase.total_amount - purchase.paid_amount;
        lines.push(LedgerLine {
            id: purchase.id.clone(),
            entry_type: LedgerEntryType::Purchase,
            reference: purchase.invoice_number.clone(),
            date: purchase.purchase_date,
            sort_date: purchase.created_at,
            debit: Money::zero(),
            credit: owed,
            running_balance: Money::zero(),
        });
        // Payments against a purchase reduce what we owe the supplier.
        if purchase.paid_amount.is_positive() {
            lines.push(LedgerLine {
                id: purchase.id.clone(),
                entry_type: LedgerEntryType::PurchasePayment,
                reference: purchase.invoice_number.clone(),
                date: purchase.purchase_date,
                sort_date: purchase.created_at,
                debit: purchase.paid_amount,
                credit: Money::zero(),
                running_balance: Money::zero(),
            });
        }
    }

    for loan in &source.loans {
        let (debit, credit) = if loan.kind.is_debit() {
            (loan.amount, Money::zero())
        } else {
            (Money::zero(), loan.amount)
        };
        lines.push(LedgerLine {
            id: loan.id.clone(),
            entry_type: LedgerEntryType::Loan,
            reference: loan.note.clone().unwrap_or_default(),
            date: loan.date,
            sort_date: loan.created_at,
            debit,
            credit,
            running_balance: Money::zero(),
        });
    }

    for sale_return in &source.returns {
        // Unpaid refunds have not moved money yet and stay off the ledger.
        if !sale_return.refund_paid || !sale_return.refund_amount.is_positive() {
            continue;
        }
        lines.push(LedgerLine {
            id: sale_return.id.clone(),
            entry_type: LedgerEntryType::SaleReturn,
            reference: sale_return.return_number.clone(),
            date: sale_return.refund_date.unwrap_or(sale_return.created_at),
            sort_date: sale_return.created_at,
            debit: Money::zero(),
            credit: sale_return.refund_amount,
            running_balance: Money::zero(),
        });
    }

    lines
}

/// Signed total (debit − credit) of a row set, without building a
/// statement. Used for the opening-balance pass over pre-window rows.
pub fn signed_total(source: &LedgerSource) -> Money {
    collect_lines(source)
        .iter()
        .fold(Money::zero(), |acc, line| acc + line.debit - line.credit)
}

/// Builds a statement from in-window rows and a precomputed opening
/// balance. Lines are sorted by `sort_date` (creation order) and each
/// carries its post-line running balance.
pub fn build_statement(
    contact_id: &str,
    opening_balance: Money,
    source: &LedgerSource,
) -> ContactStatement {
    let mut lines = collect_lines(source);
    lines.sort_by_key(|line| line.sort_date);

    let mut balance = opening_balance;
    for line in &mut lines {
        balance = balance + line.debit - line.credit;
        line.running_balance = balance;
    }

    ContactStatement {
        contact_id: contact_id.to_string(),
        opening_balance,
        closing_balance: balance,
        transactions: lines,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LoanKind;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn sale(id: &str, total: i64, paid: i64, sale_date: DateTime<Utc>, created: DateTime<Utc>) -> Sale {
        Sale {
            id: id.into(),
            user_id: "u1".into(),
            bill_number: format!("B-{id}"),
            total_amount: Money::from_minor(total),
            original_total_amount: Money::from_minor(total),
            discount: Money::zero(),
            paid_amount: Money::from_minor(paid),
            sale_date,
            contact_id: Some("c1".into()),
            employee_id: None,
            transport_name: None,
            transport_fare: Money::zero(),
            created_at: created,
            updated_at: created,
        }
    }

    fn loan(id: &str, amount: i64, kind: LoanKind, when: DateTime<Utc>) -> LoanTransaction {
        LoanTransaction {
            id: id.into(),
            user_id: "u1".into(),
            contact_id: "c1".into(),
            amount: Money::from_minor(amount),
            kind,
            date: when,
            note: None,
            created_at: when,
            updated_at: when,
        }
    }

    #[test]
    fn test_sale_signs() {
        let source = LedgerSource {
            sales: vec![sale("s1", 10000, 4000, ts(0), ts(0))],
            ..Default::default()
        };
        let statement = build_statement("c1", Money::zero(), &source);
        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.transactions[0].debit, Money::from_minor(10000));
        assert_eq!(statement.transactions[0].credit, Money::from_minor(4000));
        assert_eq!(statement.closing_balance, Money::from_minor(6000));
    }

    #[test]
    fn test_purchase_emits_payment_line_only_when_paid() {
        let mut purchase = BulkPurchase {
            id: "p1".into(),
            user_id: "u1".into(),
            invoice_number: "INV-1".into(),
            total_amount: Money::from_minor(50000),
            paid_amount: Money::zero(),
            discount: Money::zero(),
            purchase_date: ts(0),
            contact_id: Some("c1".into()),
            transport_name: None,
            transport_fare: Money::zero(),
            created_at: ts(0),
            updated_at: ts(0),
        };

        let source = LedgerSource {
            purchases: vec![purchase.clone()],
            ..Default::default()
        };
        let statement = build_statement("c1", Money::zero(), &source);
        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.closing_balance, Money::from_minor(-50000));

        purchase.paid_amount = Money::from_minor(20000);
        let source = LedgerSource {
            purchases: vec![purchase],
            ..Default::default()
        };
        let statement = build_statement("c1", Money::zero(), &source);
        assert_eq!(statement.transactions.len(), 2);
        // credit 30000 outstanding, debit 20000 paid back
        assert_eq!(statement.closing_balance, Money::from_minor(-10000));
    }

    #[test]
    fn test_loan_signs() {
        let source = LedgerSource {
            loans: vec![
                loan("l1", 5000, LoanKind::Given, ts(0)),
                loan("l2", 2000, LoanKind::ReturnedByContact, ts(10)),
            ],
            ..Default::default()
        };
        let statement = build_statement("c1", Money::zero(), &source);
        assert_eq!(statement.closing_balance, Money::from_minor(3000));
    }

    #[test]
    fn test_unpaid_refund_stays_off_ledger() {
        let mut sale_return = SaleReturn {
            id: "r1".into(),
            user_id: "u1".into(),
            return_number: "R-1".into(),
            sale_id: "s1".into(),
            total_amount: Money::from_minor(3000),
            refund_amount: Money::from_minor(3000),
            refund_paid: false,
            refund_date: None,
            reason: None,
            created_at: ts(0),
            updated_at: ts(0),
        };

        let source = LedgerSource {
            returns: vec![sale_return.clone()],
            ..Default::default()
        };
        assert!(build_statement("c1", Money::zero(), &source)
            .transactions
            .is_empty());

        sale_return.refund_paid = true;
        let source = LedgerSource {
            returns: vec![sale_return],
            ..Default::default()
        };
        let statement = build_statement("c1", Money::zero(), &source);
        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.closing_balance, Money::from_minor(-3000));
    }

    #[test]
    fn test_sorted_by_creation_not_business_date() {
        // s_backdated was entered SECOND (created later) but its business
        // date is earlier. The running balance must replay in entry order.
        let s_first = sale("s1", 10000, 10000, ts(100), ts(100));
        let s_backdated = sale("s2", 5000, 0, ts(0), ts(200));

        let source = LedgerSource {
            sales: vec![s_backdated, s_first],
            ..Default::default()
        };
        let statement = build_statement("c1", Money::zero(), &source);

        assert_eq!(statement.transactions[0].id, "s1");
        assert_eq!(statement.transactions[1].id, "s2");
        assert_eq!(
            statement.transactions[0].running_balance,
            Money::zero()
        );
        assert_eq!(
            statement.transactions[1].running_balance,
            Money::from_minor(5000)
        );
    }

    #[test]
    fn test_opening_balance_feeds_running_balance() {
        let pre_window = LedgerSource {
            sales: vec![sale("s0", 8000, 0, ts(-500), ts(-500))],
            ..Default::default()
        };
        let opening = signed_total(&pre_window);
        assert_eq!(opening, Money::from_minor(8000));

        let window = LedgerSource {
            sales: vec![sale("s1", 2000, 2000, ts(0), ts(0))],
            ..Default::default()
        };
        let statement = build_statement("c1", opening, &window);
        assert_eq!(statement.opening_balance, Money::from_minor(8000));
        assert_eq!(statement.closing_balance, Money::from_minor(8000));
        assert_eq!(
            statement.transactions[0].running_balance,
            Money::from_minor(8000)
        );
    }
}
