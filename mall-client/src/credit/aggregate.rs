//! Statement + unbilled transaction aggregation
//!
//! Pure function over already-fetched records. Flow quantities (purchases,
//! payments, refunds, due/paid/overdue) are summed; stock quantities
//! (balances) are picked from the first and last statement by period.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{AccountStatement, AccountTransaction, TransactionPaymentStatus, TransactionType};
use std::collections::HashSet;

/// Financial summary for a date range
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditSummary {
    pub statement_count: usize,
    pub due_within_term: Decimal,
    pub paid_within_term: Decimal,
    pub previous_balance: Decimal,
    pub period_end_balance: Decimal,
    pub overdue_amount: Decimal,
    pub total_purchases: Decimal,
    pub total_payments: Decimal,
    pub total_refunds: Decimal,
    /// Transactions counted outside any fetched statement
    pub unbilled_count: usize,
    pub has_data: bool,
}

/// Combine statements and transactions without counting any entry twice.
///
/// A transaction is skipped when its statement is among the fetched ones, or
/// when its id already appears inside a fetched statement. Everything else
/// is unbilled, including transactions pointing at statements we did not
/// fetch.
pub fn aggregate(statements: &[AccountStatement], transactions: &[AccountTransaction]) -> CreditSummary {
    let mut summary = CreditSummary {
        statement_count: statements.len(),
        has_data: !statements.is_empty() || !transactions.is_empty(),
        ..Default::default()
    };

    let mut statement_ids = HashSet::with_capacity(statements.len());
    let mut enumerated = HashSet::new();
    for s in statements {
        summary.due_within_term += s.due_within_term;
        summary.paid_within_term += s.paid_within_term;
        summary.overdue_amount += s.overdue_amount;
        summary.total_purchases += s.current_purchases;
        summary.total_payments += s.current_payments;
        summary.total_refunds += s.current_refunds;

        statement_ids.insert(s.id);
        enumerated.extend(s.transactions.iter().map(|t| t.id));
    }

    // balances are stocks: earliest opening, latest closing
    let mut ordered: Vec<&AccountStatement> = statements.iter().collect();
    ordered.sort_by_key(|s| (s.period_start, s.id));
    if let (Some(first), Some(last)) = (ordered.first(), ordered.last()) {
        summary.previous_balance = first.previous_balance;
        summary.period_end_balance = last.period_end_balance;
    }

    let mut unbilled_net = Decimal::ZERO;
    for t in transactions {
        let billed = t.statement.is_some_and(|id| statement_ids.contains(&id)) || enumerated.contains(&t.id);
        if billed {
            continue;
        }

        match t.transaction_type {
            TransactionType::Purchase => {
                summary.total_purchases += t.amount;
                if t.payment_status != TransactionPaymentStatus::Paid && t.due_date.is_some() {
                    summary.due_within_term += t.amount;
                }
                unbilled_net += t.amount;
            }
            TransactionType::Payment => {
                summary.total_payments += t.amount;
                summary.paid_within_term += t.amount;
                unbilled_net -= t.amount;
            }
            TransactionType::Refund => {
                summary.total_refunds += t.amount;
                unbilled_net -= t.amount;
            }
            TransactionType::Adjustment => {
                tracing::debug!(transaction_id = t.id, "Skipping unbilled adjustment");
                continue;
            }
        }
        summary.unbilled_count += 1;
    }

    summary.period_end_balance += unbilled_net;
    summary
}
