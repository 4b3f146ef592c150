//! Dealer credit account, statements and ledger transactions
//!
//! All amounts are computed server-side; the client only summarizes them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Credit account (one per dealer user)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditAccount {
    pub id: u64,
    pub credit_limit: Decimal,
    pub outstanding_debt: Decimal,
    /// limit - debt, authoritative from server
    pub available_credit: Decimal,
    pub payment_term_days: u32,
    pub is_active: bool,
}

/// Statement status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    #[default]
    Draft,
    Confirmed,
    Settled,
}

/// Ledger entry type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Payment,
    Refund,
    Adjustment,
}

/// Settlement status of a ledger entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionPaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Overdue,
}

/// Atomic ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountTransaction {
    pub id: u64,
    #[serde(alias = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    /// Owning statement; `None` means unbilled
    #[serde(default, alias = "statement_id")]
    pub statement: Option<u64>,
    #[serde(default, alias = "order_id")]
    pub order: Option<u64>,
    #[serde(default)]
    pub payment_status: TransactionPaymentStatus,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
}

impl AccountTransaction {
    pub fn is_unbilled(&self) -> bool {
        self.statement.is_none()
    }
}

/// Period statement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountStatement {
    pub id: u64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(default)]
    pub previous_balance: Decimal,
    #[serde(default)]
    pub current_purchases: Decimal,
    #[serde(default)]
    pub current_payments: Decimal,
    #[serde(default)]
    pub current_refunds: Decimal,
    #[serde(default)]
    pub period_end_balance: Decimal,
    #[serde(default)]
    pub due_within_term: Decimal,
    #[serde(default)]
    pub paid_within_term: Decimal,
    #[serde(default)]
    pub overdue_amount: Decimal,
    #[serde(default)]
    pub status: StatementStatus,
    #[serde(default)]
    pub transactions: Vec<AccountTransaction>,
}

/// Inclusive date range used by the statement/transaction queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end_date < self.start_date
    }

    /// `start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`
    pub fn query(&self) -> String {
        format!(
            "start_date={}&end_date={}",
            self.start_date.format("%Y-%m-%d"),
            self.end_date.format("%Y-%m-%d")
        )
    }
}
