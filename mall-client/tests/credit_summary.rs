mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::*;
use mall_client::credit::CreditAggregator;
use rust_decimal::Decimal;
use shared::models::{
    AccountStatement, AccountTransaction, DateRange, StatementStatus, TransactionPaymentStatus,
    TransactionType,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn range() -> DateRange {
    DateRange::new(d(2024, 1, 1), d(2024, 3, 31))
}

fn statement(id: u64, start: NaiveDate, end: NaiveDate, prev: &str, closing: &str) -> AccountStatement {
    AccountStatement {
        id,
        period_start: start,
        period_end: end,
        previous_balance: dec(prev),
        current_purchases: dec("500"),
        current_payments: dec("300"),
        current_refunds: dec("20"),
        period_end_balance: dec(closing),
        due_within_term: dec("180"),
        paid_within_term: dec("300"),
        overdue_amount: dec("0"),
        status: StatementStatus::Confirmed,
        transactions: vec![],
    }
}

fn txn(id: u64, kind: TransactionType, amount: &str, statement: Option<u64>) -> AccountTransaction {
    AccountTransaction {
        id,
        transaction_type: kind,
        amount: dec(amount),
        statement,
        order: None,
        payment_status: TransactionPaymentStatus::Unpaid,
        due_date: Some(d(2024, 4, 15)),
        paid_date: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap(),
        description: None,
    }
}

fn backend() -> Arc<FakeCredit> {
    let fake = FakeCredit::default();
    let mut jan = statement(1, d(2024, 1, 1), d(2024, 1, 31), "1000", "1180");
    jan.transactions = vec![txn(10, TransactionType::Purchase, "500", Some(1))];
    let feb = statement(2, d(2024, 2, 1), d(2024, 2, 29), "1180", "1360");
    // backend order is not chronological
    *fake.statements.lock().unwrap() = vec![feb, jan];
    *fake.transactions.lock().unwrap() = vec![
        txn(10, TransactionType::Purchase, "500", Some(1)),
        txn(11, TransactionType::Purchase, "500", Some(2)),
        txn(20, TransactionType::Purchase, "80", None),
        txn(21, TransactionType::Payment, "50", None),
        txn(22, TransactionType::Refund, "10", Some(77)),
    ];
    Arc::new(fake)
}

#[tokio::test]
async fn test_summary_is_idempotent() {
    let aggregator = CreditAggregator::new(backend());
    let first = aggregator.summarize(&range()).await.unwrap();
    let second = aggregator.summarize(&range()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_balance_selection_ignores_backend_order() {
    let aggregator = CreditAggregator::new(backend());
    let summary = aggregator.summarize(&range()).await.unwrap();

    assert_eq!(summary.previous_balance, dec("1000"));
    // February closing + unbilled 80 - 50 - 10
    assert_eq!(summary.period_end_balance, dec("1380"));
}

#[tokio::test]
async fn test_billed_transactions_not_counted_twice() {
    let aggregator = CreditAggregator::new(backend());
    let summary = aggregator.summarize(&range()).await.unwrap();

    assert_eq!(summary.statement_count, 2);
    assert_eq!(summary.unbilled_count, 3);
    assert_eq!(summary.total_purchases, dec("1080"));
    assert_eq!(summary.total_payments, dec("650"));
    assert_eq!(summary.total_refunds, dec("50"));
    assert_eq!(summary.due_within_term, dec("440"));
    assert_eq!(summary.paid_within_term, dec("650"));
    assert!(summary.has_data);
}

#[tokio::test]
async fn test_fetch_failure_aborts_summary() {
    let fake = backend();
    fake.fail_transactions.store(true, Ordering::SeqCst);
    let aggregator = CreditAggregator::new(fake);

    assert!(aggregator.summarize(&range()).await.is_err());
}

#[tokio::test]
async fn test_range_without_records() {
    let aggregator = CreditAggregator::new(Arc::new(FakeCredit::default()));
    let summary = aggregator.summarize(&range()).await.unwrap();

    assert!(!summary.has_data);
    assert_eq!(summary.total_purchases, Decimal::ZERO);
    assert_eq!(summary.period_end_balance, Decimal::ZERO);
}

#[tokio::test]
async fn test_inverted_range_skips_backend() {
    let fake = backend();
    let aggregator = CreditAggregator::new(fake.clone());
    let inverted = DateRange::new(d(2024, 3, 1), d(2024, 1, 1));

    let summary = aggregator.summarize(&inverted).await.unwrap();
    assert!(!summary.has_data);
    assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_my_account_passthrough() {
    let aggregator = CreditAggregator::new(backend());
    let account = aggregator.my_account().await.unwrap();
    assert_eq!(account.available_credit, dec("8800"));
}
