//! Backend seams
//!
//! Each component depends on one of these traits. [`RestClient`] implements
//! all of them against the REST API; tests plug in in-memory fakes.
//!
//! [`RestClient`]: crate::http::RestClient

mod chat;
mod credit;
mod orders;
mod payments;

use crate::error::ClientResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{
    AccountStatement, AccountTransaction, CancelOrderResponse, CreditAccount, DateRange, Order,
    Payment, StartPaymentResponse, SupportMessage,
};
use std::path::Path;

/// Orders: `GET /orders/{id}`, cancel, confirm receipt
#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn get_order(&self, order_id: u64) -> ClientResult<Order>;

    async fn cancel_order(
        &self,
        order_id: u64,
        reason: Option<&str>,
    ) -> ClientResult<CancelOrderResponse>;

    async fn confirm_receipt(&self, order_id: u64) -> ClientResult<Order>;
}

/// Payments: create, start, fetch, list by order
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn create_payment(&self, order_id: u64, method: &str) -> ClientResult<Payment>;

    async fn start_payment(
        &self,
        payment_id: u64,
        provider: &str,
    ) -> ClientResult<StartPaymentResponse>;

    async fn get_payment(&self, payment_id: u64) -> ClientResult<Payment>;

    async fn list_payments(&self, order_id: u64) -> ClientResult<Vec<Payment>>;
}

/// Dealer credit: account, statements, transactions
#[async_trait]
pub trait CreditBackend: Send + Sync {
    async fn my_account(&self) -> ClientResult<CreditAccount>;

    async fn list_statements(&self, range: &DateRange) -> ClientResult<Vec<AccountStatement>>;

    async fn list_transactions(&self, range: &DateRange)
    -> ClientResult<Vec<AccountTransaction>>;
}

/// Support chat: poll after cursor, send text, send attachment
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn fetch_messages(
        &self,
        after: Option<DateTime<Utc>>,
    ) -> ClientResult<Vec<SupportMessage>>;

    async fn send_text(&self, content: &str) -> ClientResult<SupportMessage>;

    async fn send_attachment(&self, path: &Path, caption: &str) -> ClientResult<SupportMessage>;
}

/// List endpoints answer either a bare array or a paginated envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> ListResponse<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Plain(items) => items,
            ListResponse::Paged { results } => results,
        }
    }
}
