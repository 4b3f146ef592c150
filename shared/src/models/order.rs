//! Order Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status
///
/// Transitions are decided by the backend. The client only ever holds a
/// status it received, or a rollback-able hint (see `OrderStore`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// 待付款
    #[default]
    Pending,
    /// 已付款
    Paid,
    /// 已发货
    Shipped,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
    /// 退款中
    Refunding,
    /// 已退款
    Refunded,
}

impl OrderStatus {
    /// Whether the server may move an order from `self` to `next`
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Cancelled)
                | (Paid, Shipped)
                | (Paid, Cancelled)
                | (Paid, Refunding)
                | (Shipped, Completed)
                | (Shipped, Refunding)
                | (Completed, Refunding)
                | (Refunding, Refunded)
        )
    }

    /// No further transitions possible
    pub fn is_final(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }
}

/// Return (after-sales) status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Requested,
    Approved,
    InTransit,
    Received,
    Rejected,
}

impl ReturnStatus {
    pub fn can_transition_to(self, next: ReturnStatus) -> bool {
        use ReturnStatus::*;
        matches!(
            (self, next),
            (Requested, Approved)
                | (Requested, Rejected)
                | (Approved, InTransit)
                | (InTransit, Received)
                | (InTransit, Rejected)
        )
    }

    /// Still open (blocks confirm-receipt)
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            ReturnStatus::Requested | ReturnStatus::Approved | ReturnStatus::InTransit
        )
    }
}

/// Return / refund sub-record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnRequest {
    pub id: u64,
    pub status: ReturnStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub refund_amount: Option<Decimal>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Shipping address snapshot taken at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ShippingAddress {
    pub receiver: String,
    pub phone: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    pub detail: String,
}

/// Line item snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: u64,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    /// Unit price in currency unit
    pub price: Decimal,
    pub quantity: u32,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: u64,
    pub order_number: String,
    pub status: OrderStatus,
    /// Declared total in currency unit
    pub total_amount: Decimal,
    /// Charged amount, set only after payment or merchant adjustment
    #[serde(default)]
    pub actual_amount: Option<Decimal>,
    /// Payment deadline, only meaningful while pending
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, alias = "return_info")]
    pub return_request: Option<ReturnRequest>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Amount the customer owes / paid: actual if set, declared otherwise
    pub fn effective_amount(&self) -> Decimal {
        self.actual_amount.unwrap_or(self.total_amount)
    }

    /// Local view of the payment deadline. Advisory only.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == OrderStatus::Pending && self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Countdown for the pay button, `None` when not pending or no deadline
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        if self.status != OrderStatus::Pending {
            return None;
        }
        self.expires_at
            .map(|exp| (exp - now).num_seconds().max(0))
    }

    pub fn has_return_in_progress(&self) -> bool {
        self.return_request
            .as_ref()
            .is_some_and(|r| r.status.is_in_progress())
    }

    pub fn can_pay(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Paid)
    }

    pub fn can_confirm_receipt(&self) -> bool {
        self.status == OrderStatus::Shipped && !self.has_return_in_progress()
    }

    pub fn can_request_return(&self) -> bool {
        matches!(self.status, OrderStatus::Shipped | OrderStatus::Completed)
            && self.return_request.is_none()
    }
}

/// Cancel order payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CancelOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Where an automatic refund goes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefundChannel {
    /// Back to the third-party wallet
    #[serde(alias = "wechat")]
    Wallet,
    /// Back to the dealer's store credit (processed manually)
    #[serde(alias = "store_credit", alias = "balance")]
    Credit,
}

/// Cancel order response
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CancelOrderResponse {
    #[serde(default)]
    pub refund_started: bool,
    #[serde(default)]
    pub refund_channel: Option<RefundChannel>,
    #[serde(default)]
    pub refund_error: Option<String>,
    #[serde(default)]
    pub order: Option<Order>,
}
