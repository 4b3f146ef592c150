//! In-memory backends and wallet for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mall_client::api::{ChatBackend, CreditBackend, OrderBackend, PaymentBackend};
use mall_client::payment::{ConfirmReceiptTarget, Wallet, WalletError, WalletPayRequest};
use mall_client::{ClientError, ClientResult};
use rust_decimal::Decimal;
use shared::ErrorCode;
use shared::models::{
    AccountStatement, AccountTransaction, CancelOrderResponse, CreditAccount, DateRange,
    DeliveryStatus, MessageId, Order, OrderStatus, PayParams, Payment, PaymentStatus, StartPaymentResponse,
    SupportMessage,
};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn order(id: u64, status: OrderStatus) -> Order {
    Order {
        id,
        order_number: format!("SO{:06}", id),
        status,
        total_amount: dec("199.90"),
        actual_amount: None,
        expires_at: None,
        shipping_address: None,
        items: vec![],
        return_request: None,
        created_at: None,
    }
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Default)]
pub struct FakeOrders {
    orders: Mutex<HashMap<u64, Order>>,
    pub cancel_response: Mutex<Option<CancelOrderResponse>>,
    pub confirm_calls: AtomicUsize,
}

impl FakeOrders {
    pub fn with(orders: Vec<Order>) -> Arc<Self> {
        let fake = Self::default();
        for o in orders {
            fake.set(o);
        }
        Arc::new(fake)
    }

    pub fn set(&self, order: Order) {
        self.orders.lock().unwrap().insert(order.id, order);
    }

    pub fn set_status(&self, order_id: u64, status: OrderStatus) {
        if let Some(o) = self.orders.lock().unwrap().get_mut(&order_id) {
            o.status = status;
        }
    }

    fn find(&self, order_id: u64) -> ClientResult<Order> {
        self.orders
            .lock()
            .unwrap()
            .get(&order_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("order {}", order_id)))
    }
}

#[async_trait]
impl OrderBackend for FakeOrders {
    async fn get_order(&self, order_id: u64) -> ClientResult<Order> {
        self.find(order_id)
    }

    async fn cancel_order(&self, order_id: u64, _reason: Option<&str>) -> ClientResult<CancelOrderResponse> {
        self.set_status(order_id, OrderStatus::Cancelled);
        let mut response = self.cancel_response.lock().unwrap().clone().unwrap_or_default();
        response.order = Some(self.find(order_id)?);
        Ok(response)
    }

    async fn confirm_receipt(&self, order_id: u64) -> ClientResult<Order> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        self.set_status(order_id, OrderStatus::Completed);
        self.find(order_id)
    }
}

// ============================================================================
// Payments
// ============================================================================

/// Scripted answer to the next `start` call
#[derive(Debug, Clone, Copy)]
pub enum StartScript {
    Ok,
    NotStartable,
    ServerError,
}

pub struct FakePayments {
    payments: Mutex<Vec<Payment>>,
    next_id: AtomicU64,
    script: Mutex<VecDeque<StartScript>>,
    pub start_calls: Mutex<Vec<u64>>,
    pub get_calls: AtomicUsize,
    pub pay_params: Mutex<PayParams>,
    /// Status reported by `get_payment`, overriding the stored one
    pub remote_status: Mutex<Option<PaymentStatus>>,
}

impl FakePayments {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            payments: Mutex::new(vec![]),
            next_id: AtomicU64::new(1),
            script: Mutex::new(VecDeque::new()),
            start_calls: Mutex::new(vec![]),
            get_calls: AtomicUsize::new(0),
            pay_params: Mutex::new(PayParams {
                package: Some("prepay_id=wx123".into()),
                amount: Some(dec("199.90")),
                ..Default::default()
            }),
            remote_status: Mutex::new(None),
        })
    }

    pub fn script(&self, steps: &[StartScript]) {
        self.script.lock().unwrap().extend(steps.iter().copied());
    }

    pub fn seed(&self, order_id: u64, status: PaymentStatus) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.payments.lock().unwrap().push(payment(id, order_id, status));
        id
    }

    /// Payments created through `create_payment` or `seed`
    pub fn created(&self) -> Vec<Payment> {
        self.payments.lock().unwrap().clone()
    }

    pub fn starts(&self) -> Vec<u64> {
        self.start_calls.lock().unwrap().clone()
    }

    fn set_status(&self, payment_id: u64, status: PaymentStatus) -> Option<Payment> {
        let mut payments = self.payments.lock().unwrap();
        let p = payments.iter_mut().find(|p| p.id == payment_id)?;
        p.status = status;
        Some(p.clone())
    }
}

fn payment(id: u64, order_id: u64, status: PaymentStatus) -> Payment {
    Payment {
        id,
        order_id,
        status,
        method: "wechat".into(),
        amount: dec("199.90"),
        expires_at: None,
        events: vec![],
    }
}

#[async_trait]
impl PaymentBackend for FakePayments {
    async fn create_payment(&self, order_id: u64, _method: &str) -> ClientResult<Payment> {
        let id = self.seed(order_id, PaymentStatus::Pending);
        Ok(payment(id, order_id, PaymentStatus::Pending))
    }

    async fn start_payment(&self, payment_id: u64, _provider: &str) -> ClientResult<StartPaymentResponse> {
        self.start_calls.lock().unwrap().push(payment_id);
        let step = self.script.lock().unwrap().pop_front().unwrap_or(StartScript::Ok);
        match step {
            StartScript::Ok => {
                let payment = self
                    .set_status(payment_id, PaymentStatus::Processing)
                    .ok_or_else(|| ClientError::NotFound(format!("payment {}", payment_id)))?;
                Ok(StartPaymentResponse {
                    payment,
                    pay_params: self.pay_params.lock().unwrap().clone(),
                })
            }
            StartScript::NotStartable => {
                self.set_status(payment_id, PaymentStatus::Cancelled);
                Err(ClientError::Api {
                    status: 400,
                    code: Some(ErrorCode::PaymentCancelled),
                    message: "payment already cancelled, cannot continue".into(),
                    details: None,
                })
            }
            StartScript::ServerError => Err(ClientError::Internal("upstream unavailable".into())),
        }
    }

    async fn get_payment(&self, payment_id: u64) -> ClientResult<Payment> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let mut p = self
            .created()
            .into_iter()
            .find(|p| p.id == payment_id)
            .ok_or_else(|| ClientError::NotFound(format!("payment {}", payment_id)))?;
        if let Some(status) = *self.remote_status.lock().unwrap() {
            p.status = status;
        }
        Ok(p)
    }

    async fn list_payments(&self, order_id: u64) -> ClientResult<Vec<Payment>> {
        Ok(self
            .created()
            .into_iter()
            .filter(|p| p.order_id == order_id)
            .collect())
    }
}

// ============================================================================
// Wallet
// ============================================================================

pub struct RecordingWallet {
    pub requests: Mutex<Vec<WalletPayRequest>>,
    pub response: Mutex<Result<(), WalletError>>,
    pub confirm_targets: Mutex<Vec<ConfirmReceiptTarget>>,
}

impl RecordingWallet {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(vec![]),
            response: Mutex::new(Ok(())),
            confirm_targets: Mutex::new(vec![]),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        let wallet = Self::succeeding();
        *wallet.response.lock().unwrap() = Err(WalletError::new(message));
        wallet
    }

    pub fn amounts(&self) -> Vec<i64> {
        self.requests.lock().unwrap().iter().map(|r| r.amount_minor).collect()
    }
}

#[async_trait]
impl Wallet for RecordingWallet {
    async fn request_payment(&self, request: &WalletPayRequest) -> Result<(), WalletError> {
        self.requests.lock().unwrap().push(request.clone());
        self.response.lock().unwrap().clone()
    }

    async fn open_confirm_receipt(&self, target: &ConfirmReceiptTarget) -> Result<(), WalletError> {
        self.confirm_targets.lock().unwrap().push(target.clone());
        Ok(())
    }
}

// ============================================================================
// Credit
// ============================================================================

#[derive(Default)]
pub struct FakeCredit {
    pub statements: Mutex<Vec<AccountStatement>>,
    pub transactions: Mutex<Vec<AccountTransaction>>,
    pub fail_transactions: AtomicBool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl CreditBackend for FakeCredit {
    async fn my_account(&self) -> ClientResult<CreditAccount> {
        Ok(CreditAccount {
            id: 1,
            credit_limit: dec("10000"),
            outstanding_debt: dec("1200"),
            available_credit: dec("8800"),
            payment_term_days: 30,
            is_active: true,
        })
    }

    async fn list_statements(&self, _range: &DateRange) -> ClientResult<Vec<AccountStatement>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.statements.lock().unwrap().clone())
    }

    async fn list_transactions(&self, _range: &DateRange) -> ClientResult<Vec<AccountTransaction>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_transactions.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("ledger unavailable".into()));
        }
        Ok(self.transactions.lock().unwrap().clone())
    }
}

// ============================================================================
// Chat
// ============================================================================

/// Server-side conversation. `fetch_messages` is inclusive of the cursor,
/// so every poll re-delivers the newest message.
pub struct FakeChat {
    pub online: AtomicBool,
    server: Mutex<Vec<SupportMessage>>,
    next_id: AtomicU64,
    pub fetches: AtomicUsize,
    pub sends: AtomicUsize,
}

impl FakeChat {
    pub fn new(online: bool) -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(online),
            server: Mutex::new(vec![]),
            next_id: AtomicU64::new(1),
            fetches: AtomicUsize::new(0),
            sends: AtomicUsize::new(0),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Staff reply stored server-side
    pub fn staff_reply(&self, content: &str) -> SupportMessage {
        self.store(content, true)
    }

    fn store(&self, content: &str, from_staff: bool) -> SupportMessage {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let msg = SupportMessage {
            id: MessageId::Server(id),
            ticket: Some(1),
            from_staff,
            status: DeliveryStatus::Sent,
            ..SupportMessage::local_text(content, Utc::now())
        };
        self.server.lock().unwrap().push(msg.clone());
        msg
    }

    fn check_online(&self) -> ClientResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ClientError::Internal("network unreachable".into()))
        }
    }
}

#[async_trait]
impl ChatBackend for FakeChat {
    async fn fetch_messages(&self, after: Option<DateTime<Utc>>) -> ClientResult<Vec<SupportMessage>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self
            .server
            .lock()
            .unwrap()
            .iter()
            .filter(|m| after.is_none_or(|cursor| m.created_at >= cursor))
            .cloned()
            .collect())
    }

    async fn send_text(&self, content: &str) -> ClientResult<SupportMessage> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.store(content, false))
    }

    async fn send_attachment(&self, path: &Path, caption: &str) -> ClientResult<SupportMessage> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let mut msg = self.store(caption, false);
        msg.attachment = Some(shared::models::Attachment {
            url: format!("https://cdn.example.com/{}", path.display()),
            name: None,
            content_type: None,
            size: None,
        });
        Ok(msg)
    }
}
