//! Payment orchestration
//!
//! Drives a pending order through payment: make sure a live payment exists,
//! get the wallet charge parameters, hand them to the wallet and reconcile
//! the result against the backend. Also covers cancellation and both
//! confirm-receipt paths.

use super::confirm::{ConfirmResume, PendingConfirm, PendingConfirmStore};
use super::outcome::{CancelOutcome, FailReason, PaymentResult};
use super::wallet::{ConfirmReceiptTarget, Wallet, WalletPayRequest};
use crate::api::PaymentBackend;
use crate::error::{ClientError, ClientResult};
use crate::order_store::{OrderEvent, OrderStore};
use shared::models::{Order, OrderStatus, Payment, PaymentStatus, StartPaymentResponse};
use shared::money;
use shared::util::{now_millis, now_utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// What came back from the start protocol
#[derive(Debug)]
enum StartAttempt {
    Started(Box<StartPaymentResponse>),
    /// Even the fresh payment could not be started
    NotStartable { payment_id: u64 },
}

/// What a confirm-receipt resume ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeOutcome {
    /// No pending record matched; nothing done
    Ignored,
    /// Backend confirm endpoint called
    Confirmed(Order),
    /// Order already completed by the external flow
    AlreadyCompleted(Order),
    /// Order is in a state where confirming makes no sense
    Skipped(Order),
}

/// Removes the order from the in-flight set on drop
struct InFlight<'a> {
    set: &'a Mutex<HashSet<u64>>,
    order_id: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.order_id);
    }
}

/// 支付编排器
pub struct PaymentOrchestrator {
    payments: Arc<dyn PaymentBackend>,
    orders: Arc<OrderStore>,
    wallet: Arc<dyn Wallet>,
    confirms: PendingConfirmStore,
    provider: String,
    method: String,
    in_flight: Mutex<HashSet<u64>>,
}

impl PaymentOrchestrator {
    pub fn new(
        payments: Arc<dyn PaymentBackend>,
        orders: Arc<OrderStore>,
        wallet: Arc<dyn Wallet>,
        confirms: PendingConfirmStore,
    ) -> Self {
        Self {
            payments,
            orders,
            wallet,
            confirms,
            provider: "wechat".to_string(),
            method: "wechat".to_string(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Provider sent to `start`, method sent to `create`
    pub fn with_provider(mut self, provider: impl Into<String>, method: impl Into<String>) -> Self {
        self.provider = provider.into();
        self.method = method.into();
        self
    }

    pub fn orders(&self) -> &Arc<OrderStore> {
        &self.orders
    }

    // ========================================================================
    // Pay
    // ========================================================================

    /// Initiate (or retry) payment of a pending order.
    ///
    /// Wallet failures are not retried; the caller shows the result and the
    /// user decides. A second concurrent call for the same order is refused.
    pub async fn pay(&self, order_id: u64) -> ClientResult<PaymentResult> {
        let _guard = self.enter(order_id)?;

        let order = self.orders.refresh(order_id).await?;
        if !order.can_pay() {
            return Err(ClientError::InvalidState(format!(
                "order {} is {:?}, not payable",
                order.order_number, order.status
            )));
        }
        if order.is_expired(now_utc()) {
            // countdown is advisory; the backend decides
            tracing::warn!(order_id, "Order countdown elapsed, attempting payment anyway");
        }

        let payment = self.ensure_payment(order_id).await?;
        let started = match self.start_with_retry(order_id, payment).await? {
            StartAttempt::Started(started) => started,
            StartAttempt::NotStartable { payment_id } => {
                return Ok(PaymentResult::fail(
                    order_id,
                    Some(payment_id),
                    FailReason::NotStartable,
                ));
            }
        };

        let payment_id = started.payment.id;
        let amount = money::wallet_amount(
            started.pay_params.amount_cents,
            started.pay_params.amount.or(Some(started.payment.amount)),
        )
        .ok_or_else(|| ClientError::InvalidResponse("start response has no amount".into()))?;
        let request = WalletPayRequest::from_params(&started.pay_params, amount.minor);

        tracing::info!(order_id, payment_id, amount_minor = amount.minor, "Invoking wallet");
        let mut result = match self.wallet.request_payment(&request).await {
            Ok(()) => {
                self.mark_paid(order_id, payment_id);
                PaymentResult::success(order_id, payment_id)
            }
            Err(e) => {
                let kind = e.kind();
                tracing::info!(order_id, payment_id, error = %e, ?kind, "Wallet did not succeed");
                let failed = PaymentResult::fail(order_id, Some(payment_id), kind.into());
                if kind.may_have_charged() {
                    self.reconcile(failed).await
                } else {
                    failed
                }
            }
        };
        result.amount_anomaly = amount.anomaly;
        Ok(result)
    }

    /// Reuse the order's live payment, or create exactly one new payment
    pub async fn ensure_payment(&self, order_id: u64) -> ClientResult<Payment> {
        let existing = self.payments.list_payments(order_id).await?;
        if let Some(live) = existing
            .into_iter()
            .filter(|p| p.order_id == order_id && !p.is_terminal())
            .max_by_key(|p| p.id)
        {
            tracing::debug!(order_id, payment_id = live.id, "Reusing live payment");
            return Ok(live);
        }

        let created = self.payments.create_payment(order_id, &self.method).await?;
        tracing::info!(order_id, payment_id = created.id, "Payment created");
        Ok(created)
    }

    /// Start the payment; a "not startable" rejection gets one fresh
    /// payment and one more start, never more.
    async fn start_with_retry(&self, order_id: u64, payment: Payment) -> ClientResult<StartAttempt> {
        match self.payments.start_payment(payment.id, &self.provider).await {
            Ok(started) => return Ok(StartAttempt::Started(Box::new(started))),
            Err(e) if e.is_not_startable() => {
                tracing::warn!(order_id, payment_id = payment.id, error = %e, "Payment not startable, replacing");
            }
            Err(e) => return Err(e),
        }

        let fresh = self.payments.create_payment(order_id, &self.method).await?;
        match self.payments.start_payment(fresh.id, &self.provider).await {
            Ok(started) => Ok(StartAttempt::Started(Box::new(started))),
            Err(e) if e.is_not_startable() => {
                tracing::warn!(order_id, payment_id = fresh.id, error = %e, "Fresh payment not startable either");
                Ok(StartAttempt::NotStartable {
                    payment_id: fresh.id,
                })
            }
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // Reconcile
    // ========================================================================

    /// Authoritative payment status
    pub async fn fetch_payment_status(&self, payment_id: u64) -> ClientResult<PaymentStatus> {
        Ok(self.payments.get_payment(payment_id).await?.status)
    }

    /// Check a failed result against the backend; a succeeded payment
    /// overrides the local failure. Fetch errors keep the failure.
    pub async fn reconcile(&self, result: PaymentResult) -> PaymentResult {
        let Some(payment_id) = result.payment_id else {
            return result;
        };
        if result.is_success() {
            return result;
        }

        match self.fetch_payment_status(payment_id).await {
            Ok(PaymentStatus::Succeeded) => {
                tracing::info!(order_id = result.order_id, payment_id, "Backend reports success, overriding wallet failure");
                self.mark_paid(result.order_id, payment_id);
                PaymentResult {
                    reconciled: true,
                    ..PaymentResult::success(result.order_id, payment_id)
                }
            }
            Ok(status) => {
                tracing::debug!(payment_id, ?status, "Reconcile confirms failure");
                result
            }
            Err(e) => {
                tracing::warn!(payment_id, error = %e, "Reconcile fetch failed");
                result
            }
        }
    }

    fn mark_paid(&self, order_id: u64, payment_id: u64) {
        self.orders.hint_status(order_id, OrderStatus::Paid);
        self.orders.notify(OrderEvent::PaymentSucceeded {
            order_id,
            payment_id,
        });
    }

    // ========================================================================
    // Cancel
    // ========================================================================

    /// Cancel the order. Refund initiation failures come back as
    /// [`CancelOutcome::RefundFailed`], never as success.
    pub async fn cancel_order(&self, order_id: u64, reason: Option<&str>) -> ClientResult<CancelOutcome> {
        if let Some(order) = self.orders.get(order_id)
            && !order.can_cancel()
        {
            return Err(ClientError::InvalidState(format!(
                "order {} is {:?}, cannot cancel",
                order.order_number, order.status
            )));
        }

        self.orders.hint_status(order_id, OrderStatus::Cancelled);
        let response = match self.orders.backend().cancel_order(order_id, reason).await {
            Ok(response) => response,
            Err(e) => {
                self.orders.rollback_hint(order_id);
                return Err(e);
            }
        };

        match response.order {
            Some(order) => self.orders.upsert(order),
            None => {
                if let Err(e) = self.orders.refresh(order_id).await {
                    tracing::warn!(order_id, error = %e, "Refresh after cancel failed");
                }
            }
        }
        self.orders.notify(OrderEvent::Cancelled { order_id });

        let outcome = match (response.refund_error, response.refund_started) {
            (Some(error), _) => {
                tracing::error!(order_id, channel = ?response.refund_channel, %error, "Refund on cancel failed");
                CancelOutcome::RefundFailed {
                    channel: response.refund_channel,
                    error,
                }
            }
            (None, true) => CancelOutcome::RefundStarted {
                channel: response.refund_channel,
            },
            (None, false) => CancelOutcome::Cancelled,
        };
        Ok(outcome)
    }

    // ========================================================================
    // Confirm receipt
    // ========================================================================

    /// Confirm receipt through the backend endpoint
    pub async fn confirm_receipt(&self, order_id: u64) -> ClientResult<Order> {
        let order = self.orders.refresh(order_id).await?;
        if !order.can_confirm_receipt() {
            return Err(ClientError::InvalidState(format!(
                "order {} is {:?}, cannot confirm receipt",
                order.order_number, order.status
            )));
        }
        self.backend_confirm(order_id).await
    }

    async fn backend_confirm(&self, order_id: u64) -> ClientResult<Order> {
        self.orders.hint_status(order_id, OrderStatus::Completed);
        match self.orders.backend().confirm_receipt(order_id).await {
            Ok(order) => {
                self.orders.upsert(order.clone());
                self.orders.notify(OrderEvent::ReceiptConfirmed { order_id });
                Ok(order)
            }
            Err(e) => {
                self.orders.rollback_hint(order_id);
                Err(e)
            }
        }
    }

    /// Persist the pending record, then open the wallet's confirm flow.
    /// The record is dropped again if the flow cannot be opened.
    pub async fn begin_external_confirm(
        &self,
        order_id: u64,
        target: ConfirmReceiptTarget,
    ) -> ClientResult<()> {
        let order = self.orders.refresh(order_id).await?;
        if !order.can_confirm_receipt() {
            return Err(ClientError::InvalidState(format!(
                "order {} is {:?}, cannot confirm receipt",
                order.order_number, order.status
            )));
        }

        let (transaction_id, merchant_id) = match &target {
            ConfirmReceiptTarget::Transaction { transaction_id } => {
                (Some(transaction_id.clone()), None)
            }
            ConfirmReceiptTarget::Merchant { merchant_id, .. } => (None, Some(merchant_id.clone())),
        };
        self.confirms.put(&PendingConfirm {
            order_id,
            order_number: order.order_number.clone(),
            transaction_id,
            merchant_id,
            created_at: now_millis(),
        })?;

        if let Err(e) = self.wallet.open_confirm_receipt(&target).await {
            tracing::warn!(order_id, error = %e, "External confirm flow failed to open");
            self.confirms.clear()?;
            return Err(ClientError::Wallet(e.message));
        }
        Ok(())
    }

    /// Handle the app resuming from the external confirm flow.
    ///
    /// The pending record is consumed at most once; a repeated callback is a
    /// no-op. The backend confirm is only called for a shipped order.
    pub async fn handle_confirm_resume(&self, resume: &ConfirmResume) -> ClientResult<ResumeOutcome> {
        let Some(record) = self.confirms.take_matching(resume, now_millis())? else {
            return Ok(ResumeOutcome::Ignored);
        };
        let order_id = record.order_id;

        let order = self.orders.refresh(order_id).await?;
        match order.status {
            OrderStatus::Completed => {
                self.orders.notify(OrderEvent::ReceiptConfirmed { order_id });
                Ok(ResumeOutcome::AlreadyCompleted(order))
            }
            OrderStatus::Shipped if !order.has_return_in_progress() => {
                let confirmed = self.backend_confirm(order_id).await?;
                Ok(ResumeOutcome::Confirmed(confirmed))
            }
            status => {
                tracing::info!(order_id, ?status, "Confirm resume: nothing to do");
                Ok(ResumeOutcome::Skipped(order))
            }
        }
    }

    fn enter(&self, order_id: u64) -> ClientResult<InFlight<'_>> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(order_id) {
            return Err(ClientError::InvalidState(format!(
                "payment for order {} already in progress",
                order_id
            )));
        }
        Ok(InFlight {
            set: &self.in_flight,
            order_id,
        })
    }
}
