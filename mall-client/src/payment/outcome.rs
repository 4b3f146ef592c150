//! User-facing results of payment and cancellation

use super::wallet::WalletFailureKind;
use shared::models::RefundChannel;

/// Why a payment attempt ended in failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    Cancelled,
    TimedOut,
    Failed,
    /// Backend refused to start even a fresh payment
    NotStartable,
}

impl FailReason {
    pub fn message(self) -> &'static str {
        match self {
            FailReason::Cancelled => "payment cancelled",
            FailReason::TimedOut => "payment timed out, please retry",
            FailReason::Failed | FailReason::NotStartable => "payment failed, please retry",
        }
    }
}

impl From<WalletFailureKind> for FailReason {
    fn from(kind: WalletFailureKind) -> Self {
        match kind {
            WalletFailureKind::Cancelled => FailReason::Cancelled,
            WalletFailureKind::TimedOut => FailReason::TimedOut,
            WalletFailureKind::Failed => FailReason::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success,
    Fail(FailReason),
}

/// What the result view shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResult {
    pub order_id: u64,
    pub payment_id: Option<u64>,
    pub outcome: PaymentOutcome,
    /// The charge amount was negative and clamped to zero
    pub amount_anomaly: bool,
    /// Success came from the backend status, not the wallet callback
    pub reconciled: bool,
}

impl PaymentResult {
    pub fn success(order_id: u64, payment_id: u64) -> Self {
        Self {
            order_id,
            payment_id: Some(payment_id),
            outcome: PaymentOutcome::Success,
            amount_anomaly: false,
            reconciled: false,
        }
    }

    pub fn fail(order_id: u64, payment_id: Option<u64>, reason: FailReason) -> Self {
        Self {
            order_id,
            payment_id,
            outcome: PaymentOutcome::Fail(reason),
            amount_anomaly: false,
            reconciled: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == PaymentOutcome::Success
    }

    /// Result view tag
    pub fn tag(&self) -> &'static str {
        match self.outcome {
            PaymentOutcome::Success => "success",
            PaymentOutcome::Fail(_) => "fail",
        }
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self.outcome {
            PaymentOutcome::Success => None,
            PaymentOutcome::Fail(reason) => Some(reason.message()),
        }
    }
}

/// Result of an order cancellation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Nothing was paid, nothing to refund
    Cancelled,
    RefundStarted { channel: Option<RefundChannel> },
    /// Cancelled, but the automatic refund did not start
    RefundFailed {
        channel: Option<RefundChannel>,
        error: String,
    },
}

impl CancelOutcome {
    pub fn refund_failed(&self) -> bool {
        matches!(self, CancelOutcome::RefundFailed { .. })
    }

    pub fn message(&self) -> String {
        match self {
            CancelOutcome::Cancelled => "order cancelled".to_string(),
            CancelOutcome::RefundStarted {
                channel: Some(RefundChannel::Credit),
            } => "order cancelled, store-credit refund submitted for manual processing".to_string(),
            CancelOutcome::RefundStarted { .. } => {
                "order cancelled, the refund will return to your wallet".to_string()
            }
            CancelOutcome::RefundFailed {
                channel: Some(RefundChannel::Credit),
                error,
            } => format!(
                "order cancelled, but the store-credit refund failed ({}); it needs manual processing, please contact support",
                error
            ),
            CancelOutcome::RefundFailed { error, .. } => format!(
                "order cancelled, but the automatic refund failed ({}); please contact support",
                error
            ),
        }
    }
}
