//! Third-party wallet SDK boundary
//!
//! The host application provides the wallet. Its calls suspend until the
//! user finishes, cancels, or the SDK gives up.

use async_trait::async_trait;
use shared::models::PayParams;
use thiserror::Error;

const CANCEL_HINTS: &[&str] = &["cancel", "取消"];
const TIMEOUT_HINTS: &[&str] = &["timeout", "time out", "timed out", "超时"];

/// Charge request handed to the wallet
#[derive(Debug, Clone, PartialEq)]
pub struct WalletPayRequest {
    pub timestamp: Option<String>,
    pub nonce: Option<String>,
    pub package: Option<String>,
    pub sign_type: Option<String>,
    pub signature: Option<String>,
    /// Non-negative amount in minor units
    pub amount_minor: i64,
}

impl WalletPayRequest {
    pub fn from_params(params: &PayParams, amount_minor: i64) -> Self {
        Self {
            timestamp: params.timestamp.clone(),
            nonce: params.nonce.clone(),
            package: params.package.clone(),
            sign_type: params.sign_type.clone(),
            signature: params.signature.clone(),
            amount_minor,
        }
    }
}

/// Target of the wallet's own confirm-receipt flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmReceiptTarget {
    Transaction {
        transaction_id: String,
    },
    Merchant {
        merchant_id: String,
        trade_number: String,
    },
}

/// What the wallet reported when it did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletFailureKind {
    /// User backed out
    Cancelled,
    TimedOut,
    Failed,
}

impl WalletFailureKind {
    /// Whether the charge may have cleared despite the failure signal
    pub fn may_have_charged(self) -> bool {
        !matches!(self, WalletFailureKind::Cancelled)
    }
}

/// Wallet error message as returned by the SDK
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct WalletError {
    pub message: String,
}

impl WalletError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Classify by the keywords in the SDK message
    pub fn kind(&self) -> WalletFailureKind {
        let lower = self.message.to_lowercase();
        if CANCEL_HINTS.iter().any(|h| lower.contains(h)) {
            WalletFailureKind::Cancelled
        } else if TIMEOUT_HINTS.iter().any(|h| lower.contains(h)) {
            WalletFailureKind::TimedOut
        } else {
            WalletFailureKind::Failed
        }
    }
}

/// Host-provided wallet
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Present the payment sheet; resolves on success, cancel or error
    async fn request_payment(&self, request: &WalletPayRequest) -> Result<(), WalletError>;

    /// Open the wallet's confirm-receipt flow. Returns once the flow is
    /// launched; completion arrives later as a resume callback.
    async fn open_confirm_receipt(&self, target: &ConfirmReceiptTarget) -> Result<(), WalletError>;
}
