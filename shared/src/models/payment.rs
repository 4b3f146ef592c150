//! Payment Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
    Expired,
}

impl PaymentStatus {
    /// Terminal payments are immutable and never resumed
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PaymentStatus::Succeeded
                | PaymentStatus::Failed
                | PaymentStatus::Cancelled
                | PaymentStatus::Expired
        )
    }

    /// Terminal without success: a retry needs a fresh payment
    pub fn needs_replacement(self) -> bool {
        matches!(
            self,
            PaymentStatus::Failed | PaymentStatus::Cancelled | PaymentStatus::Expired
        )
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        match (self, next) {
            (Pending, Processing) | (Processing, Succeeded) => true,
            (Pending | Processing, Failed | Cancelled | Expired) => true,
            _ => false,
        }
    }
}

/// Payment lifecycle log entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentEvent {
    #[serde(alias = "timestamp", alias = "created_at")]
    pub at: DateTime<Utc>,
    #[serde(alias = "name")]
    pub event: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Payment entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: u64,
    #[serde(alias = "order")]
    pub order_id: u64,
    pub status: PaymentStatus,
    #[serde(default)]
    pub method: String,
    /// Amount in currency unit
    pub amount: Decimal,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "logs")]
    pub events: Vec<PaymentEvent>,
}

impl Payment {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn needs_replacement(&self) -> bool {
        self.status.needs_replacement()
    }

    pub fn latest_event(&self) -> Option<&PaymentEvent> {
        self.events.iter().max_by_key(|e| e.at)
    }
}

/// Wallet-specific charge parameters returned by `POST /payments/{id}/start`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PayParams {
    #[serde(default, alias = "timeStamp")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "nonceStr")]
    pub nonce: Option<String>,
    /// Prepay package token
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default, alias = "signType")]
    pub sign_type: Option<String>,
    #[serde(default, alias = "paySign")]
    pub signature: Option<String>,
    /// Amount in minor units (cents), when the backend declares it
    #[serde(default, alias = "total_fee", alias = "amount_minor")]
    pub amount_cents: Option<i64>,
    /// Amount in currency unit
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Create payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: u64,
    pub method: String,
}

/// Start payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPaymentRequest {
    pub provider: String,
}

/// Start payment response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPaymentResponse {
    pub payment: Payment,
    #[serde(default)]
    pub pay_params: PayParams,
}
