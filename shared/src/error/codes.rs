//! Backend error codes
//!
//! Error codes returned by the commerce API in rejected responses.
//! Codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Credit errors
//! - 7xxx: Support chat errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend error code
///
/// Represented as u16 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Refresh token rejected
    RefreshTokenInvalid = 1008,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been paid
    OrderAlreadyPaid = 4002,
    /// Order has already been completed
    OrderAlreadyCompleted = 4003,
    /// Order has already been cancelled
    OrderAlreadyCancelled = 4004,
    /// Order payment window has closed
    OrderExpired = 4008,
    /// Order is not in shipped status
    OrderNotShipped = 4009,
    /// A return is in progress for this order
    OrderReturnInProgress = 4010,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Invalid payment method
    PaymentInvalidMethod = 5003,
    /// Payment cannot be started in its current status
    PaymentNotStartable = 5010,
    /// Payment was cancelled
    PaymentCancelled = 5011,
    /// Payment has expired
    PaymentExpired = 5012,
    /// Automatic refund could not be started
    RefundFailed = 5020,

    // ==================== 6xxx: Credit ====================
    /// Credit account not found
    CreditAccountNotFound = 6001,
    /// Credit account is inactive
    CreditAccountInactive = 6002,

    // ==================== 7xxx: Support ====================
    /// Attachment rejected (type or size)
    AttachmentRejected = 7001,
    /// Message content empty
    MessageEmpty = 7002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Upstream provider (wallet gateway) error
    ProviderError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Payment precondition failures that a fresh payment can recover from
    #[inline]
    pub const fn is_payment_not_startable(&self) -> bool {
        matches!(
            self,
            ErrorCode::PaymentNotStartable | ErrorCode::PaymentCancelled | ErrorCode::PaymentExpired
        )
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",
            ErrorCode::RefreshTokenInvalid => "Refresh token is invalid",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyPaid => "Order has already been paid",
            ErrorCode::OrderAlreadyCompleted => "Order has already been completed",
            ErrorCode::OrderAlreadyCancelled => "Order has already been cancelled",
            ErrorCode::OrderExpired => "Order payment window has closed",
            ErrorCode::OrderNotShipped => "Order has not been shipped",
            ErrorCode::OrderReturnInProgress => "A return is in progress for this order",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::PaymentNotStartable => "Payment cannot continue",
            ErrorCode::PaymentCancelled => "Payment already cancelled",
            ErrorCode::PaymentExpired => "Payment already expired",
            ErrorCode::RefundFailed => "Automatic refund could not be started",

            // Credit
            ErrorCode::CreditAccountNotFound => "Credit account not found",
            ErrorCode::CreditAccountInactive => "Credit account is inactive",

            // Support
            ErrorCode::AttachmentRejected => "Attachment rejected",
            ErrorCode::MessageEmpty => "Message content is empty",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::ProviderError => "Payment provider error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1008 => Ok(ErrorCode::RefreshTokenInvalid),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyPaid),
            4003 => Ok(ErrorCode::OrderAlreadyCompleted),
            4004 => Ok(ErrorCode::OrderAlreadyCancelled),
            4008 => Ok(ErrorCode::OrderExpired),
            4009 => Ok(ErrorCode::OrderNotShipped),
            4010 => Ok(ErrorCode::OrderReturnInProgress),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5003 => Ok(ErrorCode::PaymentInvalidMethod),
            5010 => Ok(ErrorCode::PaymentNotStartable),
            5011 => Ok(ErrorCode::PaymentCancelled),
            5012 => Ok(ErrorCode::PaymentExpired),
            5020 => Ok(ErrorCode::RefundFailed),

            // Credit
            6001 => Ok(ErrorCode::CreditAccountNotFound),
            6002 => Ok(ErrorCode::CreditAccountInactive),

            // Support
            7001 => Ok(ErrorCode::AttachmentRejected),
            7002 => Ok(ErrorCode::MessageEmpty),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::ProviderError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
