//! Client error types

use reqwest::StatusCode;
use serde_json::Value;
use shared::error::{ApiErrorBody, ErrorCategory, ErrorCode};
use thiserror::Error;

/// Substrings the backend uses when a payment can no longer be started
const NOT_STARTABLE_HINTS: &[&str] = &[
    "cancelled",
    "canceled",
    "expired",
    "cannot continue",
    "can not continue",
    "not startable",
    "已取消",
    "已过期",
    "无法继续",
];

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connection, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the request with a structured body
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
        details: Option<Value>,
    },

    /// Authentication required (refresh failed or was rejected)
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Server-side failure (5xx)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local precondition not met (e.g. order not shipped)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Wallet SDK could not be invoked
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Durable storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Map a non-2xx response to an error
    pub fn from_response(status: StatusCode, text: &str) -> Self {
        if let Ok(body) = serde_json::from_str::<ApiErrorBody>(text) {
            let message = body.text();
            if body.code.is_some() || !message.is_empty() {
                return ClientError::Api {
                    status: status.as_u16(),
                    code: body.error_code(),
                    message,
                    details: body.details,
                };
            }
        }

        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(text.to_string()),
            StatusCode::NOT_FOUND => ClientError::NotFound(text.to_string()),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(text.to_string())
            }
            s if s.is_server_error() => ClientError::Internal(text.to_string()),
            _ => ClientError::Validation(text.to_string()),
        }
    }

    /// HTTP 401, structured or not
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ClientError::Unauthorized => true,
            ClientError::Api { status, .. } => *status == StatusCode::UNAUTHORIZED.as_u16(),
            _ => false,
        }
    }

    /// The credentials themselves were refused: 401/403 or an auth error code.
    /// Transport failures and 5xx are not rejections.
    pub fn is_auth_rejection(&self) -> bool {
        match self {
            ClientError::Unauthorized | ClientError::Forbidden(_) => true,
            ClientError::Api { status, code, .. } => {
                *status == StatusCode::UNAUTHORIZED.as_u16()
                    || *status == StatusCode::FORBIDDEN.as_u16()
                    || (*status < 500 && code.is_some_and(|c| c.category() == ErrorCategory::Auth))
            }
            _ => false,
        }
    }

    /// Backend refused to start a payment because of its status
    pub fn is_not_startable(&self) -> bool {
        let text = match self {
            ClientError::Api { code, message, .. } => {
                if code.is_some_and(|c| c.is_payment_not_startable()) {
                    return true;
                }
                message
            }
            ClientError::Validation(text) => text,
            _ => return false,
        };
        let lower = text.to_lowercase();
        NOT_STARTABLE_HINTS.iter().any(|hint| lower.contains(hint))
    }

    /// Transport failure or 5xx
    pub fn is_network(&self) -> bool {
        match self {
            ClientError::Http(_) | ClientError::Internal(_) => true,
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Text for a transient toast
    pub fn user_message(&self) -> String {
        match self {
            e if e.is_network() => "network error, please retry".to_string(),
            ClientError::Unauthorized => "please log in again".to_string(),
            ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
            ClientError::InvalidState(msg) => msg.clone(),
            _ => "operation failed, please retry".to_string(),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
