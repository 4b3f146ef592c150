//! Error codes and rejected-response bodies of the commerce API
//!
//! - [`ErrorCode`]: Standardized backend error codes
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`ApiErrorBody`]: JSON body of a non-2xx response
//!
//! # Example
//!
//! ```
//! use shared::error::{ApiErrorBody, ErrorCode};
//!
//! let body: ApiErrorBody =
//!     serde_json::from_str(r#"{"code": 5011, "detail": "payment already cancelled"}"#).unwrap();
//! assert_eq!(body.error_code(), Some(ErrorCode::PaymentCancelled));
//! assert_eq!(body.text(), "payment already cancelled");
//! ```

mod category;
mod codes;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a rejected API request
///
/// The backend is not consistent about the text field: some endpoints
/// answer with `message`, others with `detail` or `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Numeric error code, when the endpoint provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Field-level errors or other context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiErrorBody {
    /// Known error code, if any
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.code.and_then(|c| ErrorCode::try_from(c).ok())
    }

    /// Human-readable text, falling back to the code's default message
    pub fn text(&self) -> String {
        self.message
            .as_deref()
            .or(self.detail.as_deref())
            .or(self.error.as_deref())
            .map(str::to_string)
            .or_else(|| self.error_code().map(|c| c.message().to_string()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prefers_message() {
        let body = ApiErrorBody {
            message: Some("m".into()),
            detail: Some("d".into()),
            ..Default::default()
        };
        assert_eq!(body.text(), "m");
    }

    #[test]
    fn test_text_falls_back_to_code() {
        let body = ApiErrorBody {
            code: Some(4009),
            ..Default::default()
        };
        assert_eq!(body.text(), "Order has not been shipped");
    }

    #[test]
    fn test_unknown_code_is_none() {
        let body: ApiErrorBody = serde_json::from_str(r#"{"code": 4242}"#).unwrap();
        assert_eq!(body.error_code(), None);
        assert_eq!(body.text(), "");
    }
}
