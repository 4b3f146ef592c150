//! Shared types for the mall client
//!
//! Wire models of the commerce API (orders, payments, credit ledger,
//! support chat), backend error codes, and money/time helpers.

pub mod client;
pub mod error;
pub mod models;
pub mod money;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ApiErrorBody, ErrorCategory, ErrorCode};
pub use models::MessageId;
