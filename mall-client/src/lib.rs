//! Mall Client - settlement and reconciliation core for the mall app
//!
//! - [`payment`]: order payment, cancellation with refunds, confirm receipt
//! - [`credit`]: dealer credit statement/transaction summary
//! - [`chat`]: support chat with optimistic send and offline replay
//!
//! All components share one [`SessionContext`] and talk to the backend
//! through the traits in [`api`].

pub mod api;
pub mod chat;
pub mod client;
pub mod config;
pub mod credit;
pub mod error;
pub mod http;
pub mod logger;
pub mod order_store;
pub mod payment;
pub mod session;
pub mod storage;

pub use client::MallClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::RestClient;
pub use order_store::{OrderEvent, OrderStore};
pub use session::{SessionContext, SessionEvent};

// Re-export shared types for convenience
pub use shared::client::TokenPair;
pub use shared::models::{DateRange, MessageId, Order, OrderStatus, Payment, PaymentStatus};
