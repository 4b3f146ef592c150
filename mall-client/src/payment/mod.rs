//! Payment and order lifecycle
//!
//! - [`PaymentOrchestrator`]: pay, reconcile, cancel, confirm receipt
//! - [`Wallet`]: host-provided wallet SDK
//! - [`PendingConfirmStore`]: external confirm-receipt record

mod confirm;
mod orchestrator;
mod outcome;
mod wallet;

pub use confirm::{ConfirmResume, PendingConfirm, PendingConfirmStore};
pub use orchestrator::{PaymentOrchestrator, ResumeOutcome};
pub use outcome::{CancelOutcome, FailReason, PaymentOutcome, PaymentResult};
pub use wallet::{ConfirmReceiptTarget, Wallet, WalletError, WalletFailureKind, WalletPayRequest};
