//! Support chat synchronization
//!
//! [`MessageLog`] holds the merge rules, [`ChatSyncEngine`] drives sends,
//! polls and offline replay, [`ChatPoller`] owns the polling timer.

mod engine;
mod log;
mod poller;
mod queue;

pub use engine::{ChatSyncEngine, ReplayReport, SendOutcome};
pub use log::MessageLog;
pub use poller::ChatPoller;
pub use queue::{OfflineQueue, QueuedMessage};
