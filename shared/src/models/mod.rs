//! Data models
//!
//! Wire types of the commerce API, shared by every consumer.

pub mod credit;
pub mod order;
pub mod payment;
pub mod support;

pub use credit::*;
pub use order::*;
pub use payment::*;
pub use support::*;
