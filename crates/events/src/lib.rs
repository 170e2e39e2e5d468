//! Event system for itemhub
//!
//! Broadcasts item lifecycle and batch processing events to any
//! interested subscribers.

mod bus;
mod types;

pub use bus::{EventBus, Subscription};
pub use types::*;
