//! Concurrent batch processing of stored items.
//!
//! A [`BatchCoordinator`] fans one work unit per identifier out onto an owned
//! [`WorkerPool`], funnels every outcome through a [`ResultAggregator`], and
//! waits for all of them (or the deadline) before building a [`BatchResult`].

pub mod aggregator;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod outcome;
pub mod pool;
pub mod work_unit;

#[cfg(test)]
mod testing;

pub use aggregator::ResultAggregator;
pub use config::ProcessorConfig;
pub use coordinator::BatchCoordinator;
pub use error::{ProcessorError, Result};
pub use outcome::{BatchResult, BatchStatus, FailureReason, ItemFailure, WorkOutcome};
pub use pool::WorkerPool;
pub use work_unit::WorkUnit;
