use itemhub_core::StoreError;
use thiserror::Error;

/// Failures that prevent a batch from being dispatched at all.
///
/// Per-item problems never surface here; they are reported as
/// [`crate::ItemFailure`] entries of the batch result.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Worker pool is shut down")]
    PoolShutDown,

    #[error("Worker pool size must be at least 1")]
    InvalidPoolSize,

    #[error("No tokio runtime available to host the worker pool")]
    NoRuntime,

    #[error("Failed to list item identifiers: {0}")]
    Listing(#[source] StoreError),
}

pub type Result<T> = std::result::Result<T, ProcessorError>;
