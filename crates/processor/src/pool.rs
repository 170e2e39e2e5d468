//! Owned, bounded worker pool for work units.

use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ProcessorConfig;
use crate::error::{ProcessorError, Result};

/// Bounded executor for work units.
///
/// Tasks run on the tokio runtime the pool was created in. At most `size`
/// of them hold a permit at any time; permits are shared by every batch
/// dispatched through the same pool. Shutting the pool down refuses new
/// work and cancels outstanding batches.
#[derive(Debug)]
pub struct WorkerPool {
    size: usize,
    permits: Arc<Semaphore>,
    handle: Handle,
    shutdown: CancellationToken,
}

impl WorkerPool {
    /// Creates a pool on the current tokio runtime.
    pub fn new(size: usize) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| ProcessorError::NoRuntime)?;
        Self::with_handle(size, handle)
    }

    pub fn with_handle(size: usize, handle: Handle) -> Result<Self> {
        if size == 0 {
            return Err(ProcessorError::InvalidPoolSize);
        }

        debug!(size, "Worker pool created");

        Ok(Self {
            size,
            permits: Arc::new(Semaphore::new(size)),
            handle,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self> {
        Self::new(config.workers)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits not currently held by a running work unit.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }

    /// Refuses further dispatch and cancels every batch running on the pool.
    ///
    /// Work units already past their cancellation checks finish their
    /// current store call. Calling this more than once is a no-op.
    pub fn shutdown(&self) {
        if self.is_shut_down() {
            return;
        }
        self.permits.close();
        self.shutdown.cancel();
        info!(size = self.size, "Worker pool shut down");
    }

    /// Waits for a free slot. Fails once the pool is shut down.
    pub(crate) async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| ProcessorError::PoolShutDown)
    }

    pub(crate) fn spawn<F>(&self, tasks: &mut JoinSet<()>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tasks.spawn_on(task, &self.handle);
    }

    /// Cancellation token for one batch, cancelled with the pool.
    pub(crate) fn batch_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
