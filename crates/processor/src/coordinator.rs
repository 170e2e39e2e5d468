//! Fan-out/fan-in coordination of work units.

use itemhub_core::{ItemId, ItemStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator::ResultAggregator;
use crate::error::{ProcessorError, Result};
use crate::outcome::{BatchResult, BatchStatus};
use crate::pool::WorkerPool;
use crate::work_unit::WorkUnit;

/// Runs one work unit per identifier on a [`WorkerPool`] and collects every
/// outcome into a [`BatchResult`].
///
/// The coordinator never returns while a dispatched unit could still add to
/// the result: it either joins every unit or, when the deadline elapses,
/// seals the aggregator before taking the snapshot.
#[derive(Clone)]
pub struct BatchCoordinator {
    store: Arc<dyn ItemStore>,
    pool: Arc<WorkerPool>,
    default_timeout: Option<Duration>,
}

impl BatchCoordinator {
    pub fn new(store: Arc<dyn ItemStore>, pool: Arc<WorkerPool>) -> Self {
        Self {
            store,
            pool,
            default_timeout: None,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Deadline for a batch starting now, `timeout` taking precedence over
    /// the configured default.
    pub fn deadline_for(&self, timeout: Option<Duration>) -> Option<Instant> {
        timeout
            .or(self.default_timeout)
            .map(|timeout| Instant::now() + timeout)
    }

    /// Processes every item currently in the store.
    ///
    /// Identifiers are listed at call time; items deleted before their unit
    /// runs are reported as not found.
    pub async fn process_all(&self, deadline: Option<Instant>) -> Result<BatchResult> {
        if self.pool.is_shut_down() {
            return Err(ProcessorError::PoolShutDown);
        }

        let ids = self.store.list_ids().await.map_err(|e| {
            warn!(error = %e, "Failed to list item identifiers");
            ProcessorError::Listing(e)
        })?;

        self.run(ids, deadline).await
    }

    /// Processes the given identifiers. Duplicates are processed once.
    pub async fn run(
        &self,
        ids: impl IntoIterator<Item = ItemId>,
        deadline: Option<Instant>,
    ) -> Result<BatchResult> {
        if self.pool.is_shut_down() {
            return Err(ProcessorError::PoolShutDown);
        }

        let ids = dedup(ids);
        if ids.is_empty() {
            debug!("Empty batch, nothing to dispatch");
            return Ok(BatchResult::empty());
        }

        let started = std::time::Instant::now();
        let aggregator = Arc::new(ResultAggregator::new(&ids));
        let cancel = self.pool.batch_token();
        let mut tasks = JoinSet::new();

        info!(
            items = ids.len(),
            workers = self.pool.size(),
            timeout_ms = ?deadline.map(|d| d.saturating_duration_since(Instant::now()).as_millis()),
            "Starting batch"
        );

        let drive = self.dispatch_and_join(&ids, &aggregator, &cancel, &mut tasks);
        let finished = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, drive).await.ok(),
            None => Some(drive.await),
        };

        let status = match finished {
            Some(Ok(())) => BatchStatus::Complete,
            Some(Err(e)) => {
                warn!(error = %e, "Batch dispatch failed");
                return Err(e);
            }
            None => {
                aggregator.seal();
                cancel.cancel();
                // Detached, not aborted: a write in flight runs to completion.
                tasks.detach_all();
                let status = status_at_deadline(&aggregator);
                if status == BatchStatus::Partial {
                    warn!(
                        pending = aggregator.pending_count(),
                        "Batch deadline elapsed, returning partial result"
                    );
                }
                status
            }
        };

        aggregator.seal();
        let result = aggregator.snapshot(status);

        info!(
            status = status.as_str(),
            processed = result.processed.len(),
            failed = result.failures.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Batch finished"
        );

        Ok(result)
    }

    async fn dispatch_and_join(
        &self,
        ids: &[ItemId],
        aggregator: &Arc<ResultAggregator>,
        cancel: &CancellationToken,
        tasks: &mut JoinSet<()>,
    ) -> Result<()> {
        let mut dispatch_error = None;

        for &id in ids {
            let permit = match self.pool.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    dispatch_error = Some(e);
                    break;
                }
            };

            let unit = WorkUnit::new(id, Arc::clone(&self.store), cancel.clone());
            let aggregator = Arc::clone(aggregator);

            self.pool.spawn(tasks, async move {
                let _permit = permit;
                if let Some(outcome) = unit.run().await {
                    if !aggregator.record(outcome) {
                        debug!(item_id = %id, "Outcome arrived after the batch was sealed");
                    }
                }
            });
        }

        if dispatch_error.is_some() {
            cancel.cancel();
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Work unit terminated abnormally");
            }
        }

        if let Some(e) = dispatch_error {
            return Err(e);
        }

        // Units that saw the pool's shutdown never reported; that is a
        // dispatch failure, not a per-item one.
        if self.pool.is_shut_down() && aggregator.pending_count() > 0 {
            return Err(ProcessorError::PoolShutDown);
        }

        Ok(())
    }
}

/// Status of a sealed batch whose deadline fired. Every outcome may already
/// be recorded while the join is still draining; that batch is complete.
fn status_at_deadline(aggregator: &ResultAggregator) -> BatchStatus {
    if aggregator.pending_count() == 0 {
        BatchStatus::Complete
    } else {
        BatchStatus::Partial
    }
}

fn dedup(ids: impl IntoIterator<Item = ItemId>) -> Vec<ItemId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
