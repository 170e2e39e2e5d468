//! Lock-protected collection point for work unit outcomes.

use itemhub_core::{Item, ItemId};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::outcome::{BatchResult, BatchStatus, FailureReason, ItemFailure, WorkOutcome};

const UNREPORTED_MESSAGE: &str = "worker task ended without reporting an outcome";

/// Collects outcomes from concurrently running work units.
///
/// Each expected identifier contributes at most one outcome. Contributions
/// for unknown or already reported identifiers, and anything arriving after
/// [`ResultAggregator::seal`], are rejected.
#[derive(Debug)]
pub struct ResultAggregator {
    state: Mutex<AggregatorState>,
}

#[derive(Debug)]
struct AggregatorState {
    expected: Vec<ItemId>,
    pending: HashSet<ItemId>,
    processed: Vec<Item>,
    failures: Vec<ItemFailure>,
    sealed: bool,
}

impl ResultAggregator {
    pub fn new(expected: &[ItemId]) -> Self {
        Self {
            state: Mutex::new(AggregatorState {
                expected: expected.to_vec(),
                pending: expected.iter().copied().collect(),
                processed: Vec::with_capacity(expected.len()),
                failures: Vec::new(),
                sealed: false,
            }),
        }
    }

    /// Returns `false` if the outcome was not accepted.
    pub fn record_success(&self, item: Item) -> bool {
        let mut state = self.lock();
        if !state.accept(item.id) {
            return false;
        }
        state.processed.push(item);
        true
    }

    /// Returns `false` if the outcome was not accepted.
    pub fn record_failure(&self, id: ItemId, reason: FailureReason) -> bool {
        let mut state = self.lock();
        if !state.accept(id) {
            return false;
        }
        state.failures.push(ItemFailure::new(id, reason));
        true
    }

    pub fn record(&self, outcome: WorkOutcome) -> bool {
        match outcome {
            WorkOutcome::Success(item) => self.record_success(item),
            WorkOutcome::Failure(failure) => self.record_failure(failure.id, failure.reason),
        }
    }

    /// Stops accepting outcomes.
    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Builds the batch result from what has been recorded so far.
    ///
    /// Identifiers still pending are reported as `Timeout` for a partial
    /// batch and as `Aborted` for a complete one. Callers must only take a
    /// snapshot once every worker has been joined or the batch was sealed.
    pub fn snapshot(&self, status: BatchStatus) -> BatchResult {
        let state = self.lock();

        let mut failures = state.failures.clone();
        failures.extend(
            state
                .expected
                .iter()
                .filter(|id| state.pending.contains(id))
                .map(|&id| {
                    let reason = match status {
                        BatchStatus::Partial => FailureReason::Timeout,
                        BatchStatus::Complete => {
                            FailureReason::Aborted(UNREPORTED_MESSAGE.to_string())
                        }
                    };
                    ItemFailure::new(id, reason)
                }),
        );

        BatchResult {
            status,
            processed: state.processed.clone(),
            failures,
        }
    }

    fn lock(&self) -> MutexGuard<'_, AggregatorState> {
        // Every mutation under the lock is a single push or flag write, so a
        // poisoned guard still holds consistent data.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AggregatorState {
    fn accept(&mut self, id: ItemId) -> bool {
        !self.sealed && self.pending.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemhub_core::NewItem;
    use std::sync::Arc;

    fn item(id: i64) -> Item {
        NewItem::new(format!("Item {}", id), "item@example.com").into_item(ItemId(id))
    }

    fn ids(range: std::ops::RangeInclusive<i64>) -> Vec<ItemId> {
        range.map(ItemId).collect()
    }

    #[test]
    fn test_records_successes_and_failures() {
        let aggregator = ResultAggregator::new(&ids(1..=3));

        assert!(aggregator.record_success(item(2)));
        assert!(aggregator.record_failure(ItemId(3), FailureReason::NotFound));
        assert!(aggregator.record(WorkOutcome::Success(item(1))));
        assert_eq!(aggregator.pending_count(), 0);

        let result = aggregator.snapshot(BatchStatus::Complete);
        assert_eq!(result.processed_ids(), ids(1..=2));
        assert_eq!(result.failure_for(ItemId(3)), Some(&FailureReason::NotFound));
        assert!(result.is_complete());
    }

    #[test]
    fn test_each_identifier_counts_once() {
        let aggregator = ResultAggregator::new(&ids(1..=1));

        assert!(aggregator.record_success(item(1)));
        assert!(!aggregator.record_success(item(1)));
        assert!(!aggregator.record_failure(ItemId(1), FailureReason::NotFound));

        let result = aggregator.snapshot(BatchStatus::Complete);
        assert_eq!(result.total(), 1);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_unknown_identifier_rejected() {
        let aggregator = ResultAggregator::new(&ids(1..=2));

        assert!(!aggregator.record_success(item(7)));
        assert_eq!(aggregator.pending_count(), 2);
    }

    #[test]
    fn test_sealed_aggregator_rejects_late_outcomes() {
        let aggregator = ResultAggregator::new(&ids(1..=2));
        aggregator.record_success(item(1));
        aggregator.seal();

        assert!(aggregator.is_sealed());
        assert!(!aggregator.record_success(item(2)));

        let result = aggregator.snapshot(BatchStatus::Partial);
        assert_eq!(result.processed_ids(), ids(1..=1));
        assert_eq!(result.failure_for(ItemId(2)), Some(&FailureReason::Timeout));
        assert_eq!(result.total(), 2);
    }

    #[test]
    fn test_unreported_identifiers_in_complete_snapshot_are_aborted() {
        let aggregator = ResultAggregator::new(&ids(1..=2));
        aggregator.record_success(item(2));

        let result = aggregator.snapshot(BatchStatus::Complete);
        assert!(matches!(
            result.failure_for(ItemId(1)),
            Some(FailureReason::Aborted(_))
        ));
    }

    #[test]
    fn test_timeouts_follow_input_order() {
        let expected = vec![ItemId(30), ItemId(10), ItemId(20)];
        let aggregator = ResultAggregator::new(&expected);
        aggregator.seal();

        let result = aggregator.snapshot(BatchStatus::Partial);
        let failed: Vec<ItemId> = result.failures.iter().map(|f| f.id).collect();
        assert_eq!(failed, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_recording_loses_nothing() {
        let expected = ids(1..=500);
        let aggregator = Arc::new(ResultAggregator::new(&expected));

        let handles: Vec<_> = expected
            .iter()
            .map(|&id| {
                let aggregator = Arc::clone(&aggregator);
                tokio::spawn(async move {
                    if id.get() % 5 == 0 {
                        aggregator.record_failure(id, FailureReason::NotFound)
                    } else {
                        aggregator.record_success(item(id.get()))
                    }
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap());
        }

        let result = aggregator.snapshot(BatchStatus::Complete);
        assert_eq!(result.processed.len(), 400);
        assert_eq!(result.failures.len(), 100);
        assert_eq!(aggregator.pending_count(), 0);
    }
}
