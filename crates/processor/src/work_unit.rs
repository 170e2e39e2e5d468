use itemhub_core::{ItemId, ItemStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::outcome::{FailureReason, WorkOutcome};

/// Fetch, mark processed, and persist a single item.
pub struct WorkUnit {
    id: ItemId,
    store: Arc<dyn ItemStore>,
    cancel: CancellationToken,
}

impl WorkUnit {
    pub fn new(id: ItemId, store: Arc<dyn ItemStore>, cancel: CancellationToken) -> Self {
        Self { id, store, cancel }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Runs the unit to its outcome.
    ///
    /// Returns `None` when cancellation is observed: before the read the
    /// store is not touched at all, after the read the write is skipped.
    /// A write that has started always runs to completion. Store errors
    /// become failure outcomes.
    pub async fn run(self) -> Option<WorkOutcome> {
        if self.cancel.is_cancelled() {
            debug!(item_id = %self.id, "Work unit cancelled before start");
            return None;
        }

        let mut item = match self.store.find_by_id(self.id).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                debug!(item_id = %self.id, "Item not found");
                return Some(WorkOutcome::failure(self.id, FailureReason::NotFound));
            }
            Err(e) => {
                warn!(item_id = %self.id, error = %e, "Failed to read item");
                return Some(WorkOutcome::failure(
                    self.id,
                    FailureReason::Store(e.to_string()),
                ));
            }
        };

        if self.cancel.is_cancelled() {
            debug!(item_id = %self.id, "Work unit cancelled after read, skipping write");
            return None;
        }

        item.mark_processed();

        match self.store.save(&item).await {
            Ok(saved) => {
                debug!(item_id = %self.id, "Item processed");
                Some(WorkOutcome::Success(saved))
            }
            Err(e) => {
                warn!(item_id = %self.id, error = %e, "Failed to save item");
                Some(WorkOutcome::failure(
                    self.id,
                    FailureReason::Store(e.to_string()),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, StoreCall};
    use itemhub_core::ItemStatus;

    #[tokio::test]
    async fn test_marks_item_processed() {
        let store = MemoryStore::with_pending(1..=1);
        let unit = WorkUnit::new(ItemId(1), store.clone(), CancellationToken::new());

        let outcome = unit.run().await.unwrap();

        match outcome {
            WorkOutcome::Success(item) => assert_eq!(item.status, ItemStatus::Processed),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(store.status_of(ItemId(1)), Some(ItemStatus::Processed));
        assert_eq!(store.calls(ItemId(1)), vec![StoreCall::Find, StoreCall::Save]);
    }

    #[tokio::test]
    async fn test_missing_item_is_not_found() {
        let store = MemoryStore::with_pending(1..=1);
        let unit = WorkUnit::new(ItemId(999), store.clone(), CancellationToken::new());

        let outcome = unit.run().await.unwrap();

        assert_eq!(
            outcome,
            WorkOutcome::failure(ItemId(999), FailureReason::NotFound)
        );
        assert_eq!(store.calls(ItemId(999)), vec![StoreCall::Find]);
    }

    #[tokio::test]
    async fn test_store_errors_become_failures() {
        let store = MemoryStore::with_pending(1..=2);
        store.fail_reads_for(ItemId(1));
        store.fail_writes_for(ItemId(2));

        for id in [ItemId(1), ItemId(2)] {
            let outcome = WorkUnit::new(id, store.clone(), CancellationToken::new())
                .run()
                .await
                .unwrap();
            match outcome {
                WorkOutcome::Failure(failure) => {
                    assert_eq!(failure.id, id);
                    assert_eq!(failure.reason.kind(), "store_error");
                }
                other => panic!("unexpected outcome: {:?}", other),
            }
        }

        assert_eq!(store.status_of(ItemId(2)), Some(ItemStatus::Pending));
    }

    #[tokio::test]
    async fn test_cancelled_unit_never_touches_store() {
        let store = MemoryStore::with_pending(1..=1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = WorkUnit::new(ItemId(1), store.clone(), cancel).run().await;

        assert!(outcome.is_none());
        assert!(store.calls(ItemId(1)).is_empty());
    }

    #[tokio::test]
    async fn test_already_processed_item_is_saved_again() {
        let store = MemoryStore::with_pending(1..=1);
        store.set_status(ItemId(1), ItemStatus::Processed);

        let outcome = WorkUnit::new(ItemId(1), store.clone(), CancellationToken::new())
            .run()
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(store.calls(ItemId(1)), vec![StoreCall::Find, StoreCall::Save]);
    }
}
