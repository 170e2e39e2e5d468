use itemhub_core::{Item, ItemId};
use thiserror::Error;

/// Why a single identifier could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("Item not found")]
    NotFound,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Batch deadline elapsed before the item was processed")]
    Timeout,

    #[error("Worker aborted: {0}")]
    Aborted(String),
}

impl FailureReason {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Store(_) => "store_error",
            Self::Timeout => "timeout",
            Self::Aborted(_) => "aborted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub id: ItemId,
    pub reason: FailureReason,
}

impl ItemFailure {
    pub fn new(id: ItemId, reason: FailureReason) -> Self {
        Self { id, reason }
    }
}

/// Result of one work unit. Exactly one is produced per dispatched identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkOutcome {
    Success(Item),
    Failure(ItemFailure),
}

impl WorkOutcome {
    pub fn failure(id: ItemId, reason: FailureReason) -> Self {
        Self::Failure(ItemFailure::new(id, reason))
    }

    pub fn id(&self) -> ItemId {
        match self {
            Self::Success(item) => item.id,
            Self::Failure(failure) => failure.id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every dispatched unit reported back.
    Complete,
    /// The deadline elapsed first; unreported identifiers are timeouts.
    Partial,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
        }
    }
}

/// Aggregate of one batch run. `processed` keeps arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub status: BatchStatus,
    pub processed: Vec<Item>,
    pub failures: Vec<ItemFailure>,
}

impl BatchResult {
    pub fn empty() -> Self {
        Self {
            status: BatchStatus::Complete,
            processed: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == BatchStatus::Complete
    }

    /// Number of identifiers covered by this result.
    pub fn total(&self) -> usize {
        self.processed.len() + self.failures.len()
    }

    pub fn failure_for(&self, id: ItemId) -> Option<&FailureReason> {
        self.failures
            .iter()
            .find(|failure| failure.id == id)
            .map(|failure| &failure.reason)
    }

    pub fn processed_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.processed.iter().map(|item| item.id).collect();
        ids.sort();
        ids
    }

    pub fn failed_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.failures.iter().map(|failure| failure.id).collect();
        ids.sort();
        ids
    }
}
