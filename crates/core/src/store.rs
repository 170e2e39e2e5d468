use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Item, ItemId, NewItem};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence port for items.
///
/// Implementations must be safe to call concurrently; the batch processor
/// issues independent calls for different identifiers from many tasks.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Identifiers of every stored item, in ascending order.
    async fn list_ids(&self) -> StoreResult<Vec<ItemId>>;

    async fn list(&self) -> StoreResult<Vec<Item>>;

    async fn find_by_id(&self, id: ItemId) -> StoreResult<Option<Item>>;

    /// Inserts a new item and returns it with its assigned identifier.
    async fn insert(&self, item: NewItem) -> StoreResult<Item>;

    /// Inserts or replaces the item stored under `item.id`.
    async fn save(&self, item: &Item) -> StoreResult<Item>;

    /// Returns `false` when nothing was stored under `id`.
    async fn delete(&self, id: ItemId) -> StoreResult<bool>;
}
