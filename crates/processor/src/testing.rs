//! In-memory store with injectable latency and faults for processor tests.

use async_trait::async_trait;
use itemhub_core::{Item, ItemId, ItemStatus, ItemStore, NewItem, StoreError, StoreResult};
use std::collections::{BTreeMap, HashSet};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StoreCall {
    Find,
    Save,
}

#[derive(Default)]
struct Faults {
    read_delay: Duration,
    write_delay: Duration,
    failing_reads: HashSet<ItemId>,
    failing_writes: HashSet<ItemId>,
    panicking_reads: HashSet<ItemId>,
    fail_listing: bool,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    items: Mutex<BTreeMap<ItemId, Item>>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<(ItemId, StoreCall)>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

struct ActiveCall<'a>(&'a AtomicUsize);

impl Drop for ActiveCall<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryStore {
    pub(crate) fn with_pending(ids: RangeInclusive<i64>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut items = store.items.lock().unwrap();
            for id in ids {
                let item = NewItem::new(format!("Item {}", id), format!("item{}@example.com", id))
                    .into_item(ItemId(id));
                items.insert(item.id, item);
            }
        }
        Arc::new(store)
    }

    pub(crate) fn set_read_delay(&self, delay: Duration) {
        self.faults.lock().unwrap().read_delay = delay;
    }

    pub(crate) fn set_write_delay(&self, delay: Duration) {
        self.faults.lock().unwrap().write_delay = delay;
    }

    pub(crate) fn fail_reads_for(&self, id: ItemId) {
        self.faults.lock().unwrap().failing_reads.insert(id);
    }

    pub(crate) fn fail_writes_for(&self, id: ItemId) {
        self.faults.lock().unwrap().failing_writes.insert(id);
    }

    pub(crate) fn panic_on_read_for(&self, id: ItemId) {
        self.faults.lock().unwrap().panicking_reads.insert(id);
    }

    pub(crate) fn fail_listing(&self) {
        self.faults.lock().unwrap().fail_listing = true;
    }

    pub(crate) fn set_status(&self, id: ItemId, status: ItemStatus) {
        if let Some(item) = self.items.lock().unwrap().get_mut(&id) {
            item.status = status;
        }
    }

    pub(crate) fn status_of(&self, id: ItemId) -> Option<ItemStatus> {
        self.items.lock().unwrap().get(&id).map(|item| item.status)
    }

    pub(crate) fn statuses(&self) -> Vec<ItemStatus> {
        self.items
            .lock()
            .unwrap()
            .values()
            .map(|item| item.status)
            .collect()
    }

    pub(crate) fn calls(&self, id: ItemId) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(call_id, _)| *call_id == id)
            .map(|(_, call)| *call)
            .collect()
    }

    /// Highest number of store calls observed in flight at once.
    pub(crate) fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn enter(&self, id: ItemId, call: StoreCall) -> ActiveCall<'_> {
        self.calls.lock().unwrap().push((id, call));
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        ActiveCall(&self.active)
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn list_ids(&self) -> StoreResult<Vec<ItemId>> {
        if self.faults.lock().unwrap().fail_listing {
            return Err(StoreError::Unavailable("listing disabled".to_string()));
        }
        Ok(self.items.lock().unwrap().keys().copied().collect())
    }

    async fn list(&self) -> StoreResult<Vec<Item>> {
        Ok(self.items.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_id(&self, id: ItemId) -> StoreResult<Option<Item>> {
        let _active = self.enter(id, StoreCall::Find);
        let (delay, fail, panic) = {
            let faults = self.faults.lock().unwrap();
            (
                faults.read_delay,
                faults.failing_reads.contains(&id),
                faults.panicking_reads.contains(&id),
            )
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if panic {
            panic!("injected panic reading item {}", id);
        }
        if fail {
            return Err(StoreError::Backend(format!("read failed for {}", id)));
        }

        Ok(self.items.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, item: NewItem) -> StoreResult<Item> {
        let mut items = self.items.lock().unwrap();
        let id = ItemId(items.keys().last().map_or(1, |id| id.get() + 1));
        let item = item.into_item(id);
        items.insert(id, item.clone());
        Ok(item)
    }

    async fn save(&self, item: &Item) -> StoreResult<Item> {
        let _active = self.enter(item.id, StoreCall::Save);
        let (delay, fail) = {
            let faults = self.faults.lock().unwrap();
            (faults.write_delay, faults.failing_writes.contains(&item.id))
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(StoreError::Backend(format!("write failed for {}", item.id)));
        }

        self.items.lock().unwrap().insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn delete(&self, id: ItemId) -> StoreResult<bool> {
        Ok(self.items.lock().unwrap().remove(&id).is_some())
    }
}
