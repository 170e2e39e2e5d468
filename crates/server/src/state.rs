use db::ItemRepository;
use events::{Event, EventBus};
use itemhub_core::ItemStore;
use processor::{BatchCoordinator, ProcessorConfig, ProcessorError, WorkerPool};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub item_store: Arc<dyn ItemStore>,
    pub coordinator: BatchCoordinator,
    pub event_bus: EventBus,
}

impl AppState {
    /// Builds the state on top of a migrated SQLite pool. Must be called
    /// from within a tokio runtime, which hosts the worker pool.
    pub fn new(pool: SqlitePool, config: &ProcessorConfig) -> Result<Self, ProcessorError> {
        let store: Arc<dyn ItemStore> = Arc::new(ItemRepository::new(pool));
        let workers = Arc::new(WorkerPool::from_config(config)?);
        Ok(Self::with_store(store, workers, config))
    }

    pub fn with_store(
        store: Arc<dyn ItemStore>,
        workers: Arc<WorkerPool>,
        config: &ProcessorConfig,
    ) -> Self {
        let coordinator = BatchCoordinator::new(Arc::clone(&store), workers)
            .with_default_timeout(config.batch_timeout);

        tracing::info!(
            workers = coordinator.pool().size(),
            batch_timeout_ms = ?config.batch_timeout.map(|t| t.as_millis()),
            "Application state ready"
        );

        Self {
            item_store: store,
            coordinator,
            event_bus: EventBus::new(),
        }
    }

    pub fn publish(&self, event: Event) {
        self.event_bus.publish(event);
    }

    /// Stops the worker pool. Later batch requests fail with 503.
    pub fn shutdown(&self) {
        self.coordinator.pool().shutdown();
    }
}
