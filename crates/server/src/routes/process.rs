use axum::extract::{Query, State};
use axum::Json;
use events::Event;
use itemhub_core::{Item, ItemId};
use processor::{BatchResult, BatchStatus, ItemFailure};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProcessQuery {
    /// Overrides the configured batch deadline.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatusDto {
    Complete,
    Partial,
}

impl From<BatchStatus> for BatchStatusDto {
    fn from(status: BatchStatus) -> Self {
        match status {
            BatchStatus::Complete => Self::Complete,
            BatchStatus::Partial => Self::Partial,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FailureDto {
    pub id: ItemId,
    /// One of `not_found`, `store_error`, `timeout`, `aborted`.
    pub reason: String,
    pub message: String,
}

impl From<ItemFailure> for FailureDto {
    fn from(failure: ItemFailure) -> Self {
        Self {
            id: failure.id,
            reason: failure.reason.kind().to_string(),
            message: failure.reason.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchResponse {
    pub status: BatchStatusDto,
    pub processed: Vec<Item>,
    pub failures: Vec<FailureDto>,
}

impl From<BatchResult> for BatchResponse {
    fn from(result: BatchResult) -> Self {
        Self {
            status: result.status.into(),
            processed: result.processed,
            failures: result.failures.into_iter().map(FailureDto::from).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/items/process",
    params(
        ("timeout_ms" = Option<u64>, Query, description = "Batch deadline in milliseconds")
    ),
    responses(
        (status = 200, description = "Batch finished, possibly with per-item failures", body = BatchResponse),
        (status = 503, description = "Batch could not be dispatched")
    ),
    tag = "items"
)]
pub async fn process_items(
    State(state): State<AppState>,
    Query(query): Query<ProcessQuery>,
) -> Result<Json<BatchResponse>, AppError> {
    let started = Instant::now();
    let deadline = state
        .coordinator
        .deadline_for(query.timeout_ms.map(Duration::from_millis));

    let result = state.coordinator.process_all(deadline).await?;

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    state.publish(Event::BatchCompleted {
        processed: result.processed.len(),
        failed: result.failures.len(),
        partial: !result.is_complete(),
        duration_ms,
    });

    Ok(Json(result.into()))
}
