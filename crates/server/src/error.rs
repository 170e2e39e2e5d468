use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use itemhub_core::{CoreError, StoreError, ValidationErrors};
use processor::ProcessorError;
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// Rejected request body, rendered as a field -> message map.
    Validation(ValidationErrors),
    Store(StoreError),
    Processor(ProcessorError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::Validation(fields) => {
                return (StatusCode::BAD_REQUEST, Json(fields)).into_response();
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Store(err) => {
                tracing::error!(error = ?err, "Store error");
                match err {
                    StoreError::Unavailable(_) => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "store_unavailable",
                        err.to_string(),
                    ),
                    StoreError::Backend(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "store_error",
                        "Store error occurred".to_string(),
                    ),
                }
            }
            AppError::Processor(err) => {
                tracing::error!(error = ?err, "Batch dispatch failed");
                match err {
                    ProcessorError::PoolShutDown | ProcessorError::Listing(_) => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "dispatch_failed",
                        err.to_string(),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        err.to_string(),
                    ),
                }
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ProcessorError> for AppError {
    fn from(err: ProcessorError) -> Self {
        AppError::Processor(err)
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => AppError::NotFound(format!("Item not found: {}", id)),
            CoreError::Validation(fields) => AppError::Validation(fields),
        }
    }
}
