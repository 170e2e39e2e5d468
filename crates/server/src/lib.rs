pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Itemhub API",
        version = "0.1.0",
        description = "Item management with concurrent batch processing"
    ),
    paths(
        routes::health_check,
        routes::list_items,
        routes::create_item,
        routes::get_item,
        routes::update_item,
        routes::delete_item,
        routes::process_items,
        routes::events_stream,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::BatchResponse,
        routes::BatchStatusDto,
        routes::FailureDto,
        routes::ProcessQuery,
        itemhub_core::Item,
        itemhub_core::ItemId,
        itemhub_core::ItemStatus,
        itemhub_core::ItemRequest,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "items", description = "Item management and batch processing"),
        (name = "events", description = "Real-time item and batch events (SSE)"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/openapi.json", get(openapi_json))
        .route(
            "/api/items",
            get(routes::list_items).post(routes::create_item),
        )
        .route("/api/items/process", get(routes::process_items))
        .route("/api/events", get(routes::events_stream))
        .route(
            "/api/items/{id}",
            get(routes::get_item)
                .put(routes::update_item)
                .delete(routes::delete_item),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
