use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use events::Event;
use itemhub_core::{CoreError, Item, ItemId, ItemRequest};

use crate::error::AppError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/items",
    responses(
        (status = 200, description = "List of all items", body = Vec<Item>)
    ),
    tag = "items"
)]
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, AppError> {
    let items = state.item_store.list().await?;
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/api/items",
    request_body = ItemRequest,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Field -> message map of validation errors")
    ),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<ItemRequest>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let new_item = payload.into_new_item().map_err(CoreError::Validation)?;
    let created = state.item_store.insert(new_item).await?;

    tracing::info!(item_id = %created.id, "Item created");
    state.publish(Event::ItemCreated {
        item_id: created.id,
        name: created.name.clone(),
    });

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item found", body = Item),
        (status = 404, description = "Item not found")
    ),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Item>, AppError> {
    let id = ItemId(id);
    match state.item_store.find_by_id(id).await? {
        Some(item) => Ok(Json(item)),
        None => Err(not_found(id)),
    }
}

#[utoipa::path(
    put,
    path = "/api/items/{id}",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    request_body = ItemRequest,
    responses(
        (status = 200, description = "Item replaced", body = Item),
        (status = 400, description = "Field -> message map of validation errors"),
        (status = 404, description = "Item not found")
    ),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ItemRequest>,
) -> Result<Json<Item>, AppError> {
    let id = ItemId(id);
    if state.item_store.find_by_id(id).await?.is_none() {
        return Err(not_found(id));
    }

    let item = payload
        .into_new_item()
        .map_err(CoreError::Validation)?
        .into_item(id);
    let saved = state.item_store.save(&item).await?;

    tracing::info!(item_id = %id, status = saved.status.as_str(), "Item replaced");
    state.publish(Event::ItemUpdated { item_id: id });

    Ok(Json(saved))
}

#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found")
    ),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let id = ItemId(id);
    if !state.item_store.delete(id).await? {
        return Err(not_found(id));
    }

    tracing::info!(item_id = %id, "Item deleted");
    state.publish(Event::ItemDeleted { item_id: id });

    Ok(StatusCode::NO_CONTENT)
}

fn not_found(id: ItemId) -> AppError {
    CoreError::ItemNotFound(id).into()
}
