use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, put},
    Router,
};
use diner_dashboard_service::models::{MenuItemUpdate, NewMenuItem};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::*;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/menu-items", get(list_menu_items).post(create_menu_item))
        .route(
            "/menu-items/{id}",
            patch(update_menu_item).delete(delete_menu_item),
        )
        .route("/menu-items/{id}/availability", put(update_availability))
}

#[utoipa::path(
    get,
    path = "/menu-items",
    responses(
        (status = 200, description = "Menu items with their category", body = [MenuItemResponse]),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn list_menu_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    let items = state.service.list_menu_items().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/menu-items",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created", body = MenuItemResponse),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 409, description = "Category does not exist", body = ApiErrorResponse),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn create_menu_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItemResponse>), ApiError> {
    let input = NewMenuItem {
        category_id: payload.category_id,
        name: payload.name,
        description: payload.description,
        price: parse_money("price", &payload.price)?,
        image_url: payload.image_url,
        is_available: payload.is_available,
    };
    let item = state.service.add_menu_item(input).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[utoipa::path(
    patch,
    path = "/menu-items/{id}",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = MenuItemResponse),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let price = payload
        .price
        .as_deref()
        .map(|price| parse_money("price", price))
        .transpose()?;
    let update = MenuItemUpdate {
        category_id: payload.category_id,
        name: payload.name,
        description: payload.description,
        price,
        image_url: payload.image_url,
        is_available: payload.is_available,
    };
    let item = state
        .service
        .update_menu_item(id, update)
        .await
        .map_err(|e| ApiError::for_resource("Menu item", e))?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    put,
    path = "/menu-items/{id}/availability",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    request_body = UpdateAvailabilityRequest,
    responses(
        (status = 200, description = "Availability changed", body = MenuItemResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn update_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let item = state
        .service
        .toggle_availability(id, payload.is_available)
        .await
        .map_err(|e| ApiError::for_resource("Menu item", e))?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    delete,
    path = "/menu-items/{id}",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    responses(
        (status = 204, description = "Menu item deleted"),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_menu_item(id)
        .await
        .map_err(|e| ApiError::for_resource("Menu item", e))?;
    Ok(StatusCode::NO_CONTENT)
}
