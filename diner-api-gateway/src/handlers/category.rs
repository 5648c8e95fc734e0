use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
    Router,
};
use diner_dashboard_service::models::{CategoryUpdate, NewCategory};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::*;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            patch(update_category).delete(delete_category),
        )
}

#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "All categories by name", body = [CategoryResponse]),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    tag = "categories"
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.service.list_categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
    ),
    tag = "categories"
)]
#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    let category = state
        .service
        .add_category(NewCategory {
            name: payload.name,
            description: payload.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[utoipa::path(
    patch,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ApiErrorResponse),
    ),
    tag = "categories"
)]
#[instrument(skip(state))]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let update = CategoryUpdate {
        name: payload.name,
        description: payload.description,
    };
    let category = state
        .service
        .update_category(id, update)
        .await
        .map_err(|e| ApiError::for_resource("Category", e))?;
    Ok(Json(category.into()))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ApiErrorResponse),
        (status = 409, description = "Category still has menu items", body = ApiErrorResponse),
    ),
    tag = "categories"
)]
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_category(id)
        .await
        .map_err(|e| ApiError::for_resource("Category", e))?;
    Ok(StatusCode::NO_CONTENT)
}
