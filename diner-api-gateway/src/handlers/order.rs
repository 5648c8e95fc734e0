use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, put},
    Router,
};
use diner_dashboard_service::models::{NewOrder, NewOrderLine, OrderStatus, OrderType};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::*;

use super::{parse_field, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", delete(delete_order))
        .route("/orders/{id}/status", put(update_order_status))
}

#[utoipa::path(
    get,
    path = "/orders",
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "Orders with line items, newest first", body = [OrderResponse]),
        (status = 400, description = "Unknown status", body = ApiErrorResponse),
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| parse_field::<OrderStatus>("status", s))
        .transpose()?;
    let orders = state.service.list_orders(status).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 409, description = "Menu item is not available", body = ApiErrorResponse),
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    if payload.items.iter().any(|line| line.quantity <= 0) {
        return Err(ApiError::BadRequest(
            "quantity must be positive".to_string(),
        ));
    }
    let input = NewOrder {
        customer_name: payload.customer_name,
        customer_phone: payload.customer_phone,
        status: payload
            .status
            .as_deref()
            .map(|s| parse_field::<OrderStatus>("status", s))
            .transpose()?,
        order_type: payload
            .order_type
            .as_deref()
            .map(|t| parse_field::<OrderType>("order type", t))
            .transpose()?,
        items: payload
            .items
            .into_iter()
            .map(|line| NewOrderLine {
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
            })
            .collect(),
    };
    let order = state.service.create_order(input).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderResponse),
        (status = 400, description = "Unknown status", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let status = parse_field::<OrderStatus>("status", &payload.status)?;
    let order = state
        .service
        .update_order_status(id, status)
        .await
        .map_err(|e| ApiError::for_resource("Order", e))?;
    Ok(Json(order.into()))
}

#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order and its line items deleted"),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_order(id)
        .await
        .map_err(|e| ApiError::for_resource("Order", e))?;
    Ok(StatusCode::NO_CONTENT)
}
