use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::models::*;

use super::AppState;

const DEFAULT_ACTIVITY_LIMIT: usize = 10;
const DEFAULT_POPULAR_LIMIT: usize = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(get_stats))
        .route("/dashboard/activities", get(get_activities))
        .route("/dashboard/popular-items", get(get_popular_items))
        .route("/dashboard/revenue", get(get_revenue))
}

// Dashboard reads never fail; a store error yields zeros or an empty list.

#[utoipa::path(
    get,
    path = "/dashboard/stats",
    responses(
        (status = 200, description = "Summary numbers, all zero when the store is unreachable", body = DashboardStatsResponse),
    ),
    tag = "dashboard"
)]
#[instrument(skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> Json<DashboardStatsResponse> {
    Json(state.service.dashboard_stats().await.into())
}

#[utoipa::path(
    get,
    path = "/dashboard/activities",
    params(LimitQuery),
    responses(
        (status = 200, description = "Recent activity, newest first", body = [ActivityResponse]),
    ),
    tag = "dashboard"
)]
#[instrument(skip(state))]
pub async fn get_activities(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<ActivityResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    let activities = state.service.recent_activities(limit).await;
    Json(activities.into_iter().map(Into::into).collect())
}

#[utoipa::path(
    get,
    path = "/dashboard/popular-items",
    params(LimitQuery),
    responses(
        (status = 200, description = "Menu items ranked by quantity ordered", body = [PopularItemResponse]),
    ),
    tag = "dashboard"
)]
#[instrument(skip(state))]
pub async fn get_popular_items(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<PopularItemResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT);
    let items = state.service.popular_menu_items(limit).await;
    Json(items.into_iter().map(Into::into).collect())
}

#[utoipa::path(
    get,
    path = "/dashboard/revenue",
    params(RevenueQuery),
    responses(
        (status = 200, description = "Order totals in the range, oldest first", body = [RevenuePointResponse]),
        (status = 400, description = "Start is after end", body = ApiErrorResponse),
    ),
    tag = "dashboard"
)]
#[instrument(skip(state))]
pub async fn get_revenue(
    State(state): State<AppState>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<Vec<RevenuePointResponse>>, ApiError> {
    if query.start > query.end {
        return Err(ApiError::BadRequest(
            "start must not be after end".to_string(),
        ));
    }
    let points = state.service.revenue_between(query.start, query.end).await;
    Ok(Json(points.into_iter().map(Into::into).collect()))
}
