pub mod category;
pub mod dashboard;
pub mod menu;
pub mod order;

pub use category::router as category_router;
pub use dashboard::router as dashboard_router;
pub use menu::router as menu_router;
pub use order::router as order_router;

use std::str::FromStr;
use std::sync::Arc;

use diner_dashboard_service::{service::DashboardService, store::PgStore};
use utoipa::OpenApi;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DashboardService<PgStore>>,
}

/// Parses an enum-like field such as an order status, rejecting unknown values.
fn parse_field<T: FromStr>(field: &str, value: &str) -> Result<T, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {field}: {value}")))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        category::list_categories,
        category::create_category,
        category::update_category,
        category::delete_category,
        menu::list_menu_items,
        menu::create_menu_item,
        menu::update_menu_item,
        menu::update_availability,
        menu::delete_menu_item,
        order::list_orders,
        order::create_order,
        order::update_order_status,
        order::delete_order,
        dashboard::get_stats,
        dashboard::get_activities,
        dashboard::get_popular_items,
        dashboard::get_revenue,
    ),
    components(
        schemas(
            crate::models::CategoryResponse,
            crate::models::CategorySummary,
            crate::models::CreateCategoryRequest,
            crate::models::UpdateCategoryRequest,
            crate::models::MenuItemResponse,
            crate::models::CreateMenuItemRequest,
            crate::models::UpdateMenuItemRequest,
            crate::models::UpdateAvailabilityRequest,
            crate::models::MenuItemSummary,
            crate::models::OrderResponse,
            crate::models::OrderLineItem,
            crate::models::CreateOrderRequest,
            crate::models::OrderItemRequest,
            crate::models::UpdateOrderStatusRequest,
            crate::models::ActivityResponse,
            crate::models::PopularItemResponse,
            crate::models::DashboardStatsResponse,
            crate::models::RevenuePointResponse,
            crate::models::ApiErrorResponse
        )
    ),
    tags(
        (name = "categories", description = "Menu category management endpoints"),
        (name = "menu", description = "Menu item management endpoints"),
        (name = "orders", description = "Order management endpoints"),
        (name = "dashboard", description = "Dashboard summary endpoints")
    ),
    info(
        title = "Diner Dashboard API",
        description = "Back-office API for a restaurant dashboard",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use diner_dashboard_service::models::OrderStatus;

    #[test]
    fn test_parse_field_rejects_unknown_values() {
        assert_eq!(
            parse_field::<OrderStatus>("status", "ready").unwrap(),
            OrderStatus::Ready
        );
        let err = parse_field::<OrderStatus>("status", "lost").unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Invalid status: lost");
    }

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/categories",
            "/categories/{id}",
            "/menu-items",
            "/menu-items/{id}",
            "/menu-items/{id}/availability",
            "/orders",
            "/orders/{id}",
            "/orders/{id}/status",
            "/dashboard/stats",
            "/dashboard/activities",
            "/dashboard/popular-items",
            "/dashboard/revenue",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
