use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diner_dashboard_service::aggregator::{Activity, ActivityAction, DashboardStats, PopularItem};
use diner_dashboard_service::models::{
    Category, CategoryRef, MenuItem, MenuItemRef, MenuItemWithCategory, Order, OrderDetails,
    OrderItemDetails, RevenuePoint,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;

/// Parses a decimal amount such as `"12.50"`.
pub fn parse_money(field: &str, amount: &str) -> Result<BigDecimal, ApiError> {
    amount
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("{field} must be a decimal amount")))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
}

impl From<CategoryRef> for CategorySummary {
    fn from(category: CategoryRef) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    /// Display name of the category
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    /// `null` clears the description; omit the field to keep it
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Price of the menu item (as string)
    pub price: String,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present on list responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
}

impl From<MenuItem> for MenuItemResponse {
    fn from(item: MenuItem) -> Self {
        Self {
            id: item.id,
            category_id: item.category_id,
            name: item.name,
            description: item.description,
            price: item.price.to_string(),
            image_url: item.image_url,
            is_available: item.is_available,
            created_at: item.created_at,
            updated_at: item.updated_at,
            category: None,
        }
    }
}

impl From<MenuItemWithCategory> for MenuItemResponse {
    fn from(row: MenuItemWithCategory) -> Self {
        Self {
            category: Some(row.category.into()),
            ..row.item.into()
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Price of the menu item (as string)
    pub price: String,
    pub image_url: Option<String>,
    /// Defaults to true
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub price: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAvailabilityRequest {
    pub is_available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemSummary {
    pub id: Uuid,
    pub name: String,
    pub price: String,
}

impl From<MenuItemRef> for MenuItemSummary {
    fn from(item: MenuItemRef) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineItem {
    pub id: Uuid,
    /// Null once the menu item has been deleted
    pub menu_item_id: Option<Uuid>,
    pub quantity: i32,
    /// Unit price captured when the order was placed
    pub price: String,
    pub menu_item: Option<MenuItemSummary>,
}

impl From<OrderItemDetails> for OrderLineItem {
    fn from(details: OrderItemDetails) -> Self {
        Self {
            id: details.item.id,
            menu_item_id: details.item.menu_item_id,
            quantity: details.item.quantity,
            price: details.item.price.to_string(),
            menu_item: details.menu_item.map(MenuItemSummary::from),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub total_amount: String,
    /// One of pending, preparing, ready, delivered, cancelled
    pub status: String,
    /// One of dine-in, takeaway, delivery
    pub order_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderLineItem>>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            total_amount: order.total_amount.to_string(),
            status: order.status.to_string(),
            order_type: order.order_type.to_string(),
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: None,
        }
    }
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        Self {
            items: Some(details.items.into_iter().map(OrderLineItem::from).collect()),
            ..details.order.into()
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub menu_item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    /// Defaults to pending
    pub status: Option<String>,
    /// Defaults to dine-in
    pub order_type: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityResponse {
    pub id: String,
    /// One of order, menu, category
    #[serde(rename = "type")]
    pub kind: String,
    /// Either created or updated
    pub action: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Activity> for ActivityResponse {
    fn from(activity: Activity) -> Self {
        let action = match activity.action {
            ActivityAction::Created => "created",
            ActivityAction::Updated => "updated",
        };
        Self {
            id: activity.id,
            kind: activity.kind.as_str().to_string(),
            action: action.to_string(),
            description: activity.description,
            timestamp: activity.occurred_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PopularItemResponse {
    pub id: Uuid,
    pub name: String,
    pub price: String,
    pub total_quantity: i64,
}

impl From<PopularItem> for PopularItemResponse {
    fn from(item: PopularItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price.to_string(),
            total_quantity: item.total_quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStatsResponse {
    pub total_orders: i64,
    pub total_revenue: String,
    pub pending_orders: i64,
    pub total_menu_items: i64,
    pub today_orders: i64,
    pub today_revenue: String,
}

impl From<DashboardStats> for DashboardStatsResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_orders: stats.total_orders,
            total_revenue: stats.total_revenue.to_string(),
            pending_orders: stats.pending_orders,
            total_menu_items: stats.total_menu_items,
            today_orders: stats.today_orders,
            today_revenue: stats.today_revenue.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevenuePointResponse {
    pub created_at: DateTime<Utc>,
    pub total_amount: String,
}

impl From<RevenuePoint> for RevenuePointResponse {
    fn from(point: RevenuePoint) -> Self {
        Self {
            created_at: point.created_at,
            total_amount: point.total_amount.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Maximum number of entries to return
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersQuery {
    /// Only return orders in this status
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RevenueQuery {
    /// Inclusive lower bound (RFC 3339)
    pub start: DateTime<Utc>,
    /// Inclusive upper bound (RFC 3339)
    pub end: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error message
    pub error: String,
}
