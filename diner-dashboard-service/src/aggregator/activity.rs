use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use super::rows_or_empty;
use crate::models::{Category, MenuItem, Order};
use crate::store::{RecordKind, RestaurantStore};

#[derive(Serialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Order,
    Menu,
    Category,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Order => "order",
            ActivityKind::Menu => "menu",
            ActivityKind::Category => "category",
        }
    }
}

/// Inferred from timestamps, so an update that lands within the same
/// microsecond as the insert still reads as `Created`.
#[derive(Serialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Created,
    Updated,
}

impl ActivityAction {
    pub fn classify(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        if created_at == updated_at {
            ActivityAction::Created
        } else {
            ActivityAction::Updated
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub action: ActivityAction,
    pub description: String,
    #[serde(rename = "timestamp")]
    pub occurred_at: DateTime<Utc>,
}

impl Activity {
    fn new(
        kind: ActivityKind,
        row_id: impl std::fmt::Display,
        action: ActivityAction,
        description: String,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("{}-{}", kind.as_str(), row_id),
            kind,
            action,
            description,
            occurred_at,
        }
    }
}

impl From<&Order> for Activity {
    fn from(order: &Order) -> Self {
        let action = ActivityAction::classify(order.created_at, order.updated_at);
        let customer = order.customer_name.as_deref().unwrap_or_default();
        let description = match action {
            ActivityAction::Created => {
                format!("New order from {} - ${}", customer, order.total_amount)
            }
            ActivityAction::Updated => {
                format!("Order from {} updated to {}", customer, order.status)
            }
        };
        Activity::new(
            ActivityKind::Order,
            order.id,
            action,
            description,
            order.updated_at,
        )
    }
}

impl From<&MenuItem> for Activity {
    fn from(item: &MenuItem) -> Self {
        let action = ActivityAction::classify(item.created_at, item.updated_at);
        let description = match action {
            ActivityAction::Created => format!("New menu item added: {}", item.name),
            ActivityAction::Updated => format!("Menu item updated: {}", item.name),
        };
        Activity::new(
            ActivityKind::Menu,
            item.id,
            action,
            description,
            item.updated_at,
        )
    }
}

impl From<&Category> for Activity {
    fn from(category: &Category) -> Self {
        let action = ActivityAction::classify(category.created_at, category.updated_at);
        let description = match action {
            ActivityAction::Created => format!("New category added: {}", category.name),
            ActivityAction::Updated => format!("Category updated: {}", category.name),
        };
        Activity::new(
            ActivityKind::Category,
            category.id,
            action,
            description,
            category.updated_at,
        )
    }
}

/// Merges the latest orders, menu items and categories into one feed,
/// newest first, holding at most `limit` entries.
#[instrument(skip(store))]
pub async fn recent_activities<S: RestaurantStore>(store: &S, limit: usize) -> Vec<Activity> {
    let bound = i64::try_from(limit).unwrap_or(i64::MAX);
    let (orders, menu_items, categories) = tokio::join!(
        store.recent_orders(bound),
        store.recent_menu_items(bound),
        store.recent_categories(bound),
    );

    let mut activities = Vec::new();
    activities.extend(
        rows_or_empty(RecordKind::Order, orders)
            .iter()
            .map(Activity::from),
    );
    activities.extend(
        rows_or_empty(RecordKind::MenuItem, menu_items)
            .iter()
            .map(Activity::from),
    );
    activities.extend(
        rows_or_empty(RecordKind::Category, categories)
            .iter()
            .map(Activity::from),
    );

    activities.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    activities.truncate(limit);
    activities
}
