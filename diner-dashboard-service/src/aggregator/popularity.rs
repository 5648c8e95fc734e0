use std::collections::HashMap;

use bigdecimal::BigDecimal;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use super::rows_or_empty;
use crate::models::OrderedQuantity;
use crate::store::{RecordKind, RestaurantStore};

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PopularItem {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub total_quantity: i64,
}

/// Sums quantities per menu item and ranks them, keeping first-seen order among ties.
pub fn rank_by_quantity(rows: Vec<OrderedQuantity>, limit: usize) -> Vec<PopularItem> {
    let mut slots: HashMap<Uuid, usize> = HashMap::new();
    let mut items: Vec<PopularItem> = Vec::new();

    for row in rows {
        let id = row.menu_item.id;
        let slot = *slots.entry(id).or_insert_with(|| {
            items.push(PopularItem {
                id,
                name: row.menu_item.name.clone(),
                price: row.menu_item.price.clone(),
                total_quantity: 0,
            });
            items.len() - 1
        });
        items[slot].total_quantity += i64::from(row.quantity);
    }

    items.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    items.truncate(limit);
    items
}

#[instrument(skip(store))]
pub async fn popular_menu_items<S: RestaurantStore>(store: &S, limit: usize) -> Vec<PopularItem> {
    let rows = rows_or_empty(RecordKind::OrderLineItem, store.ordered_quantities().await);
    rank_by_quantity(rows, limit)
}
