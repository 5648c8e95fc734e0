use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{OrderFilter, RecordKind, RestaurantStore, StoreError};
use crate::models::{
    Category, CategoryChanges, CategoryRef, MenuItem, MenuItemChanges, MenuItemRef,
    MenuItemWithCategory, Order, OrderChanges, OrderDetails, OrderItem, OrderItemDetails,
    OrderStatus, OrderedQuantity, RevenuePoint,
};

#[derive(Default)]
struct Tables {
    categories: Vec<Category>,
    menu_items: Vec<MenuItem>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
}

/// In-process store with the same ordering and referential rules as [`super::PgStore`].
///
/// Reads and writes touching a kind registered with [`MemoryStore::fail_on`] return
/// [`StoreError::Unavailable`].
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: Mutex<HashSet<RecordKind>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, kind: RecordKind) {
        lock(&self.failing).insert(kind);
    }

    pub fn recover(&self, kind: RecordKind) {
        lock(&self.failing).remove(&kind);
    }

    fn check(&self, kinds: &[RecordKind]) -> Result<(), StoreError> {
        let failing = lock(&self.failing);
        match kinds.iter().find(|kind| failing.contains(*kind)) {
            Some(kind) => Err(StoreError::Unavailable(*kind)),
            None => Ok(()),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        lock(&self.tables)
    }
}

fn check_price(price: &BigDecimal) -> Result<(), StoreError> {
    if *price < BigDecimal::from(0) {
        return Err(StoreError::Constraint("menu_items_price_check".to_string()));
    }
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

fn menu_item_ref(item: &MenuItem) -> MenuItemRef {
    MenuItemRef {
        id: item.id,
        name: item.name.clone(),
        price: item.price.clone(),
    }
}

fn most_recent<T: Clone>(
    rows: &[T],
    limit: i64,
    key: impl Fn(&T) -> (DateTime<Utc>, Uuid),
) -> Vec<T> {
    let mut rows = rows.to_vec();
    rows.sort_by_key(|row| {
        let (updated_at, id) = key(row);
        (Reverse(updated_at), id)
    });
    rows.truncate(take(limit));
    rows
}

impl RestaurantStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.check(&[RecordKind::Category])?;
        let mut results = self.tables().categories.clone();
        results.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(results)
    }

    async fn recent_categories(&self, limit: i64) -> Result<Vec<Category>, StoreError> {
        self.check(&[RecordKind::Category])?;
        Ok(most_recent(&self.tables().categories, limit, |c| {
            (c.updated_at, c.id)
        }))
    }

    async fn insert_category(&self, category: Category) -> Result<Category, StoreError> {
        self.check(&[RecordKind::Category])?;
        self.tables().categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: Uuid,
        changes: CategoryChanges,
    ) -> Result<Category, StoreError> {
        self.check(&[RecordKind::Category])?;
        let mut tables = self.tables();
        let category = tables
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(name) = changes.name {
            category.name = name;
        }
        if let Some(description) = changes.description {
            category.description = description;
        }
        category.updated_at = changes.updated_at;
        Ok(category.clone())
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), StoreError> {
        self.check(&[RecordKind::Category])?;
        let mut tables = self.tables();
        if tables.menu_items.iter().any(|i| i.category_id == id) {
            return Err(StoreError::ForeignKey(RecordKind::MenuItem.to_string()));
        }
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        if tables.categories.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_menu_items(&self) -> Result<Vec<MenuItemWithCategory>, StoreError> {
        self.check(&[RecordKind::MenuItem, RecordKind::Category])?;
        let tables = self.tables();
        let mut items = tables.menu_items.clone();
        items.sort_by_key(|i| (Reverse(i.created_at), i.id));
        Ok(items
            .into_iter()
            .filter_map(|item| {
                let category = tables
                    .categories
                    .iter()
                    .find(|c| c.id == item.category_id)?;
                Some(MenuItemWithCategory {
                    category: CategoryRef {
                        id: category.id,
                        name: category.name.clone(),
                    },
                    item,
                })
            })
            .collect())
    }

    async fn find_menu_items(&self, ids: Vec<Uuid>) -> Result<Vec<MenuItem>, StoreError> {
        self.check(&[RecordKind::MenuItem])?;
        Ok(self
            .tables()
            .menu_items
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect())
    }

    async fn recent_menu_items(&self, limit: i64) -> Result<Vec<MenuItem>, StoreError> {
        self.check(&[RecordKind::MenuItem])?;
        Ok(most_recent(&self.tables().menu_items, limit, |i| {
            (i.updated_at, i.id)
        }))
    }

    async fn count_menu_items(&self) -> Result<i64, StoreError> {
        self.check(&[RecordKind::MenuItem])?;
        Ok(self.tables().menu_items.len() as i64)
    }

    async fn insert_menu_item(&self, item: MenuItem) -> Result<MenuItem, StoreError> {
        self.check(&[RecordKind::MenuItem])?;
        check_price(&item.price)?;
        let mut tables = self.tables();
        if !tables.categories.iter().any(|c| c.id == item.category_id) {
            return Err(StoreError::ForeignKey(RecordKind::MenuItem.to_string()));
        }
        tables.menu_items.push(item.clone());
        Ok(item)
    }

    async fn update_menu_item(
        &self,
        id: Uuid,
        changes: MenuItemChanges,
    ) -> Result<MenuItem, StoreError> {
        self.check(&[RecordKind::MenuItem])?;
        if let Some(price) = &changes.price {
            check_price(price)?;
        }
        let mut tables = self.tables();
        if let Some(category_id) = changes.category_id {
            if !tables.categories.iter().any(|c| c.id == category_id) {
                return Err(StoreError::ForeignKey(RecordKind::MenuItem.to_string()));
            }
        }
        let item = tables
            .menu_items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(category_id) = changes.category_id {
            item.category_id = category_id;
        }
        if let Some(name) = changes.name {
            item.name = name;
        }
        if let Some(description) = changes.description {
            item.description = description;
        }
        if let Some(price) = changes.price {
            item.price = price;
        }
        if let Some(image_url) = changes.image_url {
            item.image_url = image_url;
        }
        if let Some(is_available) = changes.is_available {
            item.is_available = is_available;
        }
        item.updated_at = changes.updated_at;
        Ok(item.clone())
    }

    async fn delete_menu_item(&self, id: Uuid) -> Result<(), StoreError> {
        self.check(&[RecordKind::MenuItem])?;
        let mut tables = self.tables();
        let before = tables.menu_items.len();
        tables.menu_items.retain(|i| i.id != id);
        if tables.menu_items.len() == before {
            return Err(StoreError::NotFound);
        }
        // ON DELETE SET NULL
        for line in tables
            .order_items
            .iter_mut()
            .filter(|l| l.menu_item_id == Some(id))
        {
            line.menu_item_id = None;
        }
        Ok(())
    }

    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, StoreError> {
        self.check(&[RecordKind::Order, RecordKind::OrderLineItem])?;
        let tables = self.tables();
        let filter = OrderFilter {
            status,
            ..Default::default()
        };
        let mut orders = tables
            .orders
            .iter()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect::<Vec<_>>();
        orders.sort_by_key(|o| (Reverse(o.created_at), o.id));

        let mut line_items = tables.order_items.clone();
        line_items.sort_by_key(|l| (l.created_at, l.id));

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = line_items
                    .iter()
                    .filter(|l| l.order_id == order.id)
                    .map(|l| OrderItemDetails {
                        item: l.clone(),
                        menu_item: l.menu_item_id.and_then(|menu_item_id| {
                            tables
                                .menu_items
                                .iter()
                                .find(|i| i.id == menu_item_id)
                                .map(menu_item_ref)
                        }),
                    })
                    .collect();
                OrderDetails { order, items }
            })
            .collect())
    }

    async fn recent_orders(&self, limit: i64) -> Result<Vec<Order>, StoreError> {
        self.check(&[RecordKind::Order])?;
        Ok(most_recent(&self.tables().orders, limit, |o| {
            (o.updated_at, o.id)
        }))
    }

    async fn count_orders(&self, filter: OrderFilter) -> Result<i64, StoreError> {
        self.check(&[RecordKind::Order])?;
        Ok(self
            .tables()
            .orders
            .iter()
            .filter(|o| filter.matches(o))
            .count() as i64)
    }

    async fn order_totals(&self, filter: OrderFilter) -> Result<Vec<BigDecimal>, StoreError> {
        self.check(&[RecordKind::Order])?;
        Ok(self
            .tables()
            .orders
            .iter()
            .filter(|o| filter.matches(o))
            .map(|o| o.total_amount.clone())
            .collect())
    }

    async fn revenue_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RevenuePoint>, StoreError> {
        self.check(&[RecordKind::Order])?;
        let mut orders = self
            .tables()
            .orders
            .iter()
            .filter(|o| o.created_at >= start && o.created_at <= end)
            .cloned()
            .collect::<Vec<_>>();
        orders.sort_by_key(|o| (o.created_at, o.id));
        Ok(orders
            .into_iter()
            .map(|o| RevenuePoint {
                created_at: o.created_at,
                total_amount: o.total_amount,
            })
            .collect())
    }

    async fn insert_order(&self, order: Order, items: Vec<OrderItem>) -> Result<Order, StoreError> {
        self.check(&[RecordKind::Order, RecordKind::OrderLineItem])?;
        if items.iter().any(|l| l.quantity <= 0) {
            return Err(StoreError::Constraint(
                "order_items_quantity_check".to_string(),
            ));
        }
        let mut tables = self.tables();
        let dangling = items.iter().any(|l| {
            l.menu_item_id
                .is_some_and(|id| !tables.menu_items.iter().any(|i| i.id == id))
        });
        if dangling {
            return Err(StoreError::ForeignKey(
                RecordKind::OrderLineItem.to_string(),
            ));
        }
        tables.orders.push(order.clone());
        tables.order_items.extend(items);
        Ok(order)
    }

    async fn update_order(&self, id: Uuid, changes: OrderChanges) -> Result<Order, StoreError> {
        self.check(&[RecordKind::Order])?;
        let mut tables = self.tables();
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(status) = changes.status {
            order.status = status;
        }
        order.updated_at = changes.updated_at;
        Ok(order.clone())
    }

    async fn delete_order(&self, id: Uuid) -> Result<(), StoreError> {
        self.check(&[RecordKind::Order])?;
        let mut tables = self.tables();
        let before = tables.orders.len();
        tables.orders.retain(|o| o.id != id);
        if tables.orders.len() == before {
            return Err(StoreError::NotFound);
        }
        tables.order_items.retain(|l| l.order_id != id);
        Ok(())
    }

    async fn ordered_quantities(&self) -> Result<Vec<OrderedQuantity>, StoreError> {
        self.check(&[RecordKind::OrderLineItem, RecordKind::MenuItem])?;
        let tables = self.tables();
        let mut line_items = tables.order_items.clone();
        line_items.sort_by_key(|l| (l.created_at, l.id));
        Ok(line_items
            .iter()
            .filter_map(|l| {
                let menu_item = tables.menu_items.iter().find(|i| Some(i.id) == l.menu_item_id)?;
                Some(OrderedQuantity {
                    quantity: l.quantity,
                    menu_item: menu_item_ref(menu_item),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn category(name: &str, created: u32, updated: u32) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            created_at: at(created),
            updated_at: at(updated),
        }
    }

    #[tokio::test]
    async fn test_recent_categories_are_newest_first_and_bounded() {
        let store = MemoryStore::new();
        store.insert_category(category("Drinks", 1, 1)).await.unwrap();
        store.insert_category(category("Mains", 1, 3)).await.unwrap();
        store.insert_category(category("Sides", 2, 2)).await.unwrap();

        let recent = store.recent_categories(2).await.unwrap();
        let names = recent.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Mains", "Sides"]);

        assert!(store.recent_categories(0).await.unwrap().is_empty());
        assert!(store.recent_categories(-1).await.unwrap().is_empty());
    }

    fn menu_item(category_id: Uuid, price: &str) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            category_id,
            name: "Lemonade".to_string(),
            description: None,
            price: price.parse().unwrap(),
            image_url: None,
            is_available: true,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    #[tokio::test]
    async fn test_delete_category_with_menu_items_is_rejected() {
        let store = MemoryStore::new();
        let drinks = store.insert_category(category("Drinks", 1, 1)).await.unwrap();
        store
            .insert_menu_item(menu_item(drinks.id, "3.50"))
            .await
            .unwrap();

        let result = store.delete_category(drinks.id).await;
        assert!(matches!(result, Err(StoreError::ForeignKey(_))));
        assert_eq!(store.list_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_rows_report_not_found() {
        let store = MemoryStore::new();
        let changes = OrderChanges {
            status: Some(OrderStatus::Ready),
            updated_at: at(2),
        };
        assert!(matches!(
            store.update_order(Uuid::new_v4(), changes).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.delete_menu_item(Uuid::new_v4()).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_fail_on_only_affects_registered_kind() {
        let store = MemoryStore::new();
        store.fail_on(RecordKind::Order);

        assert!(matches!(
            store.recent_orders(10).await,
            Err(StoreError::Unavailable(RecordKind::Order))
        ));
        assert!(store.recent_categories(10).await.is_ok());

        store.recover(RecordKind::Order);
        assert!(store.recent_orders(10).await.is_ok());
    }

    #[tokio::test]
    async fn test_negative_price_is_rejected() {
        let store = MemoryStore::new();
        let drinks = store.insert_category(category("Drinks", 1, 1)).await.unwrap();

        assert!(matches!(
            store.insert_menu_item(menu_item(drinks.id, "-1")).await,
            Err(StoreError::Constraint(_))
        ));
        assert_eq!(store.count_menu_items().await.unwrap(), 0);

        let lemonade = store
            .insert_menu_item(menu_item(drinks.id, "0"))
            .await
            .unwrap();
        let changes = MenuItemChanges {
            category_id: None,
            name: None,
            description: None,
            price: Some("-0.01".parse().unwrap()),
            image_url: None,
            is_available: None,
            updated_at: at(2),
        };
        assert!(matches!(
            store.update_menu_item(lemonade.id, changes).await,
            Err(StoreError::Constraint(_))
        ));
        let stored = store.find_menu_items(vec![lemonade.id]).await.unwrap();
        assert_eq!(stored[0].price, BigDecimal::from(0));
    }

    #[tokio::test]
    async fn test_non_positive_quantity_is_rejected() {
        let store = MemoryStore::new();
        let drinks = store.insert_category(category("Drinks", 1, 1)).await.unwrap();
        let lemonade = store
            .insert_menu_item(menu_item(drinks.id, "3.50"))
            .await
            .unwrap();
        let order_id = Uuid::new_v4();
        let order = Order {
            id: order_id,
            customer_name: None,
            customer_phone: None,
            total_amount: BigDecimal::from(0),
            status: OrderStatus::Pending,
            order_type: crate::models::OrderType::DineIn,
            created_at: at(1),
            updated_at: at(1),
        };
        let line = OrderItem {
            id: Uuid::new_v4(),
            order_id,
            menu_item_id: Some(lemonade.id),
            quantity: 0,
            price: lemonade.price.clone(),
            created_at: at(1),
        };

        assert!(matches!(
            store.insert_order(order, vec![line]).await,
            Err(StoreError::Constraint(_))
        ));
        assert!(store.recent_orders(10).await.unwrap().is_empty());
    }
}
