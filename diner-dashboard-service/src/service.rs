use bigdecimal::BigDecimal;
use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::aggregator::{self, Activity, DashboardStats, PopularItem};
use crate::models::{
    Category, CategoryChanges, CategoryUpdate, MenuItem, MenuItemChanges, MenuItemUpdate,
    MenuItemWithCategory, NewCategory, NewMenuItem, NewOrder, Order, OrderChanges, OrderDetails,
    OrderItem, OrderStatus, OrderType, RevenuePoint,
};
use crate::store::{RestaurantStore, StoreError};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("menu item {0} does not exist")]
    UnknownMenuItem(Uuid),
    #[error("menu item {0} is not available")]
    UnavailableMenuItem(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Timestamps are kept at the store's microsecond precision so that a freshly
/// inserted row compares equal on `created_at` and `updated_at` after a round trip.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Σ price × quantity, fixed at creation time.
pub fn order_total(items: &[OrderItem]) -> BigDecimal {
    items
        .iter()
        .map(|i| &i.price * BigDecimal::from(i.quantity))
        .sum()
}

pub struct DashboardService<S> {
    store: S,
}

impl<S: RestaurantStore> DashboardService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, DashboardError> {
        let categories = self
            .store
            .list_categories()
            .await
            .inspect_err(|err| error!(error = %err, "Error fetching categories"))?;
        Ok(categories)
    }

    #[instrument(skip(self))]
    pub async fn add_category(&self, input: NewCategory) -> Result<Category, DashboardError> {
        let now = now();
        let category = Category {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        };
        let created = self
            .store
            .insert_category(category)
            .await
            .inspect_err(|err| error!(error = %err, "Error adding category"))?;
        info!(id = %created.id, "category added");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: Uuid,
        update: CategoryUpdate,
    ) -> Result<Category, DashboardError> {
        let changes = CategoryChanges {
            name: update.name,
            description: update.description,
            updated_at: now(),
        };
        let updated = self
            .store
            .update_category(id, changes)
            .await
            .inspect_err(|err| error!(error = %err, "Error updating category"))?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), DashboardError> {
        self.store
            .delete_category(id)
            .await
            .inspect_err(|err| error!(error = %err, "Error deleting category"))?;
        info!(%id, "category deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_menu_items(&self) -> Result<Vec<MenuItemWithCategory>, DashboardError> {
        let items = self
            .store
            .list_menu_items()
            .await
            .inspect_err(|err| error!(error = %err, "Error fetching menu items"))?;
        Ok(items)
    }

    #[instrument(skip(self))]
    pub async fn add_menu_item(&self, input: NewMenuItem) -> Result<MenuItem, DashboardError> {
        let now = now();
        let item = MenuItem {
            id: Uuid::new_v4(),
            category_id: input.category_id,
            name: input.name,
            description: input.description,
            price: input.price,
            image_url: input.image_url,
            is_available: input.is_available.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        let created = self
            .store
            .insert_menu_item(item)
            .await
            .inspect_err(|err| error!(error = %err, "Error adding menu item"))?;
        info!(id = %created.id, "menu item added");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_menu_item(
        &self,
        id: Uuid,
        update: MenuItemUpdate,
    ) -> Result<MenuItem, DashboardError> {
        let changes = MenuItemChanges {
            category_id: update.category_id,
            name: update.name,
            description: update.description,
            price: update.price,
            image_url: update.image_url,
            is_available: update.is_available,
            updated_at: now(),
        };
        let updated = self
            .store
            .update_menu_item(id, changes)
            .await
            .inspect_err(|err| error!(error = %err, "Error updating menu item"))?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn toggle_availability(
        &self,
        id: Uuid,
        is_available: bool,
    ) -> Result<MenuItem, DashboardError> {
        let update = MenuItemUpdate {
            is_available: Some(is_available),
            ..Default::default()
        };
        self.update_menu_item(id, update).await
    }

    #[instrument(skip(self))]
    pub async fn delete_menu_item(&self, id: Uuid) -> Result<(), DashboardError> {
        self.store
            .delete_menu_item(id)
            .await
            .inspect_err(|err| error!(error = %err, "Error deleting menu item"))?;
        info!(%id, "menu item deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, DashboardError> {
        let orders = self
            .store
            .list_orders(status)
            .await
            .inspect_err(|err| error!(error = %err, "Error fetching orders"))?;
        Ok(orders)
    }

    /// Line prices are copied from the menu as it stands now; the total is
    /// computed once here and never reconciled afterwards.
    #[instrument(skip(self, input), fields(lines = input.items.len()))]
    pub async fn create_order(&self, input: NewOrder) -> Result<Order, DashboardError> {
        let menu_item_ids = input.items.iter().map(|l| l.menu_item_id).collect();
        let menu = self
            .store
            .find_menu_items(menu_item_ids)
            .await
            .inspect_err(|err| error!(error = %err, "Error resolving order menu items"))?;

        let now = now();
        let order_id = Uuid::new_v4();
        let items = input
            .items
            .into_iter()
            .map(|line| {
                let menu_item = menu
                    .iter()
                    .find(|m| m.id == line.menu_item_id)
                    .ok_or(DashboardError::UnknownMenuItem(line.menu_item_id))?;
                if !menu_item.is_available {
                    return Err(DashboardError::UnavailableMenuItem(menu_item.id));
                }
                Ok(OrderItem {
                    id: Uuid::new_v4(),
                    order_id,
                    menu_item_id: Some(menu_item.id),
                    quantity: line.quantity,
                    price: menu_item.price.clone(),
                    created_at: now,
                })
            })
            .collect::<Result<Vec<_>, DashboardError>>()?;

        let order = Order {
            id: order_id,
            customer_name: input.customer_name,
            customer_phone: input.customer_phone,
            total_amount: order_total(&items),
            status: input.status.unwrap_or(OrderStatus::Pending),
            order_type: input.order_type.unwrap_or(OrderType::DineIn),
            created_at: now,
            updated_at: now,
        };

        let created = self
            .store
            .insert_order(order, items)
            .await
            .inspect_err(|err| error!(error = %err, "Error creating order"))?;
        info!(id = %created.id, total = %created.total_amount, "order created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, DashboardError> {
        let changes = OrderChanges {
            status: Some(status),
            updated_at: now(),
        };
        let updated = self
            .store
            .update_order(id, changes)
            .await
            .inspect_err(|err| error!(error = %err, "Error updating order status"))?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: Uuid) -> Result<(), DashboardError> {
        self.store
            .delete_order(id)
            .await
            .inspect_err(|err| error!(error = %err, "Error deleting order"))?;
        info!(%id, "order deleted");
        Ok(())
    }

    pub async fn recent_activities(&self, limit: usize) -> Vec<Activity> {
        aggregator::recent_activities(&self.store, limit).await
    }

    pub async fn popular_menu_items(&self, limit: usize) -> Vec<PopularItem> {
        aggregator::popular_menu_items(&self.store, limit).await
    }

    pub async fn dashboard_stats(&self) -> DashboardStats {
        aggregator::dashboard_stats(&self.store).await
    }

    pub async fn revenue_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<RevenuePoint> {
        aggregator::revenue_between(&self.store, start, end).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewOrderLine;
    use crate::store::{MemoryStore, RecordKind};
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing::instrument::WithSubscriber;
    use tracing_subscriber::fmt::format::FmtSpan;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn price(amount: &str) -> BigDecimal {
        amount.parse().unwrap()
    }

    async fn service_with_menu() -> (DashboardService<MemoryStore>, MenuItem, MenuItem) {
        let service = DashboardService::new(MemoryStore::new());
        let mains = service
            .add_category(NewCategory {
                name: "Mains".to_string(),
                description: Some("Hot food".to_string()),
            })
            .await
            .unwrap();
        let burger = service
            .add_menu_item(NewMenuItem {
                category_id: mains.id,
                name: "Burger".to_string(),
                description: None,
                price: price("8.50"),
                image_url: None,
                is_available: None,
            })
            .await
            .unwrap();
        let fries = service
            .add_menu_item(NewMenuItem {
                category_id: mains.id,
                name: "Fries".to_string(),
                description: None,
                price: price("3.00"),
                image_url: None,
                is_available: Some(false),
            })
            .await
            .unwrap();
        (service, burger, fries)
    }

    fn line(item: &MenuItem, quantity: i32) -> NewOrderLine {
        NewOrderLine {
            menu_item_id: item.id,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_inserted_rows_read_as_created() {
        let (_service, burger, fries) = service_with_menu().await;
        assert_eq!(burger.created_at, burger.updated_at);
        assert!(burger.is_available);
        assert!(!fries.is_available);
    }

    fn order_for(items: Vec<NewOrderLine>) -> NewOrder {
        NewOrder {
            customer_name: Some("Ada".to_string()),
            customer_phone: None,
            status: None,
            order_type: None,
            items,
        }
    }

    #[tokio::test]
    async fn test_create_order_rejects_unavailable_menu_item() {
        let (service, burger, fries) = service_with_menu().await;

        let result = service
            .create_order(order_for(vec![line(&burger, 1), line(&fries, 1)]))
            .await;

        assert!(matches!(result, Err(DashboardError::UnavailableMenuItem(id)) if id == fries.id));
        assert!(service.list_orders(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_computes_total_from_menu_prices() {
        let (service, burger, fries) = service_with_menu().await;
        service.toggle_availability(fries.id, true).await.unwrap();

        let order = service
            .create_order(order_for(vec![line(&burger, 2), line(&fries, 3)]))
            .await
            .unwrap();

        assert_eq!(order.total_amount, price("26.00"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_type, OrderType::DineIn);
        assert_eq!(order.created_at, order.updated_at);

        let orders = service.list_orders(None).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].items.len(), 2);
        assert!(orders[0]
            .items
            .iter()
            .all(|l| l.menu_item.as_ref().is_some_and(|m| m.price == l.item.price)));
    }

    #[tokio::test]
    async fn test_price_changes_do_not_touch_past_orders() {
        let (service, burger, _) = service_with_menu().await;
        let order = service
            .create_order(NewOrder {
                customer_name: None,
                customer_phone: None,
                status: None,
                order_type: Some(OrderType::Delivery),
                items: vec![line(&burger, 1)],
            })
            .await
            .unwrap();

        service
            .update_menu_item(
                burger.id,
                MenuItemUpdate {
                    price: Some(price("12.00")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let orders = service.list_orders(None).await.unwrap();
        assert_eq!(orders[0].order.total_amount, order.total_amount);
        assert_eq!(orders[0].items[0].item.price, price("8.50"));
    }

    #[tokio::test]
    async fn test_create_order_rejects_unknown_menu_item() {
        let (service, burger, _) = service_with_menu().await;
        let missing = Uuid::new_v4();

        let result = service
            .create_order(NewOrder {
                customer_name: None,
                customer_phone: None,
                status: None,
                order_type: None,
                items: vec![
                    line(&burger, 1),
                    NewOrderLine {
                        menu_item_id: missing,
                        quantity: 1,
                    },
                ],
            })
            .await;

        assert!(matches!(result, Err(DashboardError::UnknownMenuItem(id)) if id == missing));
        assert!(service.list_orders(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_updates_refresh_updated_at() {
        let (service, burger, _) = service_with_menu().await;
        tokio::time::sleep(Duration::from_millis(2)).await;

        let toggled = service.toggle_availability(burger.id, false).await.unwrap();
        assert!(!toggled.is_available);
        assert!(toggled.updated_at > toggled.created_at);

        let categories = service.list_categories().await.unwrap();
        let renamed = service
            .update_category(
                categories[0].id,
                CategoryUpdate {
                    name: Some("Grill".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Grill");
        assert_eq!(renamed.description.as_deref(), Some("Hot food"));
        assert!(renamed.updated_at > renamed.created_at);
    }

    #[tokio::test]
    async fn test_status_updates_and_filtering() {
        let (service, burger, _) = service_with_menu().await;
        let order = service
            .create_order(NewOrder {
                customer_name: Some("Grace".to_string()),
                customer_phone: Some("555-0101".to_string()),
                status: None,
                order_type: None,
                items: vec![line(&burger, 1)],
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;

        let ready = service
            .update_order_status(order.id, OrderStatus::Ready)
            .await
            .unwrap();
        assert_eq!(ready.status, OrderStatus::Ready);

        assert_eq!(
            service
                .list_orders(Some(OrderStatus::Ready))
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(service
            .list_orders(Some(OrderStatus::Pending))
            .await
            .unwrap()
            .is_empty());

        let feed = service.recent_activities(10).await;
        assert_eq!(feed[0].description, "Order from Grace updated to ready");
    }

    #[tokio::test]
    async fn test_delete_order_removes_line_items_from_popularity() {
        let (service, burger, fries) = service_with_menu().await;
        service.toggle_availability(fries.id, true).await.unwrap();
        let first = service
            .create_order(NewOrder {
                customer_name: None,
                customer_phone: None,
                status: None,
                order_type: None,
                items: vec![line(&burger, 3)],
            })
            .await
            .unwrap();
        service
            .create_order(NewOrder {
                customer_name: None,
                customer_phone: None,
                status: None,
                order_type: None,
                items: vec![line(&burger, 4), line(&fries, 1)],
            })
            .await
            .unwrap();

        let popular = service.popular_menu_items(5).await;
        assert_eq!(popular[0].name, "Burger");
        assert_eq!(popular[0].total_quantity, 7);
        assert_eq!(popular[1].total_quantity, 1);

        service.delete_order(first.id).await.unwrap();
        let popular = service.popular_menu_items(5).await;
        assert_eq!(popular[0].total_quantity, 4);
    }

    #[tokio::test]
    async fn test_deleted_menu_item_leaves_order_history_unranked() {
        let (service, burger, fries) = service_with_menu().await;
        service.toggle_availability(fries.id, true).await.unwrap();
        service
            .create_order(NewOrder {
                customer_name: None,
                customer_phone: None,
                status: None,
                order_type: None,
                items: vec![line(&burger, 2), line(&fries, 1)],
            })
            .await
            .unwrap();

        service.delete_menu_item(fries.id).await.unwrap();

        let orders = service.list_orders(None).await.unwrap();
        assert_eq!(orders[0].items.len(), 2);
        assert!(orders[0].items.iter().any(|l| l.menu_item.is_none()));

        let popular = service.popular_menu_items(5).await;
        assert_eq!(popular.len(), 1);
        assert_eq!(popular[0].id, burger.id);
    }

    #[tokio::test]
    async fn test_action_failures_surface_store_errors() {
        let (service, _, _) = service_with_menu().await;
        service.store().fail_on(RecordKind::Category);

        assert!(matches!(
            service.list_categories().await,
            Err(DashboardError::Store(StoreError::Unavailable(
                RecordKind::Category
            )))
        ));
        assert!(matches!(
            service.delete_category(Uuid::new_v4()).await,
            Err(DashboardError::Store(_))
        ));
    }

    #[test]
    fn test_order_total_of_no_items_is_zero() {
        assert_eq!(order_total(&[]), BigDecimal::from(0));
    }

    #[tokio::test]
    async fn test_order_span_omits_customer_details() {
        let (service, burger, _) = service_with_menu().await;
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_span_events(FmtSpan::NEW)
            .finish();

        service
            .create_order(NewOrder {
                customer_name: Some("Grace Hopper".to_string()),
                customer_phone: Some("555-0199".to_string()),
                status: None,
                order_type: None,
                items: vec![line(&burger, 1), line(&burger, 2)],
            })
            .with_subscriber(subscriber)
            .await
            .unwrap();

        let text = logs.text();
        assert!(text.contains("create_order"));
        assert!(text.contains("lines=2"));
        assert!(!text.contains("555-0199"));
        assert!(!text.contains("Grace Hopper"));
    }
}
