use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{delete, insert_into, pg::Pg, prelude::*, update};
use diesel_async::{
    scoped_futures::ScopedFutureExt, AsyncConnection, AsyncPgConnection, RunQueryDsl,
};
use tracing::debug;
use uuid::Uuid;

use super::{OrderFilter, RestaurantStore, StoreError};
use crate::models::{
    Category, CategoryChanges, CategoryRef, MenuItem, MenuItemChanges, MenuItemRef,
    MenuItemWithCategory, Order, OrderChanges, OrderDetails, OrderItem, OrderItemDetails,
    OrderStatus, OrderedQuantity, RevenuePoint,
};
use crate::schema::{categories, menu_items, order_items, orders};

/// PostgreSQL-backed store. Every operation opens its own connection.
pub struct PgStore {
    database_url: String,
}

impl PgStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    pub async fn connect(&self) -> Result<AsyncPgConnection, StoreError> {
        debug!("opening database connection");
        Ok(AsyncPgConnection::establish(&self.database_url).await?)
    }
}

fn filtered_orders(filter: &OrderFilter) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table.into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(orders::status.eq(status));
    }
    if let Some(since) = filter.created_since {
        query = query.filter(orders::created_at.ge(since));
    }
    query
}

fn ensure_deleted(affected: usize) -> Result<(), StoreError> {
    if affected == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

impl RestaurantStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let conn = &mut self.connect().await?;
        let results = categories::table
            .order(categories::name.asc())
            .select(Category::as_select())
            .load(conn)
            .await?;
        Ok(results)
    }

    async fn recent_categories(&self, limit: i64) -> Result<Vec<Category>, StoreError> {
        let conn = &mut self.connect().await?;
        let results = categories::table
            .order((categories::updated_at.desc(), categories::id.asc()))
            .limit(limit)
            .select(Category::as_select())
            .load(conn)
            .await?;
        Ok(results)
    }

    async fn insert_category(&self, category: Category) -> Result<Category, StoreError> {
        let conn = &mut self.connect().await?;
        let created = insert_into(categories::table)
            .values(&category)
            .returning(Category::as_returning())
            .get_result(conn)
            .await?;
        Ok(created)
    }

    async fn update_category(
        &self,
        id: Uuid,
        changes: CategoryChanges,
    ) -> Result<Category, StoreError> {
        let conn = &mut self.connect().await?;
        let updated = update(categories::table.find(id))
            .set(&changes)
            .returning(Category::as_returning())
            .get_result(conn)
            .await?;
        Ok(updated)
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = &mut self.connect().await?;
        ensure_deleted(delete(categories::table.find(id)).execute(conn).await?)
    }

    async fn list_menu_items(&self) -> Result<Vec<MenuItemWithCategory>, StoreError> {
        let conn = &mut self.connect().await?;
        let rows = menu_items::table
            .inner_join(categories::table)
            .order((menu_items::created_at.desc(), menu_items::id.asc()))
            .select((MenuItem::as_select(), CategoryRef::as_select()))
            .load::<(MenuItem, CategoryRef)>(conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(item, category)| MenuItemWithCategory { item, category })
            .collect())
    }

    async fn find_menu_items(&self, ids: Vec<Uuid>) -> Result<Vec<MenuItem>, StoreError> {
        let conn = &mut self.connect().await?;
        let results = menu_items::table
            .filter(menu_items::id.eq_any(ids))
            .select(MenuItem::as_select())
            .load(conn)
            .await?;
        Ok(results)
    }

    async fn recent_menu_items(&self, limit: i64) -> Result<Vec<MenuItem>, StoreError> {
        let conn = &mut self.connect().await?;
        let results = menu_items::table
            .order((menu_items::updated_at.desc(), menu_items::id.asc()))
            .limit(limit)
            .select(MenuItem::as_select())
            .load(conn)
            .await?;
        Ok(results)
    }

    async fn count_menu_items(&self) -> Result<i64, StoreError> {
        let conn = &mut self.connect().await?;
        Ok(menu_items::table.count().get_result(conn).await?)
    }

    async fn insert_menu_item(&self, item: MenuItem) -> Result<MenuItem, StoreError> {
        let conn = &mut self.connect().await?;
        let created = insert_into(menu_items::table)
            .values(&item)
            .returning(MenuItem::as_returning())
            .get_result(conn)
            .await?;
        Ok(created)
    }

    async fn update_menu_item(
        &self,
        id: Uuid,
        changes: MenuItemChanges,
    ) -> Result<MenuItem, StoreError> {
        let conn = &mut self.connect().await?;
        let updated = update(menu_items::table.find(id))
            .set(&changes)
            .returning(MenuItem::as_returning())
            .get_result(conn)
            .await?;
        Ok(updated)
    }

    async fn delete_menu_item(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = &mut self.connect().await?;
        ensure_deleted(delete(menu_items::table.find(id)).execute(conn).await?)
    }

    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, StoreError> {
        let conn = &mut self.connect().await?;
        let filter = OrderFilter {
            status,
            ..Default::default()
        };
        let results = filtered_orders(&filter)
            .order((orders::created_at.desc(), orders::id.asc()))
            .select(Order::as_select())
            .load(conn)
            .await?;

        let order_ids = results.iter().map(|o| o.id).collect::<Vec<_>>();
        let line_items = order_items::table
            .left_join(menu_items::table)
            .filter(order_items::order_id.eq_any(order_ids))
            .order((order_items::created_at.asc(), order_items::id.asc()))
            .select((OrderItem::as_select(), Option::<MenuItemRef>::as_select()))
            .load::<(OrderItem, Option<MenuItemRef>)>(conn)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<OrderItemDetails>> = HashMap::new();
        for (item, menu_item) in line_items {
            grouped
                .entry(item.order_id)
                .or_default()
                .push(OrderItemDetails { item, menu_item });
        }

        Ok(results
            .into_iter()
            .map(|order| OrderDetails {
                items: grouped.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect())
    }

    async fn recent_orders(&self, limit: i64) -> Result<Vec<Order>, StoreError> {
        let conn = &mut self.connect().await?;
        let results = orders::table
            .order((orders::updated_at.desc(), orders::id.asc()))
            .limit(limit)
            .select(Order::as_select())
            .load(conn)
            .await?;
        Ok(results)
    }

    async fn count_orders(&self, filter: OrderFilter) -> Result<i64, StoreError> {
        let conn = &mut self.connect().await?;
        Ok(filtered_orders(&filter).count().get_result(conn).await?)
    }

    async fn order_totals(&self, filter: OrderFilter) -> Result<Vec<BigDecimal>, StoreError> {
        let conn = &mut self.connect().await?;
        let totals = filtered_orders(&filter)
            .select(orders::total_amount)
            .load::<BigDecimal>(conn)
            .await?;
        Ok(totals)
    }

    async fn revenue_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RevenuePoint>, StoreError> {
        let conn = &mut self.connect().await?;
        let points = orders::table
            .filter(orders::created_at.ge(start))
            .filter(orders::created_at.le(end))
            .order((orders::created_at.asc(), orders::id.asc()))
            .select(RevenuePoint::as_select())
            .load(conn)
            .await?;
        Ok(points)
    }

    async fn insert_order(&self, order: Order, items: Vec<OrderItem>) -> Result<Order, StoreError> {
        let conn = &mut self.connect().await?;
        conn.transaction(|conn| {
            async move {
                let created = insert_into(orders::table)
                    .values(&order)
                    .returning(Order::as_returning())
                    .get_result(conn)
                    .await?;
                if !items.is_empty() {
                    insert_into(order_items::table)
                        .values(&items)
                        .execute(conn)
                        .await?;
                }
                Ok::<Order, StoreError>(created)
            }
            .scope_boxed()
        })
        .await
    }

    async fn update_order(&self, id: Uuid, changes: OrderChanges) -> Result<Order, StoreError> {
        let conn = &mut self.connect().await?;
        let updated = update(orders::table.find(id))
            .set(&changes)
            .returning(Order::as_returning())
            .get_result(conn)
            .await?;
        Ok(updated)
    }

    async fn delete_order(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = &mut self.connect().await?;
        ensure_deleted(delete(orders::table.find(id)).execute(conn).await?)
    }

    async fn ordered_quantities(&self) -> Result<Vec<OrderedQuantity>, StoreError> {
        let conn = &mut self.connect().await?;
        let rows = order_items::table
            .inner_join(menu_items::table)
            .order((order_items::created_at.asc(), order_items::id.asc()))
            .select((order_items::quantity, MenuItemRef::as_select()))
            .load::<(i32, MenuItemRef)>(conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(quantity, menu_item)| OrderedQuantity {
                quantity,
                menu_item,
            })
            .collect())
    }
}
