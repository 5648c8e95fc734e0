use std::fmt;
use std::future::Future;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Category, CategoryChanges, MenuItem, MenuItemChanges, MenuItemWithCategory, Order,
    OrderChanges, OrderDetails, OrderItem, OrderStatus, OrderedQuantity, RevenuePoint,
};

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum RecordKind {
    Order,
    MenuItem,
    Category,
    OrderLineItem,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Order => "orders",
            RecordKind::MenuItem => "menu_items",
            RecordKind::Category => "categories",
            RecordKind::OrderLineItem => "order_items",
        })
    }
}

/// Filter for count-only and sum reads over orders.
#[derive(Default, Clone, Debug)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub created_since: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn created_since(since: DateTime<Utc>) -> Self {
        Self {
            created_since: Some(since),
            ..Default::default()
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|status| order.status == status)
            && self.created_since.is_none_or(|since| order.created_at >= since)
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("could not connect to database")]
    Connection(#[from] diesel::ConnectionError),
    #[error("foreign key constraint on {0} violated")]
    ForeignKey(String),
    #[error("check constraint {0} violated")]
    Constraint(String),
    #[error("error while executing database query")]
    Query(#[source] diesel::result::Error),
    #[error("{0} unavailable")]
    Unavailable(RecordKind),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => StoreError::NotFound,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => StoreError::ForeignKey(info.table_name().unwrap_or("record").to_string()),
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::CheckViolation,
                info,
            ) => StoreError::Constraint(info.constraint_name().unwrap_or("check").to_string()),
            err => StoreError::Query(err),
        }
    }
}

/// Data-access boundary for the dashboard.
///
/// Reads that back the feed are bounded and ordered by `updated_at` descending.
/// Updates and deletes targeting a missing row fail with [`StoreError::NotFound`].
pub trait RestaurantStore: Send + Sync {
    fn list_categories(&self) -> impl Future<Output = Result<Vec<Category>, StoreError>> + Send;

    fn recent_categories(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Category>, StoreError>> + Send;

    fn insert_category(
        &self,
        category: Category,
    ) -> impl Future<Output = Result<Category, StoreError>> + Send;

    fn update_category(
        &self,
        id: Uuid,
        changes: CategoryChanges,
    ) -> impl Future<Output = Result<Category, StoreError>> + Send;

    fn delete_category(&self, id: Uuid) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Menu items joined with their category, newest first.
    fn list_menu_items(
        &self,
    ) -> impl Future<Output = Result<Vec<MenuItemWithCategory>, StoreError>> + Send;

    fn find_menu_items(
        &self,
        ids: Vec<Uuid>,
    ) -> impl Future<Output = Result<Vec<MenuItem>, StoreError>> + Send;

    fn recent_menu_items(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<MenuItem>, StoreError>> + Send;

    fn count_menu_items(&self) -> impl Future<Output = Result<i64, StoreError>> + Send;

    fn insert_menu_item(
        &self,
        item: MenuItem,
    ) -> impl Future<Output = Result<MenuItem, StoreError>> + Send;

    fn update_menu_item(
        &self,
        id: Uuid,
        changes: MenuItemChanges,
    ) -> impl Future<Output = Result<MenuItem, StoreError>> + Send;

    fn delete_menu_item(&self, id: Uuid) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Orders with their line items attached, newest first.
    fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> impl Future<Output = Result<Vec<OrderDetails>, StoreError>> + Send;

    fn recent_orders(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Order>, StoreError>> + Send;

    fn count_orders(
        &self,
        filter: OrderFilter,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    fn order_totals(
        &self,
        filter: OrderFilter,
    ) -> impl Future<Output = Result<Vec<BigDecimal>, StoreError>> + Send;

    fn revenue_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<RevenuePoint>, StoreError>> + Send;

    /// Inserts the order and its line items atomically.
    fn insert_order(
        &self,
        order: Order,
        items: Vec<OrderItem>,
    ) -> impl Future<Output = Result<Order, StoreError>> + Send;

    fn update_order(
        &self,
        id: Uuid,
        changes: OrderChanges,
    ) -> impl Future<Output = Result<Order, StoreError>> + Send;

    fn delete_order(&self, id: Uuid) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Every line item that still references a menu item, in insertion order.
    fn ordered_quantities(
        &self,
    ) -> impl Future<Output = Result<Vec<OrderedQuantity>, StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error};

    struct Violation {
        table: &'static str,
        constraint: &'static str,
    }

    impl DatabaseErrorInformation for Violation {
        fn message(&self) -> &str {
            "violation"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some(self.table)
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.constraint)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, table: &'static str, constraint: &'static str) -> Error {
        Error::DatabaseError(kind, Box::new(Violation { table, constraint }))
    }

    #[test]
    fn test_check_violation_maps_to_constraint() {
        let err = StoreError::from(database_error(
            DatabaseErrorKind::CheckViolation,
            "menu_items",
            "menu_items_price_check",
        ));
        assert!(matches!(&err, StoreError::Constraint(name) if name == "menu_items_price_check"));
        assert_eq!(
            err.to_string(),
            "check constraint menu_items_price_check violated"
        );
    }

    #[test]
    fn test_foreign_key_violation_names_table() {
        let err = StoreError::from(database_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "menu_items",
            "menu_items_category_id_fkey",
        ));
        assert!(matches!(err, StoreError::ForeignKey(table) if table == "menu_items"));
        assert!(matches!(StoreError::from(Error::NotFound), StoreError::NotFound));
    }
}
