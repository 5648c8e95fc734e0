use std::fmt;
use std::io::Write;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, IsNull, Output, ToSql},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::schema::{categories, menu_items, order_items, orders};

#[derive(FromSqlRow, AsExpression, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Clone, Debug)]
#[diesel(sql_type = crate::schema::sql_types::OrderStatus)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl ToSql<crate::schema::sql_types::OrderStatus, Pg> for OrderStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::OrderStatus, Pg> for OrderStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"pending" => Ok(OrderStatus::Pending),
            b"preparing" => Ok(OrderStatus::Preparing),
            b"ready" => Ok(OrderStatus::Ready),
            b"delivered" => Ok(OrderStatus::Delivered),
            b"cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(FromSqlRow, AsExpression, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Debug)]
#[diesel(sql_type = crate::schema::sql_types::OrderType)]
pub enum OrderType {
    #[serde(rename = "dine-in")]
    DineIn,
    #[serde(rename = "takeaway")]
    Takeaway,
    #[serde(rename = "delivery")]
    Delivery,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::DineIn => "dine-in",
            OrderType::Takeaway => "takeaway",
            OrderType::Delivery => "delivery",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dine-in" => Ok(OrderType::DineIn),
            "takeaway" => Ok(OrderType::Takeaway),
            "delivery" => Ok(OrderType::Delivery),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

impl ToSql<crate::schema::sql_types::OrderType, Pg> for OrderType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::OrderType, Pg> for OrderType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"dine-in" => Ok(OrderType::DineIn),
            b"takeaway" => Ok(OrderType::Takeaway),
            b"delivery" => Ok(OrderType::Delivery),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("unknown variant `{0}`")]
pub struct UnknownVariant(pub String);

#[derive(Queryable, Selectable, Identifiable, Insertable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = categories)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(AsChangeset, Clone, Debug)]
#[diesel(table_name = categories)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = menu_items)]
pub struct MenuItem {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = menu_items)]
pub struct MenuItemRef {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(AsChangeset, Clone, Debug)]
#[diesel(table_name = menu_items)]
pub struct MenuItemChanges {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<BigDecimal>,
    pub image_url: Option<Option<String>>,
    pub is_available: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MenuItemWithCategory {
    #[serde(flatten)]
    pub item: MenuItem,
    pub category: CategoryRef,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(AsChangeset, Clone, Debug)]
#[diesel(table_name = orders)]
pub struct OrderChanges {
    pub status: Option<OrderStatus>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = order_items)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Option<Uuid>,
    pub quantity: i32,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct OrderItemDetails {
    #[serde(flatten)]
    pub item: OrderItem,
    pub menu_item: Option<MenuItemRef>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetails>,
}

/// One line item's quantity together with the menu item it refers to.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderedQuantity {
    pub quantity: i32,
    pub menu_item: MenuItemRef,
}

#[derive(Queryable, Selectable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = orders)]
pub struct RevenuePoint {
    pub created_at: DateTime<Utc>,
    pub total_amount: BigDecimal,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewMenuItem {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct MenuItemUpdate {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<BigDecimal>,
    pub image_url: Option<Option<String>>,
    pub is_available: Option<bool>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewOrder {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub items: Vec<NewOrderLine>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewOrderLine {
    pub menu_item_id: Uuid,
    pub quantity: i32,
}
