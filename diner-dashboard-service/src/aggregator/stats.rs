use bigdecimal::BigDecimal;
use chrono::{DateTime, Local, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use serde::Serialize;
use tracing::{error, instrument};

use super::rows_or_empty;
use crate::models::{OrderStatus, RevenuePoint};
use crate::store::{OrderFilter, RecordKind, RestaurantStore};

/// Summary panel numbers. `Default` is the all-zero summary served on failure.
#[derive(Serialize, Default, Clone, Debug, PartialEq)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub total_revenue: BigDecimal,
    pub pending_orders: i64,
    pub total_menu_items: i64,
    pub today_orders: i64,
    pub today_revenue: BigDecimal,
}

/// Midnight of `now`'s calendar day in its own timezone.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(start) => start.with_timezone(&Utc),
        // midnight skipped by a DST transition
        None => {
            let offset = i64::from(now.offset().fix().local_minus_utc());
            (midnight - TimeDelta::seconds(offset)).and_utc()
        }
    }
}

/// Stats with "today" starting at the server's local midnight.
pub async fn dashboard_stats<S: RestaurantStore>(store: &S) -> DashboardStats {
    stats_since(store, start_of_day(&Local::now())).await
}

#[instrument(skip(store))]
pub async fn stats_since<S: RestaurantStore>(store: &S, today: DateTime<Utc>) -> DashboardStats {
    let fetched = tokio::try_join!(
        store.count_orders(OrderFilter::default()),
        store.order_totals(OrderFilter::default()),
        store.count_orders(OrderFilter::status(OrderStatus::Pending)),
        store.count_menu_items(),
        store.count_orders(OrderFilter::created_since(today)),
        store.order_totals(OrderFilter::created_since(today)),
    );

    match fetched {
        Ok((total_orders, totals, pending_orders, total_menu_items, today_orders, today_totals)) => {
            DashboardStats {
                total_orders,
                total_revenue: totals.into_iter().sum(),
                pending_orders,
                total_menu_items,
                today_orders,
                today_revenue: today_totals.into_iter().sum(),
            }
        }
        Err(err) => {
            error!(error = %err, "Error fetching dashboard stats");
            DashboardStats::default()
        }
    }
}

/// Orders created within `[start, end]`, oldest first.
#[instrument(skip(store))]
pub async fn revenue_between<S: RestaurantStore>(
    store: &S,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<RevenuePoint> {
    rows_or_empty(RecordKind::Order, store.revenue_between(start, end).await)
}
