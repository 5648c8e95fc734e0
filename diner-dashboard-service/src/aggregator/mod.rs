use tracing::error;

use crate::store::{RecordKind, StoreError};

pub mod activity;
pub mod popularity;
pub mod stats;

pub use activity::{recent_activities, Activity, ActivityAction, ActivityKind};
pub use popularity::{popular_menu_items, PopularItem};
pub use stats::{dashboard_stats, revenue_between, DashboardStats};

/// Aggregators treat a failed fetch as "no rows".
fn rows_or_empty<T>(kind: RecordKind, result: Result<Vec<T>, StoreError>) -> Vec<T> {
    result.unwrap_or_else(|err| {
        error!(%kind, error = %err, "Error fetching rows, continuing without them");
        Vec::new()
    })
}
