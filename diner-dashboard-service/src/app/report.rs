use diner_dashboard_service::service::DashboardService;
use serde::Serialize;

use super::connect_store;

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn stats() -> Result<(), Box<dyn std::error::Error>> {
    let service = DashboardService::new(connect_store()?);
    print_json(&service.dashboard_stats().await)
}

pub async fn activity(limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let service = DashboardService::new(connect_store()?);
    print_json(&service.recent_activities(limit).await)
}

pub async fn popular(limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let service = DashboardService::new(connect_store()?);
    print_json(&service.popular_menu_items(limit).await)
}
