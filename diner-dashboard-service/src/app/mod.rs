use diner_dashboard_service::{config::Config, store::PgStore};

pub mod migrate;
pub mod report;

fn connect_store() -> Result<PgStore, Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    Ok(PgStore::new(config.database_url))
}
