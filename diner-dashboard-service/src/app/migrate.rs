use diner_dashboard_service::run_migrations;

use super::connect_store;

pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = connect_store()?;
    let applied = run_migrations(&store).await?;
    println!("applied {} migration(s)", applied);
    Ok(())
}
