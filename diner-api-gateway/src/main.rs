use std::sync::Arc;

use axum::Router;
use diner_dashboard_service::{config::Config, service::DashboardService, store::PgStore};
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod error;
mod handlers;
mod models;

use handlers::{ApiDoc, AppState, category_router, dashboard_router, menu_router, order_router};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8100";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let listen_addr =
        std::env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

    let state = AppState {
        service: Arc::new(DashboardService::new(PgStore::new(config.database_url))),
    };

    let app = Router::new()
        .merge(category_router())
        .merge(menu_router())
        .merge(order_router())
        .merge(dashboard_router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("Dashboard API listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
