use diesel_async::{async_connection_wrapper::AsyncConnectionWrapper, AsyncPgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;
use tracing::info;

pub mod aggregator;
pub mod config;
pub mod models;
pub mod schema;
pub mod service;
pub mod store;

use store::{PgStore, StoreError};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to run migrations: {0}")]
    Harness(String),
}

/// Applies pending embedded migrations and returns how many ran.
pub async fn run_migrations(store: &PgStore) -> Result<usize, MigrationError> {
    let conn = store.connect().await?;
    let mut async_wrapper: AsyncConnectionWrapper<AsyncPgConnection> =
        AsyncConnectionWrapper::from(conn);
    let applied = tokio::task::spawn_blocking(move || {
        async_wrapper
            .run_pending_migrations(MIGRATIONS)
            .map(|versions| versions.len())
            .map_err(|e| MigrationError::Harness(e.to_string()))
    })
    .await
    .map_err(|e| MigrationError::Harness(e.to_string()))??;

    info!(applied, "migrations up to date");
    Ok(applied)
}
