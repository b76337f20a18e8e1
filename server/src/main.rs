mod config;
mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};
use crate::db::postgres::PgStore;

#[derive(Debug, thiserror::Error)]
enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database init failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Leptos(String),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;

    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;
    let state = state::AppState::new(Arc::new(PgStore::new(pool)), &config.schema_version);

    let app = routes::app(state, &config).map_err(ServerError::Leptos)?;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!(port = config.port, schema_version = %config.schema_version, "ifrs9 intake listening");
    axum::serve(listener, app).await?;
    Ok(())
}
