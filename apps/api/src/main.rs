//! Worksuite permission API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dev_seed;
mod dto;
mod error;
mod extract;
mod handlers;
mod middleware;
mod state;

#[cfg(test)]
mod test_support;

use tracing::info;
use worksuite_core::AppError;

use crate::api_config::{ApiCommand, ApiConfig, init_tracing};
use crate::api_services::{build_app_state, build_postgres_session_layer, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config.database_url, config.database_max_connections).await?;

    match config.command {
        ApiCommand::Migrate => {
            info!("database migrations applied");
            return Ok(());
        }
        ApiCommand::Seed => {
            dev_seed::run(pool).await?;
            return Ok(());
        }
        ApiCommand::Serve => {}
    }

    let session_layer = build_postgres_session_layer(pool.clone(), &config).await?;
    let app_state = build_app_state(pool, &config);
    let app = api_router::build_router(app_state, &config.frontend_url, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "worksuite-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
