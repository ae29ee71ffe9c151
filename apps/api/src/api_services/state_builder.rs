use std::sync::Arc;

use sqlx::PgPool;
use worksuite_infrastructure::{
    PostgresAuditLogRepository, PostgresDirectoryRepository, PostgresGrantRepository,
};

use crate::api_config::ApiConfig;
use crate::state::{AppState, PermissionRepositories};

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppState {
    let repositories = PermissionRepositories {
        directory: Arc::new(PostgresDirectoryRepository::new(pool.clone())),
        grants: Arc::new(PostgresGrantRepository::new(pool.clone())),
        audit_log: Arc::new(PostgresAuditLogRepository::new(pool.clone())),
    };

    AppState::new(
        repositories,
        pool,
        config.frontend_url.clone(),
        config.bootstrap_token.clone(),
    )
}
