use std::sync::Arc;

use sqlx::PgPool;
use worksuite_application::{
    AccessGate, AuditLogRepository, AuditService, DirectoryRepository, DirectoryService,
    GrantRepository, PermissionMatrixService, PermissionResolver,
};

/// Port implementations the services are built over.
#[derive(Clone)]
pub struct PermissionRepositories {
    pub directory: Arc<dyn DirectoryRepository>,
    pub grants: Arc<dyn GrantRepository>,
    pub audit_log: Arc<dyn AuditLogRepository>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_gate: AccessGate,
    pub permission_matrix_service: PermissionMatrixService,
    pub audit_service: AuditService,
    pub directory_service: DirectoryService,
    pub postgres_pool: PgPool,
    pub frontend_url: String,
    pub bootstrap_token: String,
}

impl AppState {
    pub fn new(
        repositories: PermissionRepositories,
        postgres_pool: PgPool,
        frontend_url: String,
        bootstrap_token: String,
    ) -> Self {
        let resolver = PermissionResolver::new(
            repositories.directory.clone(),
            repositories.grants.clone(),
        );

        Self {
            access_gate: AccessGate::new(resolver.clone()),
            permission_matrix_service: PermissionMatrixService::new(
                resolver,
                repositories.directory.clone(),
                repositories.grants,
            ),
            audit_service: AuditService::new(repositories.audit_log),
            directory_service: DirectoryService::new(repositories.directory),
            postgres_pool,
            frontend_url,
            bootstrap_token,
        }
    }
}
