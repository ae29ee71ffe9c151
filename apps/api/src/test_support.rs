use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use worksuite_core::{TenantId, UserIdentity};
use worksuite_infrastructure::InMemoryPermissionStore;

use crate::dev_seed::{ADMIN_DISPLAY_NAME, MEMBER_DISPLAY_NAME, SeededTenant, seed_tenant};
use crate::state::{AppState, PermissionRepositories};

pub(crate) const TEST_BOOTSTRAP_TOKEN: &str = "test-bootstrap-token";
pub(crate) const TEST_FRONTEND_URL: &str = "http://localhost:3000";

pub(crate) struct SeededState {
    pub state: AppState,
    pub store: Arc<InMemoryPermissionStore>,
    pub tenant: SeededTenant,
    pub admin: UserIdentity,
    pub member: UserIdentity,
}

/// App state over an in-memory store seeded like the development tenant.
pub(crate) async fn seeded_state() -> SeededState {
    let store = Arc::new(InMemoryPermissionStore::new());
    let Ok(tenant) = seed_tenant(store.as_ref(), store.as_ref(), TenantId::new()).await else {
        panic!("seeding the in-memory store failed");
    };

    let Ok(pool) = PgPoolOptions::new().connect_lazy("postgres://worksuite@localhost/unused")
    else {
        panic!("lazy pool should build without connecting");
    };

    let state = AppState::new(
        PermissionRepositories {
            directory: store.clone(),
            grants: store.clone(),
            audit_log: store.clone(),
        },
        pool,
        TEST_FRONTEND_URL.to_owned(),
        TEST_BOOTSTRAP_TOKEN.to_owned(),
    );

    SeededState {
        state,
        store,
        admin: UserIdentity::new(tenant.admin_user_id, ADMIN_DISPLAY_NAME, tenant.tenant_id),
        member: UserIdentity::new(tenant.member_user_id, MEMBER_DISPLAY_NAME, tenant.tenant_id),
        tenant,
    }
}
