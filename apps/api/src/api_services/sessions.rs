use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use worksuite_core::AppError;

use crate::api_config::ApiConfig;

const SESSION_COOKIE_NAME: &str = "worksuite_session";
const SESSION_TABLE_NAME: &str = "worksuite_sessions";

/// Session layer backed by PostgreSQL.
///
/// Sessions only carry the caller's identity; permissions are resolved per
/// request, so an idle timeout is the only expiry.
pub async fn build_postgres_session_layer(
    pool: PgPool,
    config: &ApiConfig,
) -> Result<SessionManagerLayer<PostgresStore>, AppError> {
    let store = PostgresStore::new(pool)
        .with_table_name(SESSION_TABLE_NAME)
        .map_err(|error| AppError::Internal(format!("invalid session table name: {error}")))?;

    store.migrate().await.map_err(|error| {
        AppError::Persistence(format!("failed to migrate session store: {error}"))
    })?;

    let idle_minutes = i64::from(config.session_idle_minutes);
    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(config.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(idle_minutes))))
}
