use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use worksuite_application::DirectoryRepository;
use worksuite_core::TenantId;

use crate::PostgresDirectoryRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connects to `DATABASE_URL` and migrates, or returns `None` when unset.
pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres tests: {error}");
    }

    Some(pool)
}

/// Creates a fresh tenant and returns it with a directory repository.
pub(crate) async fn fresh_tenant(
    pool: &PgPool,
    name: &str,
) -> (TenantId, PostgresDirectoryRepository) {
    let directory = PostgresDirectoryRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    let ensured = directory.ensure_tenant(tenant_id, name).await;
    assert!(ensured.is_ok());
    (tenant_id, directory)
}
