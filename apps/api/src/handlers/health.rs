use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use sqlx::PgPool;

use crate::dto::{HealthDependencyStatus, HealthResponse};
use crate::state::AppState;

const PERMISSION_TABLES: [&str; 2] = ["permission_grants", "permission_audit_entries"];

/// Liveness plus readiness of the permission store.
///
/// Ready means PostgreSQL answers and the grant and audit tables exist.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let postgres = probe_postgres(&state.postgres_pool).await;
    let permission_schema = if postgres.is_ok() {
        probe_permission_schema(&state.postgres_pool).await
    } else {
        HealthDependencyStatus::failed("skipped: postgres unavailable".to_owned())
    };

    let ready = postgres.is_ok() && permission_schema.is_ok();
    let http_status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status: if ready { "ok" } else { "degraded" },
            ready,
            postgres,
            permission_schema,
        }),
    )
}

async fn probe_postgres(pool: &PgPool) -> HealthDependencyStatus {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthDependencyStatus::ok(),
        Err(error) => HealthDependencyStatus::failed(format!("postgres probe failed: {error}")),
    }
}

async fn probe_permission_schema(pool: &PgPool) -> HealthDependencyStatus {
    let mut missing = Vec::new();
    for table in PERMISSION_TABLES {
        let present = sqlx::query_scalar::<_, bool>("SELECT to_regclass($1) IS NOT NULL")
            .bind(table)
            .fetch_one(pool)
            .await;

        match present {
            Ok(true) => {}
            Ok(false) => missing.push(table),
            Err(error) => {
                return HealthDependencyStatus::failed(format!("schema probe failed: {error}"));
            }
        }
    }

    if missing.is_empty() {
        HealthDependencyStatus::ok()
    } else {
        HealthDependencyStatus::failed(format!("missing tables: {}", missing.join(", ")))
    }
}
