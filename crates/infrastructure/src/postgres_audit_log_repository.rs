use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use worksuite_application::{AuditEntry, AuditEntryQuery, AuditLogRepository};
use worksuite_core::{AppError, AppResult, TenantId, UserId};
use worksuite_domain::{AuditAction, AuditEntryId, SubjectRef, SubjectType};


/// PostgreSQL-backed reader for permission audit entries.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditEntryRow {
    id: Uuid,
    sequence: i64,
    actor_id: Uuid,
    target_type: String,
    target_id: Uuid,
    action: String,
    diff: Value,
    created_at: String,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
    type Error = AppError;

    fn try_from(row: AuditEntryRow) -> Result<Self, Self::Error> {
        let target_type = SubjectType::from_str(row.target_type.as_str()).map_err(|error| {
            AppError::Internal(format!("corrupt audit target type: {error}"))
        })?;
        let action = AuditAction::from_str(row.action.as_str())
            .map_err(|error| AppError::Internal(format!("corrupt audit action: {error}")))?;
        let diff = serde_json::from_value(row.diff).map_err(|error| {
            AppError::Internal(format!("failed to decode audit diff: {error}"))
        })?;

        Ok(Self {
            entry_id: AuditEntryId::from_uuid(row.id),
            sequence: row.sequence,
            actor_id: UserId::from_uuid(row.actor_id),
            target: SubjectRef::new(target_type, row.target_id),
            action,
            diff,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: AuditEntryQuery,
    ) -> AppResult<Vec<AuditEntry>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, AuditEntryRow>(
            r#"
            SELECT
                id,
                sequence,
                actor_id,
                target_type,
                target_id,
                action,
                diff,
                to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            FROM permission_audit_entries
            WHERE tenant_id = $1
                AND ($2::BIGINT IS NULL OR sequence < $2)
            ORDER BY sequence DESC
            LIMIT $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(query.before_sequence)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to list permission audit entries: {error}"))
        })?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}
