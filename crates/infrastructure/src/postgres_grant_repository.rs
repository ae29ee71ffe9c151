use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use worksuite_application::{AppliedGrantChanges, GrantChangeSet, GrantRepository};
use worksuite_core::{AppError, AppResult, TenantId};
use worksuite_domain::{
    AppKey, AuditAction, AuditEntryId, Grant, GrantChange, GrantDiff, ScopeKey, SubjectRef,
    SubjectType,
};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for permission grants and their audit trail.
#[derive(Clone)]
pub struct PostgresGrantRepository {
    pool: PgPool,
}

impl PostgresGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    subject_type: String,
    subject_id: Uuid,
    app_key: String,
    scope_key: String,
    enabled: bool,
}

#[derive(Debug, FromRow)]
struct StoredCellRow {
    app_key: String,
    scope_key: String,
    enabled: bool,
}

fn parse_cell(app_key: &str, scope_key: &str) -> AppResult<(AppKey, ScopeKey)> {
    let app = AppKey::from_str(app_key).map_err(|error| {
        AppError::Internal(format!("corrupt app key in permission_grants: {error}"))
    })?;
    let scope = ScopeKey::from_str(scope_key).map_err(|error| {
        AppError::Internal(format!("corrupt scope key in permission_grants: {error}"))
    })?;
    Ok((app, scope))
}

impl TryFrom<GrantRow> for Grant {
    type Error = AppError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        let subject_type = SubjectType::from_str(row.subject_type.as_str()).map_err(|error| {
            AppError::Internal(format!("corrupt subject type in permission_grants: {error}"))
        })?;
        let (app_key, scope_key) = parse_cell(row.app_key.as_str(), row.scope_key.as_str())?;

        Ok(Self {
            subject: SubjectRef::new(subject_type, row.subject_id),
            app_key,
            scope_key,
            enabled: row.enabled,
        })
    }
}

async fn subject_exists(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    subject: SubjectRef,
) -> AppResult<bool> {
    let statement = match subject.subject_type() {
        SubjectType::User => "SELECT EXISTS (SELECT 1 FROM users WHERE tenant_id = $1 AND id = $2)",
        SubjectType::Team => "SELECT EXISTS (SELECT 1 FROM teams WHERE tenant_id = $1 AND id = $2)",
        SubjectType::Role => "SELECT EXISTS (SELECT 1 FROM roles WHERE tenant_id = $1 AND id = $2)",
    };

    sqlx::query_scalar::<_, bool>(statement)
        .bind(tenant_id.as_uuid())
        .bind(subject.subject_id())
        .fetch_one(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to verify grant target '{subject}': {error}"))
        })
}

async fn stored_cells(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    subject: SubjectRef,
) -> AppResult<BTreeMap<(AppKey, ScopeKey), bool>> {
    let rows = sqlx::query_as::<_, StoredCellRow>(
        r#"
        SELECT app_key, scope_key, enabled
        FROM permission_grants
        WHERE tenant_id = $1 AND subject_type = $2 AND subject_id = $3
        FOR UPDATE
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(subject.subject_type().as_str())
    .bind(subject.subject_id())
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| AppError::Persistence(format!("failed to read stored grants: {error}")))?;

    rows.into_iter()
        .map(|row| {
            parse_cell(row.app_key.as_str(), row.scope_key.as_str()).map(|cell| (cell, row.enabled))
        })
        .collect()
}

#[async_trait]
impl GrantRepository for PostgresGrantRepository {
    async fn list_grants_for_subjects(
        &self,
        tenant_id: TenantId,
        subjects: &[SubjectRef],
    ) -> AppResult<Vec<Grant>> {
        if subjects.is_empty() {
            return Ok(Vec::new());
        }

        let subject_types = subjects
            .iter()
            .map(|subject| subject.subject_type().as_str().to_owned())
            .collect::<Vec<_>>();
        let subject_ids = subjects
            .iter()
            .map(|subject| subject.subject_id())
            .collect::<Vec<_>>();

        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT
                grants.subject_type,
                grants.subject_id,
                grants.app_key,
                grants.scope_key,
                grants.enabled
            FROM permission_grants grants
            INNER JOIN UNNEST($2::TEXT[], $3::UUID[]) AS wanted(subject_type, subject_id)
                ON wanted.subject_type = grants.subject_type
                AND wanted.subject_id = grants.subject_id
            WHERE grants.tenant_id = $1
            ORDER BY grants.subject_type, grants.subject_id, grants.app_key, grants.scope_key
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_types)
        .bind(subject_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to list grants: {error}")))?;

        rows.into_iter().map(Grant::try_from).collect()
    }

    async fn apply_grant_changes(
        &self,
        tenant_id: TenantId,
        change_set: GrantChangeSet,
    ) -> AppResult<AppliedGrantChanges> {
        let target = change_set.target;
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Persistence(format!("failed to begin transaction: {error}"))
        })?;

        if !subject_exists(&mut transaction, tenant_id, target).await? {
            return Err(AppError::NotFound(format!(
                "{} '{}' was not found",
                target.subject_type().as_str(),
                target.subject_id()
            )));
        }

        let mut layer = stored_cells(&mut transaction, tenant_id, target).await?;
        let diff = GrantDiff::compute(&layer, &change_set.changes);

        for GrantChange {
            app_key,
            scope_key,
            enabled,
        } in GrantChange::collapse(&change_set.changes)
        {
            layer.insert((app_key, scope_key), enabled);

            sqlx::query(
                r#"
                INSERT INTO permission_grants (
                    tenant_id,
                    subject_type,
                    subject_id,
                    app_key,
                    scope_key,
                    enabled,
                    updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, now())
                ON CONFLICT (tenant_id, subject_type, subject_id, app_key, scope_key)
                DO UPDATE SET enabled = EXCLUDED.enabled, updated_at = now()
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(target.subject_type().as_str())
            .bind(target.subject_id())
            .bind(app_key.as_str())
            .bind(scope_key.as_str())
            .bind(enabled)
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Persistence(format!("failed to upsert grant: {error}")))?;
        }

        let diff_json = serde_json::to_value(&diff).map_err(|error| {
            AppError::Internal(format!("failed to serialize grant diff: {error}"))
        })?;
        let audit_entry_id = AuditEntryId::new();

        sqlx::query(
            r#"
            INSERT INTO permission_audit_entries (
                id,
                tenant_id,
                actor_id,
                target_type,
                target_id,
                action,
                diff
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(audit_entry_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(change_set.actor_id.as_uuid())
        .bind(target.subject_type().as_str())
        .bind(target.subject_id())
        .bind(AuditAction::for_target(target.subject_type()).as_str())
        .bind(diff_json)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to append permission audit entry: {error}"))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Persistence(format!("failed to commit transaction: {error}"))
        })?;

        // The target rows stay locked until commit, so the layer equals what was written.
        let grants = layer
            .into_iter()
            .map(|((app_key, scope_key), enabled)| Grant {
                subject: target,
                app_key,
                scope_key,
                enabled,
            })
            .collect();

        Ok(AppliedGrantChanges {
            audit_entry_id,
            diff,
            grants,
        })
    }
}
