use super::*;

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    is_system: bool,
}

impl From<RoleRow> for RoleRecord {
    fn from(row: RoleRow) -> Self {
        Self {
            role_id: RoleId::from_uuid(row.id),
            name: row.name,
            is_system: row.is_system,
        }
    }
}

impl PostgresDirectoryRepository {
    pub(super) async fn find_role_impl(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Option<RoleRecord>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, is_system
            FROM roles
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to find role: {error}")))?;

        Ok(row.map(RoleRecord::from))
    }

    pub(super) async fn list_roles_impl(&self, tenant_id: TenantId) -> AppResult<Vec<RoleRecord>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, is_system
            FROM roles
            WHERE tenant_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to list roles: {error}")))?;

        Ok(rows.into_iter().map(RoleRecord::from).collect())
    }

    pub(super) async fn create_role_impl(
        &self,
        tenant_id: TenantId,
        name: &str,
        is_system: bool,
    ) -> AppResult<RoleRecord> {
        let role_id = RoleId::new();

        sqlx::query(
            r#"
            INSERT INTO roles (id, tenant_id, name, is_system)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(name)
        .bind(is_system)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::Conflict(format!("role '{name}' already exists"))
            } else {
                AppError::Persistence(format!("failed to create role: {error}"))
            }
        })?;

        Ok(RoleRecord {
            role_id,
            name: name.to_owned(),
            is_system,
        })
    }

    pub(super) async fn delete_role_impl(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Persistence(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            DELETE FROM permission_grants
            WHERE tenant_id = $1 AND subject_type = $2 AND subject_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(SubjectType::Role.as_str())
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to delete role grants: {error}"))
        })?;

        sqlx::query(
            r#"
            UPDATE users
            SET role_id = NULL
            WHERE tenant_id = $1 AND role_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to clear role assignments: {error}"))
        })?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM roles
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to delete role: {error}")))?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Persistence(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }
}
