use super::*;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    display_name: String,
    role_id: Option<Uuid>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.id),
            display_name: row.display_name,
            role_id: row.role_id.map(RoleId::from_uuid),
        }
    }
}

impl PostgresDirectoryRepository {
    pub(super) async fn find_tenant_for_user_impl(
        &self,
        user_id: UserId,
    ) -> AppResult<Option<TenantId>> {
        let tenant_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT tenant_id
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to resolve tenant for user: {error}"))
        })?;

        Ok(tenant_id.map(TenantId::from_uuid))
    }

    pub(super) async fn find_user_impl(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, display_name, role_id
            FROM users
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to find user: {error}")))?;

        Ok(row.map(UserRecord::from))
    }

    pub(super) async fn list_users_impl(&self, tenant_id: TenantId) -> AppResult<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, display_name, role_id
            FROM users
            WHERE tenant_id = $1
            ORDER BY display_name, id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to list users: {error}")))?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    pub(super) async fn create_user_impl(
        &self,
        tenant_id: TenantId,
        input: CreateUserInput,
    ) -> AppResult<UserRecord> {
        let user_id = UserId::new();

        sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, display_name, role_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(input.display_name.as_str())
        .bind(input.role_id.map(|role_id| role_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to create user: {error}")))?;

        Ok(UserRecord {
            user_id,
            display_name: input.display_name,
            role_id: input.role_id,
        })
    }

    pub(super) async fn set_user_role_impl(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        role_id: Option<RoleId>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role_id = $3
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(role_id.map(|role_id| role_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to set user role: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user '{user_id}' was not found")));
        }

        Ok(())
    }
}
