use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use worksuite_application::{
    CreateUserInput, DirectoryRepository, RoleRecord, TeamRecord, UserRecord,
};
use worksuite_core::{AppError, AppResult, TenantId, UserId};
use worksuite_domain::{RoleId, SubjectType, TeamId};

mod roles;
mod teams;
mod users;


/// PostgreSQL-backed repository for tenant users, roles and teams.
#[derive(Clone)]
pub struct PostgresDirectoryRepository {
    pool: PgPool,
}

impl PostgresDirectoryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(database_error) if database_error.code().as_deref() == Some("23505")
    )
}

#[async_trait]
impl DirectoryRepository for PostgresDirectoryRepository {
    async fn ensure_tenant(&self, tenant_id: TenantId, name: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tenants (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to ensure tenant exists: {error}"))
        })?;

        Ok(())
    }

    async fn find_tenant_for_user(&self, user_id: UserId) -> AppResult<Option<TenantId>> {
        self.find_tenant_for_user_impl(user_id).await
    }

    async fn find_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<UserRecord>> {
        self.find_user_impl(tenant_id, user_id).await
    }

    async fn list_users(&self, tenant_id: TenantId) -> AppResult<Vec<UserRecord>> {
        self.list_users_impl(tenant_id).await
    }

    async fn create_user(
        &self,
        tenant_id: TenantId,
        input: CreateUserInput,
    ) -> AppResult<UserRecord> {
        self.create_user_impl(tenant_id, input).await
    }

    async fn set_user_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        role_id: Option<RoleId>,
    ) -> AppResult<()> {
        self.set_user_role_impl(tenant_id, user_id, role_id).await
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Option<RoleRecord>> {
        self.find_role_impl(tenant_id, role_id).await
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<RoleRecord>> {
        self.list_roles_impl(tenant_id).await
    }

    async fn create_role(
        &self,
        tenant_id: TenantId,
        name: &str,
        is_system: bool,
    ) -> AppResult<RoleRecord> {
        self.create_role_impl(tenant_id, name, is_system).await
    }

    async fn delete_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<()> {
        self.delete_role_impl(tenant_id, role_id).await
    }

    async fn find_team(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
    ) -> AppResult<Option<TeamRecord>> {
        self.find_team_impl(tenant_id, team_id).await
    }

    async fn list_teams(&self, tenant_id: TenantId) -> AppResult<Vec<TeamRecord>> {
        self.list_teams_impl(tenant_id).await
    }

    async fn create_team(&self, tenant_id: TenantId, name: &str) -> AppResult<TeamRecord> {
        self.create_team_impl(tenant_id, name).await
    }

    async fn delete_team(&self, tenant_id: TenantId, team_id: TeamId) -> AppResult<()> {
        self.delete_team_impl(tenant_id, team_id).await
    }

    async fn add_team_member(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()> {
        self.add_team_member_impl(tenant_id, team_id, user_id).await
    }

    async fn remove_team_member(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()> {
        self.remove_team_member_impl(tenant_id, team_id, user_id)
            .await
    }

    async fn list_team_ids_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<TeamId>> {
        self.list_team_ids_for_user_impl(tenant_id, user_id).await
    }
}
