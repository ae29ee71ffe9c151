use async_trait::async_trait;

use worksuite_core::{AppResult, TenantId, UserId};
use worksuite_domain::{RoleId, TeamId};

/// User projection needed for permission resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Stable user identifier.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// Assigned role, when any.
    pub role_id: Option<RoleId>,
}

/// Role projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Stable role identifier.
    pub role_id: RoleId,
    /// Unique role name in tenant scope.
    pub name: String,
    /// Indicates a system-managed role that cannot be deleted.
    pub is_system: bool,
}

/// Team projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRecord {
    /// Stable team identifier.
    pub team_id: TeamId,
    /// Unique team name in tenant scope.
    pub name: String,
    /// Current members.
    pub member_ids: Vec<UserId>,
}

/// Input payload for user creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInput {
    /// Display name.
    pub display_name: String,
    /// Initial role, when any.
    pub role_id: Option<RoleId>,
}

/// Repository port for tenant-scoped users, roles and teams.
///
/// Every lookup is filtered by tenant; identifiers owned by another tenant
/// behave exactly like missing ones.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Creates the tenant when it does not exist yet.
    async fn ensure_tenant(&self, tenant_id: TenantId, name: &str) -> AppResult<()>;

    /// Returns the tenant a user belongs to.
    async fn find_tenant_for_user(&self, user_id: UserId) -> AppResult<Option<TenantId>>;

    /// Finds a user in tenant scope.
    async fn find_user(&self, tenant_id: TenantId, user_id: UserId)
    -> AppResult<Option<UserRecord>>;

    /// Lists tenant users ordered by display name.
    async fn list_users(&self, tenant_id: TenantId) -> AppResult<Vec<UserRecord>>;

    /// Creates a user.
    async fn create_user(&self, tenant_id: TenantId, input: CreateUserInput)
    -> AppResult<UserRecord>;

    /// Sets or clears the role of a user.
    async fn set_user_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        role_id: Option<RoleId>,
    ) -> AppResult<()>;

    /// Finds a role in tenant scope.
    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId)
    -> AppResult<Option<RoleRecord>>;

    /// Lists tenant roles ordered by name.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<RoleRecord>>;

    /// Creates a role; duplicate names are a conflict.
    async fn create_role(
        &self,
        tenant_id: TenantId,
        name: &str,
        is_system: bool,
    ) -> AppResult<RoleRecord>;

    /// Deletes a role, its grants, and every user reference to it.
    async fn delete_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<()>;

    /// Finds a team in tenant scope.
    async fn find_team(&self, tenant_id: TenantId, team_id: TeamId)
    -> AppResult<Option<TeamRecord>>;

    /// Lists tenant teams ordered by name.
    async fn list_teams(&self, tenant_id: TenantId) -> AppResult<Vec<TeamRecord>>;

    /// Creates a team; duplicate names are a conflict.
    async fn create_team(&self, tenant_id: TenantId, name: &str) -> AppResult<TeamRecord>;

    /// Deletes a team, its grants and its memberships.
    async fn delete_team(&self, tenant_id: TenantId, team_id: TeamId) -> AppResult<()>;

    /// Adds a user to a team; adding an existing member is a no-op.
    async fn add_team_member(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()>;

    /// Removes a user from a team.
    async fn remove_team_member(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()>;

    /// Lists the teams a user belongs to.
    async fn list_team_ids_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<TeamId>>;
}
