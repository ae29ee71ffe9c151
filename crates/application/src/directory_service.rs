use std::sync::Arc;

use worksuite_core::{AppError, AppResult, NonEmptyString, UserId, UserIdentity};
use worksuite_domain::{RoleId, TeamId};

use crate::{CreateUserInput, DirectoryRepository, RoleRecord, TeamRecord, UserRecord};

/// Tenant-scoped administration of users, roles and teams.
#[derive(Clone)]
pub struct DirectoryService {
    repository: Arc<dyn DirectoryRepository>,
}

impl DirectoryService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn DirectoryRepository>) -> Self {
        Self { repository }
    }

    /// Builds the session identity of an existing user.
    ///
    /// Unknown users are reported as unauthorized so callers learn nothing
    /// about which identifiers exist.
    pub async fn identity_for(&self, user_id: UserId) -> AppResult<UserIdentity> {
        let unknown = || AppError::Unauthorized(format!("user '{user_id}' is unknown"));

        let tenant_id = self
            .repository
            .find_tenant_for_user(user_id)
            .await?
            .ok_or_else(unknown)?;
        let user = self
            .repository
            .find_user(tenant_id, user_id)
            .await?
            .ok_or_else(unknown)?;

        Ok(UserIdentity::new(
            user.user_id,
            user.display_name,
            tenant_id,
        ))
    }

    /// Lists users of the actor's tenant.
    pub async fn list_users(&self, actor: &UserIdentity) -> AppResult<Vec<UserRecord>> {
        self.repository.list_users(actor.tenant_id()).await
    }

    /// Creates a user, optionally with a role.
    pub async fn create_user(
        &self,
        actor: &UserIdentity,
        display_name: &str,
        role_id: Option<RoleId>,
    ) -> AppResult<UserRecord> {
        let display_name = NonEmptyString::new(display_name)?;
        if let Some(role_id) = role_id {
            self.require_role(actor, role_id).await?;
        }

        let user = self
            .repository
            .create_user(
                actor.tenant_id(),
                CreateUserInput {
                    display_name: display_name.into(),
                    role_id,
                },
            )
            .await?;

        tracing::info!(
            tenant_id = %actor.tenant_id(),
            user_id = %user.user_id,
            "created user"
        );
        Ok(user)
    }

    /// Sets or clears the role of a user.
    pub async fn set_user_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role_id: Option<RoleId>,
    ) -> AppResult<()> {
        if let Some(role_id) = role_id {
            self.require_role(actor, role_id).await?;
        }

        self.repository
            .set_user_role(actor.tenant_id(), user_id, role_id)
            .await
    }

    /// Lists roles of the actor's tenant.
    pub async fn list_roles(&self, actor: &UserIdentity) -> AppResult<Vec<RoleRecord>> {
        self.repository.list_roles(actor.tenant_id()).await
    }

    /// Creates a custom role.
    pub async fn create_role(&self, actor: &UserIdentity, name: &str) -> AppResult<RoleRecord> {
        let name = NonEmptyString::new(name)?;
        self.repository
            .create_role(actor.tenant_id(), name.as_str(), false)
            .await
    }

    /// Deletes a custom role together with its default grants.
    ///
    /// Users holding the role keep their account with no role.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: RoleId) -> AppResult<()> {
        let role = self.require_role(actor, role_id).await?;
        if role.is_system {
            return Err(AppError::Conflict(format!(
                "system role '{}' cannot be deleted",
                role.name
            )));
        }

        self.repository
            .delete_role(actor.tenant_id(), role_id)
            .await?;

        tracing::info!(
            tenant_id = %actor.tenant_id(),
            role_id = %role_id,
            "deleted role and cascaded grants"
        );
        Ok(())
    }

    /// Lists teams of the actor's tenant.
    pub async fn list_teams(&self, actor: &UserIdentity) -> AppResult<Vec<TeamRecord>> {
        self.repository.list_teams(actor.tenant_id()).await
    }

    /// Creates a team.
    pub async fn create_team(&self, actor: &UserIdentity, name: &str) -> AppResult<TeamRecord> {
        let name = NonEmptyString::new(name)?;
        self.repository
            .create_team(actor.tenant_id(), name.as_str())
            .await
    }

    /// Deletes a team, its grants and its memberships.
    pub async fn delete_team(&self, actor: &UserIdentity, team_id: TeamId) -> AppResult<()> {
        self.repository
            .delete_team(actor.tenant_id(), team_id)
            .await?;

        tracing::info!(
            tenant_id = %actor.tenant_id(),
            team_id = %team_id,
            "deleted team and cascaded grants"
        );
        Ok(())
    }

    /// Adds a user of the same tenant to a team.
    pub async fn add_team_member(
        &self,
        actor: &UserIdentity,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()> {
        if self
            .repository
            .find_user(actor.tenant_id(), user_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!("user '{user_id}' was not found")));
        }

        self.repository
            .add_team_member(actor.tenant_id(), team_id, user_id)
            .await
    }

    /// Removes a user from a team.
    pub async fn remove_team_member(
        &self,
        actor: &UserIdentity,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()> {
        self.repository
            .remove_team_member(actor.tenant_id(), team_id, user_id)
            .await
    }

    async fn require_role(&self, actor: &UserIdentity, role_id: RoleId) -> AppResult<RoleRecord> {
        self.repository
            .find_role(actor.tenant_id(), role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }
}
