use std::sync::Arc;

use worksuite_core::{AppError, AppResult, TenantId, UserId};
use worksuite_domain::{GrantLayers, PermissionMatrix, SubjectRef, SubjectType};

use crate::{DirectoryRepository, GrantRepository};

/// Computes effective permission matrices from role, team and user grants.
///
/// Nothing is cached between calls; every resolution reads the latest
/// committed grants.
#[derive(Clone)]
pub struct PermissionResolver {
    directory: Arc<dyn DirectoryRepository>,
    grants: Arc<dyn GrantRepository>,
}

impl PermissionResolver {
    /// Creates a resolver from repository implementations.
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryRepository>, grants: Arc<dyn GrantRepository>) -> Self {
        Self { directory, grants }
    }

    /// Resolves the effective matrix of a user in a tenant.
    pub async fn resolve_matrix(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<PermissionMatrix> {
        Ok(self.load_layers(tenant_id, user_id).await?.resolve())
    }

    /// Loads the grant layers contributing to a user's matrix.
    pub async fn load_layers(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<GrantLayers> {
        let user = self
            .directory
            .find_user(tenant_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))?;

        let team_ids = self
            .directory
            .list_team_ids_for_user(tenant_id, user_id)
            .await?;

        let mut subjects = Vec::with_capacity(team_ids.len() + 2);
        subjects.extend(user.role_id.map(SubjectRef::role));
        subjects.extend(team_ids.into_iter().map(SubjectRef::team));
        subjects.push(SubjectRef::user(user_id));

        let grants = self
            .grants
            .list_grants_for_subjects(tenant_id, &subjects)
            .await?;

        let mut layers = GrantLayers::default();
        for grant in grants {
            if !subjects.contains(&grant.subject) {
                continue;
            }

            match grant.subject.subject_type() {
                SubjectType::Role => layers.role_defaults.push(grant),
                SubjectType::Team => layers.team_grants.push(grant),
                SubjectType::User => layers.user_overrides.push(grant),
            }
        }

        Ok(layers)
    }
}
