use std::str::FromStr;
use std::sync::Arc;

use worksuite_core::{AppError, AppResult, UserId, UserIdentity};
use worksuite_domain::{
    AppKey, AuditEntryId, Grant, GrantChange, GrantDiff, PermissionMatrix, RoleId, ScopeKey,
    SubjectRef, SubjectType, TeamId,
};

use crate::{DirectoryRepository, GrantChangeSet, GrantRepository, PermissionResolver};

/// Untrusted cell toggle as received from transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantChangeInput {
    /// Raw app key.
    pub app_key: String,
    /// Raw scope key.
    pub scope_key: String,
    /// Requested value.
    pub enabled: bool,
}

impl GrantChangeInput {
    /// Convenience constructor.
    #[must_use]
    pub fn new(app_key: impl Into<String>, scope_key: impl Into<String>, enabled: bool) -> Self {
        Self {
            app_key: app_key.into(),
            scope_key: scope_key.into(),
            enabled,
        }
    }
}

/// Matrix view of one subject for administrative screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectMatrixView {
    /// Subject the view describes.
    pub subject: SubjectRef,
    /// Effective matrix for users, own normalized layer for teams and roles.
    pub matrix: PermissionMatrix,
    /// Apps with any enabled scope in `matrix`.
    pub enabled_apps: Vec<AppKey>,
    /// Rows stored directly on the subject.
    pub explicit_grants: Vec<Grant>,
}

/// Outcome of a committed change batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMatrixChanges {
    /// Subject whose grants changed.
    pub subject: SubjectRef,
    /// Matrix after the commit, computed like [`SubjectMatrixView::matrix`].
    pub matrix: PermissionMatrix,
    /// Apps with any enabled scope in `matrix`.
    pub enabled_apps: Vec<AppKey>,
    /// Audit entry recorded with the batch.
    pub audit_entry_id: AuditEntryId,
    /// Cells whose stored value changed.
    pub diff: Vec<GrantDiff>,
}

/// Caller's own matrix, used for client-side navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerApps {
    /// Effective matrix of the caller.
    pub matrix: PermissionMatrix,
    /// Apps with any enabled scope.
    pub enabled_apps: Vec<AppKey>,
}

/// Application service for reading and editing permission matrices.
///
/// Access to these operations is enforced by the gate in front of them; the
/// service itself only scopes every lookup to the actor's tenant.
#[derive(Clone)]
pub struct PermissionMatrixService {
    resolver: PermissionResolver,
    directory: Arc<dyn DirectoryRepository>,
    grants: Arc<dyn GrantRepository>,
}

impl PermissionMatrixService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        resolver: PermissionResolver,
        directory: Arc<dyn DirectoryRepository>,
        grants: Arc<dyn GrantRepository>,
    ) -> Self {
        Self {
            resolver,
            directory,
            grants,
        }
    }

    /// Returns the effective matrix of a user.
    pub async fn user_matrix(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
    ) -> AppResult<SubjectMatrixView> {
        self.subject_matrix(actor, SubjectRef::user(user_id)).await
    }

    /// Returns the own grant layer of a team.
    pub async fn team_matrix(
        &self,
        actor: &UserIdentity,
        team_id: TeamId,
    ) -> AppResult<SubjectMatrixView> {
        self.subject_matrix(actor, SubjectRef::team(team_id)).await
    }

    /// Returns the default grant layer of a role.
    pub async fn role_matrix(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
    ) -> AppResult<SubjectMatrixView> {
        self.subject_matrix(actor, SubjectRef::role(role_id)).await
    }

    /// Returns the matrix view of any subject in the actor's tenant.
    pub async fn subject_matrix(
        &self,
        actor: &UserIdentity,
        subject: SubjectRef,
    ) -> AppResult<SubjectMatrixView> {
        self.require_subject(actor, subject).await?;

        let explicit_grants = self
            .grants
            .list_grants_for_subjects(actor.tenant_id(), &[subject])
            .await?;
        let matrix = self.matrix_for(actor, subject, &explicit_grants).await?;

        Ok(SubjectMatrixView {
            subject,
            enabled_apps: matrix.enabled_apps(),
            matrix,
            explicit_grants,
        })
    }

    /// Validates and applies a change batch to one subject's grants.
    ///
    /// An invalid entry rejects the whole batch before anything is written.
    /// Every accepted batch records exactly one audit entry, including batches
    /// that change nothing.
    pub async fn apply_changes(
        &self,
        actor: &UserIdentity,
        target: SubjectRef,
        changes: Vec<GrantChangeInput>,
    ) -> AppResult<AppliedMatrixChanges> {
        let changes = validate_changes(&changes)?;
        self.require_subject(actor, target).await?;

        let applied = self
            .grants
            .apply_grant_changes(
                actor.tenant_id(),
                GrantChangeSet {
                    actor_id: actor.user_id(),
                    target,
                    changes,
                },
            )
            .await?;

        // Role and team layers of a user target are read after commit.
        let matrix = self.matrix_for(actor, target, &applied.grants).await?;

        tracing::info!(
            tenant_id = %actor.tenant_id(),
            actor_id = %actor.user_id(),
            target = %target,
            audit_entry_id = %applied.audit_entry_id,
            changed_cells = applied.diff.len(),
            "applied permission changes"
        );

        Ok(AppliedMatrixChanges {
            subject: target,
            enabled_apps: matrix.enabled_apps(),
            matrix,
            audit_entry_id: applied.audit_entry_id,
            diff: applied.diff,
        })
    }

    /// Resolves the caller's own matrix.
    pub async fn caller_apps(&self, actor: &UserIdentity) -> AppResult<CallerApps> {
        let matrix = self
            .resolver
            .resolve_matrix(actor.tenant_id(), actor.user_id())
            .await?;

        Ok(CallerApps {
            enabled_apps: matrix.enabled_apps(),
            matrix,
        })
    }

    async fn require_subject(&self, actor: &UserIdentity, subject: SubjectRef) -> AppResult<()> {
        let tenant_id = actor.tenant_id();
        let id = subject.subject_id();
        let exists = match subject.subject_type() {
            SubjectType::User => self
                .directory
                .find_user(tenant_id, UserId::from_uuid(id))
                .await?
                .is_some(),
            SubjectType::Team => self
                .directory
                .find_team(tenant_id, TeamId::from_uuid(id))
                .await?
                .is_some(),
            SubjectType::Role => self
                .directory
                .find_role(tenant_id, RoleId::from_uuid(id))
                .await?
                .is_some(),
        };

        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "{} '{id}' was not found",
                subject.subject_type().as_str()
            )))
        }
    }

    async fn matrix_for(
        &self,
        actor: &UserIdentity,
        subject: SubjectRef,
        own_grants: &[Grant],
    ) -> AppResult<PermissionMatrix> {
        match subject.subject_type() {
            SubjectType::User => {
                let mut layers = self
                    .resolver
                    .load_layers(actor.tenant_id(), UserId::from_uuid(subject.subject_id()))
                    .await?;
                layers.user_overrides = own_grants.to_vec();
                Ok(layers.resolve())
            }
            SubjectType::Team | SubjectType::Role => Ok(PermissionMatrix::from_grants(own_grants)),
        }
    }
}

/// Parses a transport batch, reporting every invalid entry at once.
pub fn validate_changes(inputs: &[GrantChangeInput]) -> AppResult<Vec<GrantChange>> {
    let mut changes = Vec::with_capacity(inputs.len());
    let mut problems = Vec::new();

    for (index, input) in inputs.iter().enumerate() {
        let app_key = AppKey::from_str(&input.app_key);
        let scope_key = ScopeKey::from_str(&input.scope_key);

        if app_key.is_err() {
            problems.push(format!(
                "changes[{index}]: unknown app key '{}'",
                input.app_key
            ));
        }
        if scope_key.is_err() {
            problems.push(format!(
                "changes[{index}]: unknown scope key '{}'",
                input.scope_key
            ));
        }

        if let (Ok(app_key), Ok(scope_key)) = (app_key, scope_key) {
            changes.push(GrantChange {
                app_key,
                scope_key,
                enabled: input.enabled,
            });
        }
    }

    if problems.is_empty() {
        Ok(changes)
    } else {
        Err(AppError::Validation(problems.join("; ")))
    }
}
