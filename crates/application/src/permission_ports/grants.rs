use async_trait::async_trait;

use worksuite_core::{AppResult, TenantId, UserId};
use worksuite_domain::{AuditEntryId, Grant, GrantChange, GrantDiff, SubjectRef};

/// Validated change batch against one subject's grant layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantChangeSet {
    /// User performing the change.
    pub actor_id: UserId,
    /// Subject whose grants are changed.
    pub target: SubjectRef,
    /// Cell toggles; duplicates are collapsed with the last entry winning.
    pub changes: Vec<GrantChange>,
}

/// Result of a committed change batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedGrantChanges {
    /// Audit entry written alongside the grant rows.
    pub audit_entry_id: AuditEntryId,
    /// Cells whose stored value changed.
    pub diff: Vec<GrantDiff>,
    /// Target's own grant rows as written, ordered by app, then scope.
    pub grants: Vec<Grant>,
}

/// Repository port for persisted grants.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Lists stored grants of the given subjects in tenant scope.
    async fn list_grants_for_subjects(
        &self,
        tenant_id: TenantId,
        subjects: &[SubjectRef],
    ) -> AppResult<Vec<Grant>>;

    /// Upserts every change and appends one audit entry in a single transaction.
    ///
    /// Fails with `NotFound` when the target does not belong to the tenant.
    /// When the audit append fails nothing is committed.
    async fn apply_grant_changes(
        &self,
        tenant_id: TenantId,
        change_set: GrantChangeSet,
    ) -> AppResult<AppliedGrantChanges>;
}
