use async_trait::async_trait;

use worksuite_core::{AppResult, TenantId, UserId};
use worksuite_domain::{AuditAction, AuditEntryId, GrantDiff, SubjectRef};

/// Immutable record of one matrix write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Stable entry identifier.
    pub entry_id: AuditEntryId,
    /// Store-assigned sequence, strictly increasing with insertion order.
    pub sequence: i64,
    /// User who made the change.
    pub actor_id: UserId,
    /// Subject whose grants were changed.
    pub target: SubjectRef,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Cells changed by the write; empty for no-op batches.
    pub diff: Vec<GrantDiff>,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
}

/// Query parameters for audit listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditEntryQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Only entries with a sequence strictly below this value.
    pub before_sequence: Option<i64>,
}

/// Read-only repository port for the audit trail.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists tenant entries newest-first.
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: AuditEntryQuery,
    ) -> AppResult<Vec<AuditEntry>>;
}
