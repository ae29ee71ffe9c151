use std::sync::Arc;

use worksuite_core::{AppError, AppResult, UserIdentity};

use crate::{AuditEntry, AuditEntryQuery, AuditLogRepository};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_AUDIT_PAGE_SIZE: usize = 50;

/// Largest page a caller may request.
pub const MAX_AUDIT_PAGE_SIZE: usize = 200;

/// One page of audit entries, newest-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntryPage {
    /// Entries of this page.
    pub entries: Vec<AuditEntry>,
    /// Cursor for the next page, present when this page is full.
    pub next_cursor: Option<String>,
}

/// Read-only access to the permission audit trail.
#[derive(Clone)]
pub struct AuditService {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    /// Lists audit entries of the actor's tenant.
    ///
    /// `cursor` is the value returned as `next_cursor` by the previous page.
    pub async fn list_entries(
        &self,
        actor: &UserIdentity,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> AppResult<AuditEntryPage> {
        let limit = limit
            .unwrap_or(DEFAULT_AUDIT_PAGE_SIZE)
            .clamp(1, MAX_AUDIT_PAGE_SIZE);
        let before_sequence = cursor.map(parse_cursor).transpose()?;

        let entries = self
            .repository
            .list_entries(
                actor.tenant_id(),
                AuditEntryQuery {
                    limit,
                    before_sequence,
                },
            )
            .await?;

        let next_cursor = (entries.len() == limit)
            .then(|| entries.last().map(|entry| entry.sequence.to_string()))
            .flatten();

        Ok(AuditEntryPage {
            entries,
            next_cursor,
        })
    }
}

fn parse_cursor(cursor: &str) -> AppResult<i64> {
    cursor
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|sequence| *sequence > 0)
        .ok_or_else(|| AppError::Validation(format!("invalid audit cursor '{cursor}'")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use worksuite_core::{AppError, TenantId, UserId, UserIdentity};
    use worksuite_domain::{GrantChange, SubjectRef};

    use crate::test_fakes::FakeStore;
    use crate::{GrantChangeSet, GrantRepository};

    use super::AuditService;

    async fn seeded(entries: usize) -> (Arc<FakeStore>, UserIdentity) {
        let tenant_id = TenantId::new();
        let store = Arc::new(FakeStore::default());
        let actor_id = UserId::new();
        store.add_user(tenant_id, actor_id, None).await;

        for _ in 0..entries {
            let applied = store
                .apply_grant_changes(
                    tenant_id,
                    GrantChangeSet {
                        actor_id,
                        target: SubjectRef::user(actor_id),
                        changes: Vec::<GrantChange>::new(),
                    },
                )
                .await;
            assert!(applied.is_ok());
        }

        (store, UserIdentity::new(actor_id, "admin", tenant_id))
    }

    #[tokio::test]
    async fn pages_newest_first_with_cursor() {
        let (store, actor) = seeded(5).await;
        let service = AuditService::new(store);

        let first = service.list_entries(&actor, Some(2), None).await;
        let Ok(first) = first else {
            panic!("first page failed: {first:?}");
        };
        let sequences = first
            .entries
            .iter()
            .map(|entry| entry.sequence)
            .collect::<Vec<_>>();
        assert_eq!(sequences, vec![5, 4]);
        assert_eq!(first.next_cursor.as_deref(), Some("4"));

        let last = service.list_entries(&actor, Some(10), Some("2")).await;
        let Ok(last) = last else {
            panic!("last page failed: {last:?}");
        };
        assert_eq!(last.entries.len(), 1);
        assert_eq!(last.next_cursor, None);
    }

    #[tokio::test]
    async fn zero_limit_is_clamped_to_one() {
        let (store, actor) = seeded(3).await;
        let service = AuditService::new(store);

        let page = service.list_entries(&actor, Some(0), None).await;
        assert_eq!(page.map(|page| page.entries.len()).ok(), Some(1));
    }

    #[tokio::test]
    async fn other_tenants_entries_are_hidden() {
        let (store, _) = seeded(2).await;
        let service = AuditService::new(store);
        let outsider = UserIdentity::new(UserId::new(), "outsider", TenantId::new());

        let page = service.list_entries(&outsider, None, None).await;
        assert_eq!(page.map(|page| page.entries.len()).ok(), Some(0));
    }

    #[tokio::test]
    async fn malformed_cursor_is_rejected() {
        let (store, actor) = seeded(1).await;
        let service = AuditService::new(store);

        let result = service.list_entries(&actor, None, Some("abc")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
