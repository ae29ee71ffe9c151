use worksuite_core::{AppError, AppResult, UserIdentity};
use worksuite_domain::{AccessDecision, PermissionMatrix};

use crate::PermissionResolver;

/// Decides whether a caller may use an `(app, scope)` pair.
///
/// Every check resolves the caller's matrix afresh, so grant changes take
/// effect on the next request.
#[derive(Clone)]
pub struct AccessGate {
    resolver: PermissionResolver,
}

impl AccessGate {
    /// Creates a gate over a resolver.
    #[must_use]
    pub fn new(resolver: PermissionResolver) -> Self {
        Self { resolver }
    }

    /// Authorizes a caller and returns the matrix the decision was made on.
    ///
    /// Unknown app or scope keys are denied, never allowed. A caller whose
    /// user row no longer exists is treated as unauthenticated.
    pub async fn authorize(
        &self,
        actor: &UserIdentity,
        app_key: &str,
        scope_key: &str,
    ) -> AppResult<PermissionMatrix> {
        let matrix = self
            .resolver
            .resolve_matrix(actor.tenant_id(), actor.user_id())
            .await
            .map_err(|error| match error {
                AppError::NotFound(_) => {
                    AppError::Unauthorized(format!("user '{}' is unknown", actor.user_id()))
                }
                other => other,
            })?;

        match matrix.evaluate_keys(app_key, scope_key) {
            AccessDecision::Allowed => Ok(matrix),
            AccessDecision::Denied(reason) => Err(AppError::forbidden(
                reason,
                format!("user '{}' lacks '{app_key}:{scope_key}'", actor.user_id()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use worksuite_core::{AppError, AppResult, ForbiddenReason, TenantId, UserId, UserIdentity};
    use worksuite_domain::{AppKey, PermissionMatrix, RoleId, ScopeKey, SubjectRef};

    use crate::PermissionResolver;
    use crate::test_fakes::{FakeStore, grant};

    use super::AccessGate;

    async fn member_gate() -> (AccessGate, UserIdentity) {
        let tenant_id = TenantId::new();
        let store = Arc::new(FakeStore::default());
        let role_id = RoleId::new();
        let user_id = UserId::new();
        store.add_role(tenant_id, role_id, "Member").await;
        store.add_user(tenant_id, user_id, Some(role_id)).await;
        store
            .put_grant(
                tenant_id,
                grant(SubjectRef::role(role_id), AppKey::Crm, ScopeKey::Read, true),
            )
            .await;

        (
            AccessGate::new(PermissionResolver::new(store.clone(), store)),
            UserIdentity::new(user_id, "member", tenant_id),
        )
    }

    fn reason(result: &AppResult<PermissionMatrix>) -> Option<ForbiddenReason> {
        match result {
            Err(AppError::Forbidden { reason, .. }) => Some(*reason),
            _ => None,
        }
    }

    #[tokio::test]
    async fn allows_granted_cell() {
        let (gate, actor) = member_gate().await;
        assert!(gate.authorize(&actor, "crm", "read").await.is_ok());
    }

    #[tokio::test]
    async fn denies_missing_scope_of_usable_app() {
        let (gate, actor) = member_gate().await;
        let result = gate.authorize(&actor, "crm", "write").await;
        assert_eq!(reason(&result), Some(ForbiddenReason::Scope));
    }

    #[tokio::test]
    async fn denies_app_without_any_scope() {
        let (gate, actor) = member_gate().await;
        let result = gate.authorize(&actor, "billing", "read").await;
        assert_eq!(reason(&result), Some(ForbiddenReason::App));
    }

    #[tokio::test]
    async fn unknown_keys_fail_closed() {
        let (gate, actor) = member_gate().await;
        let unknown_app = gate.authorize(&actor, "payroll", "read").await;
        assert_eq!(reason(&unknown_app), Some(ForbiddenReason::App));

        let unknown_scope = gate.authorize(&actor, "crm", "delete").await;
        assert_eq!(reason(&unknown_scope), Some(ForbiddenReason::Scope));
    }

    #[tokio::test]
    async fn vanished_user_is_unauthorized() {
        let store = Arc::new(FakeStore::default());
        let gate = AccessGate::new(PermissionResolver::new(store.clone(), store));
        let actor = UserIdentity::new(UserId::new(), "ghost", TenantId::new());

        let result = gate.authorize(&actor, "crm", "read").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
