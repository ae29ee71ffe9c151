use axum::extract::{Extension, Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;
use worksuite_application::AccessGate;
use worksuite_core::{AppError, AppResult, UserIdentity};
use worksuite_domain::{AppKey, PermissionMatrix, ScopeKey};

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

/// `(app, scope)` pair a route group demands from its callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredAccess {
    pub app: AppKey,
    pub scope: ScopeKey,
}

impl RequiredAccess {
    pub const fn new(app: AppKey, scope: ScopeKey) -> Self {
        Self { app, scope }
    }
}

/// Matrix the gate resolved for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMatrix(pub PermissionMatrix);

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_app_access(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Extension(required): Extension<RequiredAccess>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let matrix = check_access(&state.access_gate, &identity, required).await?;

    request.extensions_mut().insert(ResolvedMatrix(matrix));
    Ok(next.run(request).await)
}

pub(crate) async fn check_access(
    gate: &AccessGate,
    identity: &UserIdentity,
    required: RequiredAccess,
) -> AppResult<PermissionMatrix> {
    gate.authorize(identity, required.app.as_str(), required.scope.as_str())
        .await
        .inspect_err(|error| {
            if let AppError::Forbidden { reason, .. } = error {
                tracing::warn!(
                    tenant_id = %identity.tenant_id(),
                    user_id = %identity.user_id(),
                    app_key = required.app.as_str(),
                    scope_key = required.scope.as_str(),
                    reason = reason.code(),
                    "access denied"
                );
            }
        })
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if let Some(fetch_site) = headers.get("sec-fetch-site") {
            if fetch_site == HeaderValue::from_static("cross-site") {
                return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
            }
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if !origin_is_allowed(&state.frontend_url, origin, referer) {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn origin_is_allowed(allowed_origin: &str, origin: &str, referer: &str) -> bool {
    origin == allowed_origin || referer.starts_with(allowed_origin)
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use worksuite_core::{AppError, ForbiddenReason};
    use worksuite_domain::{AppKey, ScopeKey};

    use crate::test_support::seeded_state;

    use super::{RequiredAccess, check_access, is_state_changing_method, origin_is_allowed};

    #[tokio::test]
    async fn member_is_denied_admin_with_app_reason() {
        let seeded = seeded_state().await;

        let result = check_access(
            &seeded.state.access_gate,
            &seeded.member,
            RequiredAccess::new(AppKey::Admin, ScopeKey::Read),
        )
        .await;

        assert!(matches!(
            result,
            Err(AppError::Forbidden {
                reason: ForbiddenReason::App,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn member_is_denied_write_with_scope_reason() {
        let seeded = seeded_state().await;

        let result = check_access(
            &seeded.state.access_gate,
            &seeded.member,
            RequiredAccess::new(AppKey::Crm, ScopeKey::Write),
        )
        .await;

        assert!(matches!(
            result,
            Err(AppError::Forbidden {
                reason: ForbiddenReason::Scope,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn admin_passes_and_receives_matrix() {
        let seeded = seeded_state().await;

        let result = check_access(
            &seeded.state.access_gate,
            &seeded.admin,
            RequiredAccess::new(AppKey::Admin, ScopeKey::Manage),
        )
        .await;

        assert!(result.is_ok_and(|matrix| matrix.is_granted(AppKey::Admin, ScopeKey::Read)));
    }

    #[test]
    fn only_mutations_need_origin_checks() {
        assert!(is_state_changing_method(&Method::POST));
        assert!(is_state_changing_method(&Method::DELETE));
        assert!(!is_state_changing_method(&Method::GET));
        assert!(!is_state_changing_method(&Method::OPTIONS));
    }

    #[test]
    fn origin_or_referer_must_match_frontend() {
        let frontend = "http://localhost:3000";

        assert!(origin_is_allowed(frontend, frontend, ""));
        assert!(origin_is_allowed(frontend, "", "http://localhost:3000/admin"));
        assert!(!origin_is_allowed(frontend, "http://evil.test", ""));
        assert!(!origin_is_allowed(frontend, "", ""));
    }
}
