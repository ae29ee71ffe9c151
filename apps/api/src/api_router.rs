use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{MethodRouter, delete, get, post, put};
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};
use worksuite_core::AppError;
use worksuite_domain::{AppKey, ScopeKey};

use crate::middleware::RequiredAccess;
use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;


const ADMIN_READ: RequiredAccess = RequiredAccess::new(AppKey::Admin, ScopeKey::Read);
const ADMIN_WRITE: RequiredAccess = RequiredAccess::new(AppKey::Admin, ScopeKey::Write);
const ADMIN_MANAGE: RequiredAccess = RequiredAccess::new(AppKey::Admin, ScopeKey::Manage);

pub fn build_router<Store>(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<Store>,
) -> Result<Router, AppError>
where
    Store: SessionStore + Clone,
{
    let gate = |method_router: MethodRouter<AppState>, required: RequiredAccess| {
        method_router
            .route_layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_app_access,
            ))
            .layer(Extension(required))
    };

    let protected_routes = Router::new()
        .route(
            "/api/permissions/matrix/{user_id}",
            gate(get(handlers::permissions::user_matrix_handler), ADMIN_READ).merge(gate(
                post(handlers::permissions::apply_user_matrix_handler),
                ADMIN_MANAGE,
            )),
        )
        .route(
            "/api/permissions/teams/{team_id}/permissions",
            gate(get(handlers::permissions::team_matrix_handler), ADMIN_READ).merge(gate(
                post(handlers::permissions::apply_team_matrix_handler),
                ADMIN_MANAGE,
            )),
        )
        .route(
            "/api/permissions/roles/{role_id}/permissions",
            gate(get(handlers::permissions::role_matrix_handler), ADMIN_READ).merge(gate(
                post(handlers::permissions::apply_role_matrix_handler),
                ADMIN_MANAGE,
            )),
        )
        .route(
            "/api/permissions/me/apps",
            get(handlers::permissions::caller_apps_handler),
        )
        .route(
            "/api/audit",
            gate(get(handlers::audit::list_audit_entries_handler), ADMIN_READ),
        )
        .route(
            "/api/users",
            gate(get(handlers::directory::list_users_handler), ADMIN_READ).merge(gate(
                post(handlers::directory::create_user_handler),
                ADMIN_WRITE,
            )),
        )
        .route(
            "/api/users/{user_id}/role",
            gate(put(handlers::directory::set_user_role_handler), ADMIN_WRITE),
        )
        .route(
            "/api/roles",
            gate(get(handlers::directory::list_roles_handler), ADMIN_READ).merge(gate(
                post(handlers::directory::create_role_handler),
                ADMIN_WRITE,
            )),
        )
        .route(
            "/api/roles/{role_id}",
            gate(
                delete(handlers::directory::delete_role_handler),
                ADMIN_WRITE,
            ),
        )
        .route(
            "/api/teams",
            gate(get(handlers::directory::list_teams_handler), ADMIN_READ).merge(gate(
                post(handlers::directory::create_team_handler),
                ADMIN_WRITE,
            )),
        )
        .route(
            "/api/teams/{team_id}",
            gate(
                delete(handlers::directory::delete_team_handler),
                ADMIN_WRITE,
            ),
        )
        .route(
            "/api/teams/{team_id}/members",
            gate(
                post(handlers::directory::add_team_member_handler),
                ADMIN_WRITE,
            ),
        )
        .route(
            "/api/teams/{team_id}/members/{user_id}",
            gate(
                delete(handlers::directory::remove_team_member_handler),
                ADMIN_WRITE,
            ),
        )
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = cors::build_cors_layer(frontend_url)?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
