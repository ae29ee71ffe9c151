use axum::Json;
use axum::extract::{Extension, Path, State};
use worksuite_application::{AuditEntryQuery, AuditLogRepository};
use worksuite_core::{AppError, UserIdentity};
use worksuite_domain::{AppKey, ScopeKey};

use crate::dto::ApplyMatrixChangesRequest;
use crate::dto::permissions::GrantChangeRequest;
use crate::extract::ApiJson;
use crate::middleware::{RequiredAccess, ResolvedMatrix, check_access};
use crate::test_support::{SeededState, seeded_state};

use super::{
    apply_team_matrix_handler, apply_user_matrix_handler, caller_apps_handler,
    role_matrix_handler, team_matrix_handler, user_matrix_handler,
};

async fn resolved_for(seeded: &SeededState, identity: &UserIdentity) -> ResolvedMatrix {
    let matrix = check_access(
        &seeded.state.access_gate,
        identity,
        RequiredAccess::new(AppKey::Admin, ScopeKey::Read),
    )
    .await;
    let Ok(matrix) = matrix else {
        panic!("identity should pass admin:read: {matrix:?}");
    };
    ResolvedMatrix(matrix)
}

fn batch(changes: &[(&str, &str, bool)]) -> ApiJson<ApplyMatrixChangesRequest> {
    ApiJson(ApplyMatrixChangesRequest {
        changes: changes
            .iter()
            .map(|(app_key, scope_key, enabled)| GrantChangeRequest {
                app_key: (*app_key).to_owned(),
                scope_key: (*scope_key).to_owned(),
                enabled: *enabled,
            })
            .collect(),
    })
}

async fn audit_count(seeded: &SeededState) -> usize {
    seeded
        .store
        .list_entries(
            seeded.tenant.tenant_id,
            AuditEntryQuery {
                limit: 200,
                before_sequence: None,
            },
        )
        .await
        .map(|entries| entries.len())
        .unwrap_or_default()
}

#[tokio::test]
async fn admin_grants_member_crm_write() {
    let seeded = seeded_state().await;
    let member_id = seeded.member.user_id().to_string();

    let applied = apply_user_matrix_handler(
        State(seeded.state.clone()),
        Extension(seeded.admin.clone()),
        Path(member_id.clone()),
        batch(&[("crm", "write", true)]),
    )
    .await;
    let Ok(Json(applied)) = applied else {
        panic!("apply should succeed");
    };

    let crm = applied.matrix.get("crm").copied();
    assert!(crm.is_some_and(|flags| flags.read && flags.write && !flags.manage));
    assert_eq!(applied.enabled_apps, vec!["crm".to_owned()]);
    assert_eq!(applied.diff.len(), 1);
    assert_eq!(applied.diff[0].scope_key, "write");
    assert!(!applied.diff[0].old_value && applied.diff[0].new_value);
    assert_eq!(applied.subject.subject_type, "user");

    let view = user_matrix_handler(
        State(seeded.state.clone()),
        Extension(seeded.admin.clone()),
        Extension(resolved_for(&seeded, &seeded.admin).await),
        Path(member_id),
    )
    .await;
    let Ok(Json(view)) = view else {
        panic!("view should succeed");
    };
    assert_eq!(view.explicit_grants.len(), 1);
    assert!(view.can_edit);
}

#[tokio::test]
async fn invalid_batch_is_rejected_without_audit() {
    let seeded = seeded_state().await;
    let before = audit_count(&seeded).await;

    let result = apply_user_matrix_handler(
        State(seeded.state.clone()),
        Extension(seeded.admin.clone()),
        Path(seeded.member.user_id().to_string()),
        batch(&[("crm", "write", true), ("payroll", "read", true)]),
    )
    .await;

    assert!(matches!(result, Err(error) if matches!(error.0, AppError::Validation(_))));
    assert_eq!(audit_count(&seeded).await, before);
}

#[tokio::test]
async fn malformed_path_id_is_validation_error() {
    let seeded = seeded_state().await;

    let result = user_matrix_handler(
        State(seeded.state.clone()),
        Extension(seeded.admin.clone()),
        Extension(resolved_for(&seeded, &seeded.admin).await),
        Path("not-a-uuid".to_owned()),
    )
    .await;

    assert!(matches!(result, Err(error) if matches!(error.0, AppError::Validation(_))));
}

#[tokio::test]
async fn role_view_shows_member_defaults() {
    let seeded = seeded_state().await;

    let view = role_matrix_handler(
        State(seeded.state.clone()),
        Extension(seeded.admin.clone()),
        Extension(resolved_for(&seeded, &seeded.admin).await),
        Path(seeded.tenant.member_role_id.to_string()),
    )
    .await;
    let Ok(Json(view)) = view else {
        panic!("role view should succeed");
    };

    assert_eq!(view.subject.subject_type, "role");
    assert_eq!(view.enabled_apps, vec!["crm".to_owned()]);
    assert!(
        view.matrix
            .get("crm")
            .is_some_and(|flags| flags.read && !flags.write)
    );
}

#[tokio::test]
async fn team_grant_reaches_member_navigation() {
    let seeded = seeded_state().await;
    let directory = &seeded.state.directory_service;
    let Ok(team) = directory.create_team(&seeded.admin, "Support").await else {
        panic!("team creation failed");
    };
    assert!(
        directory
            .add_team_member(&seeded.admin, team.team_id, seeded.member.user_id())
            .await
            .is_ok()
    );

    let applied = apply_team_matrix_handler(
        State(seeded.state.clone()),
        Extension(seeded.admin.clone()),
        Path(team.team_id.to_string()),
        batch(&[("kanban", "write", true)]),
    )
    .await;
    assert!(applied.is_ok());

    let team_view = team_matrix_handler(
        State(seeded.state.clone()),
        Extension(seeded.admin.clone()),
        Extension(resolved_for(&seeded, &seeded.admin).await),
        Path(team.team_id.to_string()),
    )
    .await;
    assert!(team_view.is_ok_and(|Json(view)| view.enabled_apps == vec!["kanban".to_owned()]));

    let apps = caller_apps_handler(
        State(seeded.state.clone()),
        Extension(seeded.member.clone()),
    )
    .await;
    let Ok(Json(apps)) = apps else {
        panic!("caller apps should resolve");
    };
    assert_eq!(
        apps.enabled_apps,
        vec!["crm".to_owned(), "kanban".to_owned()]
    );
}

#[tokio::test]
async fn unknown_team_is_not_found() {
    let seeded = seeded_state().await;

    let result = apply_team_matrix_handler(
        State(seeded.state.clone()),
        Extension(seeded.admin.clone()),
        Path(uuid::Uuid::new_v4().to_string()),
        batch(&[("crm", "read", true)]),
    )
    .await;

    assert!(matches!(result, Err(error) if matches!(error.0, AppError::NotFound(_))));
}
