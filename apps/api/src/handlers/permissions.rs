use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use worksuite_application::GrantChangeInput;
use worksuite_core::{UserId, UserIdentity};
use worksuite_domain::{AppKey, RoleId, ScopeKey, SubjectRef, TeamId};

use crate::dto::{
    AppliedMatrixChangesResponse, ApplyMatrixChangesRequest, CallerAppsResponse,
    SubjectMatrixResponse,
};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::middleware::ResolvedMatrix;
use crate::state::AppState;

pub async fn user_matrix_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(resolved): Extension<ResolvedMatrix>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<SubjectMatrixResponse>> {
    let subject = SubjectRef::user(UserId::from_str(&user_id)?);
    subject_matrix(&state, &user, &resolved, subject).await
}

pub async fn apply_user_matrix_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    ApiJson(payload): ApiJson<ApplyMatrixChangesRequest>,
) -> ApiResult<Json<AppliedMatrixChangesResponse>> {
    let subject = SubjectRef::user(UserId::from_str(&user_id)?);
    apply_changes(&state, &user, subject, payload).await
}

pub async fn team_matrix_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(resolved): Extension<ResolvedMatrix>,
    Path(team_id): Path<String>,
) -> ApiResult<Json<SubjectMatrixResponse>> {
    let subject = SubjectRef::team(TeamId::from_str(&team_id)?);
    subject_matrix(&state, &user, &resolved, subject).await
}

pub async fn apply_team_matrix_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(team_id): Path<String>,
    ApiJson(payload): ApiJson<ApplyMatrixChangesRequest>,
) -> ApiResult<Json<AppliedMatrixChangesResponse>> {
    let subject = SubjectRef::team(TeamId::from_str(&team_id)?);
    apply_changes(&state, &user, subject, payload).await
}

pub async fn role_matrix_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(resolved): Extension<ResolvedMatrix>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<SubjectMatrixResponse>> {
    let subject = SubjectRef::role(RoleId::from_str(&role_id)?);
    subject_matrix(&state, &user, &resolved, subject).await
}

pub async fn apply_role_matrix_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    ApiJson(payload): ApiJson<ApplyMatrixChangesRequest>,
) -> ApiResult<Json<AppliedMatrixChangesResponse>> {
    let subject = SubjectRef::role(RoleId::from_str(&role_id)?);
    apply_changes(&state, &user, subject, payload).await
}

pub async fn caller_apps_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<CallerAppsResponse>> {
    let apps = state.permission_matrix_service.caller_apps(&user).await?;
    Ok(Json(CallerAppsResponse::from(apps)))
}

async fn subject_matrix(
    state: &AppState,
    user: &UserIdentity,
    resolved: &ResolvedMatrix,
    subject: SubjectRef,
) -> ApiResult<Json<SubjectMatrixResponse>> {
    let view = state
        .permission_matrix_service
        .subject_matrix(user, subject)
        .await?;
    let can_edit = resolved.0.is_granted(AppKey::Admin, ScopeKey::Manage);

    Ok(Json(SubjectMatrixResponse::from_view(view, can_edit)))
}

async fn apply_changes(
    state: &AppState,
    user: &UserIdentity,
    subject: SubjectRef,
    payload: ApplyMatrixChangesRequest,
) -> ApiResult<Json<AppliedMatrixChangesResponse>> {
    let changes = payload
        .changes
        .into_iter()
        .map(GrantChangeInput::from)
        .collect();

    let applied = state
        .permission_matrix_service
        .apply_changes(user, subject, changes)
        .await?;

    Ok(Json(AppliedMatrixChangesResponse::from(applied)))
}

#[cfg(test)]
mod tests;
