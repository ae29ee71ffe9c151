use super::*;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .directory_service
        .list_roles(&user)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiJson(payload): ApiJson<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .directory_service
        .create_role(&user, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::from_str(&role_id)?;
    state.directory_service.delete_role(&user, role_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
