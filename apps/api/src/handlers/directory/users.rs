use super::*;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .directory_service
        .list_users(&user)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let role_id = parse_role_id(payload.role_id.as_deref())?;
    let created = state
        .directory_service
        .create_user(&user, &payload.display_name, role_id)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

pub async fn set_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    ApiJson(payload): ApiJson<SetUserRoleRequest>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::from_str(&user_id)?;
    let role_id = parse_role_id(payload.role_id.as_deref())?;
    state
        .directory_service
        .set_user_role(&user, user_id, role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
