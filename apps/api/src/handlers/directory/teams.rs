use super::*;

pub async fn list_teams_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<TeamResponse>>> {
    let teams = state
        .directory_service
        .list_teams(&user)
        .await?
        .into_iter()
        .map(TeamResponse::from)
        .collect();

    Ok(Json(teams))
}

pub async fn create_team_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiJson(payload): ApiJson<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    let team = state
        .directory_service
        .create_team(&user, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(team))))
}

pub async fn delete_team_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(team_id): Path<String>,
) -> ApiResult<StatusCode> {
    let team_id = TeamId::from_str(&team_id)?;
    state.directory_service.delete_team(&user, team_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_team_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(team_id): Path<String>,
    ApiJson(payload): ApiJson<AddTeamMemberRequest>,
) -> ApiResult<StatusCode> {
    let team_id = TeamId::from_str(&team_id)?;
    let member_id = UserId::from_str(&payload.user_id)?;
    state
        .directory_service
        .add_team_member(&user, team_id, member_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_team_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((team_id, user_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let team_id = TeamId::from_str(&team_id)?;
    let member_id = UserId::from_str(&user_id)?;
    state
        .directory_service
        .remove_team_member(&user, team_id, member_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
