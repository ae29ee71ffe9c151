use std::str::FromStr;

use axum::Json;
use axum::extract::State;
use tower_sessions::Session;
use worksuite_core::{AppError, UserId};

use crate::dto::{BootstrapRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

use super::SESSION_USER_KEY;

pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    ApiJson(payload): ApiJson<BootstrapRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let user_id = UserId::from_str(payload.user_id.trim())?;
    let identity = state.directory_service.identity_for(user_id).await?;

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    tracing::info!(
        tenant_id = %identity.tenant_id(),
        user_id = %identity.user_id(),
        "bootstrapped session"
    );

    Ok(Json(UserIdentityResponse::from(identity)))
}
