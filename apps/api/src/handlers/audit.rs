use axum::Json;
use axum::extract::{Extension, State};
use serde::Deserialize;
use worksuite_core::UserIdentity;

use crate::dto::AuditEntryPageResponse;
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AuditEntriesQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

pub async fn list_audit_entries_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ApiQuery(query): ApiQuery<AuditEntriesQuery>,
) -> ApiResult<Json<AuditEntryPageResponse>> {
    let page = state
        .audit_service
        .list_entries(&user, query.limit, query.cursor.as_deref())
        .await?;

    Ok(Json(AuditEntryPageResponse::from(page)))
}
