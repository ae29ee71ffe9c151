use serde::Deserialize;
use ts_rs::TS;

/// Incoming payload for development session bootstrap.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bootstrap-request.ts"
)]
pub struct BootstrapRequest {
    pub token: String,
    pub user_id: String,
}
