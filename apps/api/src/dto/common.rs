use serde::Serialize;
use ts_rs::TS;
use worksuite_core::UserIdentity;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub postgres: HealthDependencyStatus,
    pub permission_schema: HealthDependencyStatus,
}

/// Status of one backing dependency.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-dependency-status.ts"
)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

impl HealthDependencyStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            detail: None,
        }
    }

    pub fn failed(detail: String) -> Self {
        Self {
            status: "error",
            detail: Some(detail),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub user_id: String,
    pub display_name: String,
    pub tenant_id: String,
}

impl From<UserIdentity> for UserIdentityResponse {
    fn from(identity: UserIdentity) -> Self {
        Self {
            user_id: identity.user_id().to_string(),
            display_name: identity.display_name().to_owned(),
            tenant_id: identity.tenant_id().to_string(),
        }
    }
}
