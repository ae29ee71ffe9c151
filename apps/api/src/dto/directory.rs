use serde::{Deserialize, Serialize};
use ts_rs::TS;
use worksuite_application::{RoleRecord, TeamRecord, UserRecord};

/// Incoming payload for user creation.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-user-request.ts"
)]
pub struct CreateUserRequest {
    pub display_name: String,
    pub role_id: Option<String>,
}

/// Incoming payload for setting or clearing a user's role.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/set-user-role-request.ts"
)]
pub struct SetUserRoleRequest {
    pub role_id: Option<String>,
}

/// API representation of a tenant user.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-response.ts"
)]
pub struct UserResponse {
    pub user_id: String,
    pub display_name: String,
    pub role_id: Option<String>,
}

impl From<UserRecord> for UserResponse {
    fn from(value: UserRecord) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            display_name: value.display_name,
            role_id: value.role_id.map(|role_id| role_id.to_string()),
        }
    }
}

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub is_system: bool,
}

impl From<RoleRecord> for RoleResponse {
    fn from(value: RoleRecord) -> Self {
        Self {
            role_id: value.role_id.to_string(),
            name: value.name,
            is_system: value.is_system,
        }
    }
}

/// Incoming payload for team creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-team-request.ts"
)]
pub struct CreateTeamRequest {
    pub name: String,
}

/// Incoming payload for adding a team member.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/add-team-member-request.ts"
)]
pub struct AddTeamMemberRequest {
    pub user_id: String,
}

/// API representation of a team.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/team-response.ts"
)]
pub struct TeamResponse {
    pub team_id: String,
    pub name: String,
    pub member_ids: Vec<String>,
}

impl From<TeamRecord> for TeamResponse {
    fn from(value: TeamRecord) -> Self {
        Self {
            team_id: value.team_id.to_string(),
            name: value.name,
            member_ids: value
                .member_ids
                .into_iter()
                .map(|user_id| user_id.to_string())
                .collect(),
        }
    }
}
