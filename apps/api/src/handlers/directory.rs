use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use worksuite_core::{UserId, UserIdentity};
use worksuite_domain::{RoleId, TeamId};

use crate::dto::{
    AddTeamMemberRequest, CreateRoleRequest, CreateTeamRequest, CreateUserRequest, RoleResponse,
    SetUserRoleRequest, TeamResponse, UserResponse,
};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

mod roles;
mod teams;
mod users;

pub use roles::{create_role_handler, delete_role_handler, list_roles_handler};
pub use teams::{
    add_team_member_handler, create_team_handler, delete_team_handler, list_teams_handler,
    remove_team_member_handler,
};
pub use users::{create_user_handler, list_users_handler, set_user_role_handler};

fn parse_role_id(role_id: Option<&str>) -> ApiResult<Option<RoleId>> {
    Ok(role_id.map(RoleId::from_str).transpose()?)
}
