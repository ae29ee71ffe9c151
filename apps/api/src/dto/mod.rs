mod audit;
mod auth;
mod common;
mod directory;
pub(crate) mod permissions;

pub use audit::AuditEntryPageResponse;
pub use auth::BootstrapRequest;
pub use common::{HealthDependencyStatus, HealthResponse, UserIdentityResponse};
pub use directory::{
    AddTeamMemberRequest, CreateRoleRequest, CreateTeamRequest, CreateUserRequest, RoleResponse,
    SetUserRoleRequest, TeamResponse, UserResponse,
};
pub use permissions::{
    AppliedMatrixChangesResponse, ApplyMatrixChangesRequest, CallerAppsResponse,
    GrantDiffResponse, SubjectMatrixResponse, SubjectResponse,
};
