use std::str::FromStr;

use serde::{Deserialize, Serialize};
use worksuite_core::AppError;

use crate::SubjectType;

/// Stable audit actions recorded by matrix writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A user's direct grants were changed.
    PermissionsUserUpdated,
    /// A team's grants were changed.
    PermissionsTeamUpdated,
    /// A role's default grants were changed.
    PermissionsRoleUpdated,
}

impl AuditAction {
    /// Returns the action recorded for a write against the given subject type.
    #[must_use]
    pub fn for_target(subject_type: SubjectType) -> Self {
        match subject_type {
            SubjectType::User => Self::PermissionsUserUpdated,
            SubjectType::Team => Self::PermissionsTeamUpdated,
            SubjectType::Role => Self::PermissionsRoleUpdated,
        }
    }

    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionsUserUpdated => "permissions.user.updated",
            Self::PermissionsTeamUpdated => "permissions.team.updated",
            Self::PermissionsRoleUpdated => "permissions.role.updated",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "permissions.user.updated" => Ok(Self::PermissionsUserUpdated),
            "permissions.team.updated" => Ok(Self::PermissionsTeamUpdated),
            "permissions.role.updated" => Ok(Self::PermissionsRoleUpdated),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}
