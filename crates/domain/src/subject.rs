use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use worksuite_core::{AppError, UserId};

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value).map(Self).map_err(|error| {
                    let message = format!(concat!("invalid ", $label, " '{}': {}"), value, error);
                    AppError::Validation(message)
                })
            }
        }
    };
}

uuid_identifier!(
    /// Role identifier.
    RoleId,
    "role id"
);
uuid_identifier!(
    /// Team identifier.
    TeamId,
    "team id"
);
uuid_identifier!(
    /// Audit entry identifier.
    AuditEntryId,
    "audit entry id"
);

/// Kind of subject a grant is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// Role defaults shared by every user holding the role.
    Role,
    /// Direct grants on one user.
    User,
    /// Grants shared by every member of a team.
    Team,
}

impl SubjectType {
    /// Returns a stable storage value for this subject type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::User => "user",
            Self::Team => "team",
        }
    }
}

impl FromStr for SubjectType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "role" => Ok(Self::Role),
            "user" => Ok(Self::User),
            "team" => Ok(Self::Team),
            _ => Err(AppError::Validation(format!(
                "unknown subject type '{value}'"
            ))),
        }
    }
}

impl Display for SubjectType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Reference to the role, user or team owning a set of grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRef {
    subject_type: SubjectType,
    subject_id: Uuid,
}

impl SubjectRef {
    /// Creates a reference from raw parts.
    #[must_use]
    pub fn new(subject_type: SubjectType, subject_id: Uuid) -> Self {
        Self {
            subject_type,
            subject_id,
        }
    }

    /// References a user's direct grants.
    #[must_use]
    pub fn user(user_id: UserId) -> Self {
        Self::new(SubjectType::User, user_id.as_uuid())
    }

    /// References a team's grants.
    #[must_use]
    pub fn team(team_id: TeamId) -> Self {
        Self::new(SubjectType::Team, team_id.as_uuid())
    }

    /// References a role's default grants.
    #[must_use]
    pub fn role(role_id: RoleId) -> Self {
        Self::new(SubjectType::Role, role_id.as_uuid())
    }

    /// Returns the subject type.
    #[must_use]
    pub fn subject_type(&self) -> SubjectType {
        self.subject_type
    }

    /// Returns the subject identifier.
    #[must_use]
    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }
}

impl Display for SubjectRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.subject_type, self.subject_id)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use worksuite_core::UserId;

    use super::{SubjectRef, SubjectType, TeamId};

    #[test]
    fn subject_ref_formats_type_and_id() {
        let team_id = TeamId::new();
        let subject = SubjectRef::team(team_id);
        assert_eq!(subject.to_string(), format!("team:{team_id}"));
    }

    #[test]
    fn user_subject_keeps_uuid() {
        let user_id = UserId::new();
        let subject = SubjectRef::user(user_id);
        assert_eq!(subject.subject_type(), SubjectType::User);
        assert_eq!(subject.subject_id(), user_id.as_uuid());
    }

    #[test]
    fn malformed_team_id_is_a_validation_error() {
        let parsed = TeamId::from_str("42");
        let Err(worksuite_core::AppError::Validation(message)) = parsed else {
            panic!("expected validation error");
        };
        assert!(message.starts_with("invalid team id"));
    }
}
