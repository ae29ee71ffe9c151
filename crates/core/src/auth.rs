use serde::{Deserialize, Serialize};

use crate::{TenantId, UserId};

/// Authenticated caller persisted in the session.
///
/// The identity only says who the caller is; what the caller may do is
/// resolved from persisted grants on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: UserId,
    display_name: String,
    tenant_id: TenantId,
}

impl UserIdentity {
    /// Creates a user identity from authentication and tenancy data.
    #[must_use]
    pub fn new(user_id: UserId, display_name: impl Into<String>, tenant_id: TenantId) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            tenant_id,
        }
    }

    /// Returns the authenticated user identifier.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the tenant linked to the identity.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
