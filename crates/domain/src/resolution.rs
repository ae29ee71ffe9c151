use crate::{Grant, PermissionMatrix};

/// Grant layers contributing to one user's effective matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantLayers {
    /// Default grants of the user's role, if any.
    pub role_defaults: Vec<Grant>,
    /// Grants of every team the user belongs to.
    pub team_grants: Vec<Grant>,
    /// Grants stored directly on the user.
    pub user_overrides: Vec<Grant>,
}

impl GrantLayers {
    /// Resolves the effective matrix.
    ///
    /// Precedence, per cell:
    /// 1. role defaults seed the cell,
    /// 2. an explicit user grant (enabled or disabled) replaces the role value,
    /// 3. any enabled team grant turns the cell on; teams never turn a cell off
    ///    and a user-level `false` does not suppress them,
    /// 4. `manage => write => read` is enforced on the result.
    #[must_use]
    pub fn resolve(&self) -> PermissionMatrix {
        let mut matrix = PermissionMatrix::empty();

        for grant in &self.role_defaults {
            matrix.set(grant.app_key, grant.scope_key, grant.enabled);
        }

        for grant in &self.user_overrides {
            matrix.set(grant.app_key, grant.scope_key, grant.enabled);
        }

        for grant in self.team_grants.iter().filter(|grant| grant.enabled) {
            matrix.set(grant.app_key, grant.scope_key, true);
        }

        matrix.normalize();
        matrix
    }
}
