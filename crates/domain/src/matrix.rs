use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use worksuite_core::ForbiddenReason;

use crate::{AppKey, Grant, ScopeKey};

/// Scope switches for one app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFlags {
    /// Read access.
    pub read: bool,
    /// Write access.
    pub write: bool,
    /// Manage access.
    pub manage: bool,
}

impl ScopeFlags {
    /// Returns the value of one scope.
    #[must_use]
    pub fn get(&self, scope: ScopeKey) -> bool {
        match scope {
            ScopeKey::Read => self.read,
            ScopeKey::Write => self.write,
            ScopeKey::Manage => self.manage,
        }
    }

    /// Sets the value of one scope.
    pub fn set(&mut self, scope: ScopeKey, value: bool) {
        match scope {
            ScopeKey::Read => self.read = value,
            ScopeKey::Write => self.write = value,
            ScopeKey::Manage => self.manage = value,
        }
    }

    /// Returns whether any scope is enabled.
    #[must_use]
    pub fn any(&self) -> bool {
        self.read || self.write || self.manage
    }

    /// Applies the fixed cascade `manage => write => read`.
    pub fn normalize(&mut self) {
        if self.manage {
            self.write = true;
        }
        if self.write {
            self.read = true;
        }
    }
}

/// Outcome of checking one `(app, scope)` pair against a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The cell is enabled.
    Allowed,
    /// The cell is disabled or unknown.
    Denied(ForbiddenReason),
}

impl AccessDecision {
    /// Returns whether access was granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Full app x scope boolean grid for one subject.
///
/// Every known app is always present; absent grants read as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix {
    apps: BTreeMap<AppKey, ScopeFlags>,
}

impl Default for PermissionMatrix {
    fn default() -> Self {
        Self::empty()
    }
}

impl PermissionMatrix {
    /// Creates a fully populated all-`false` matrix.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            apps: AppKey::all()
                .iter()
                .map(|app| (*app, ScopeFlags::default()))
                .collect(),
        }
    }

    /// Builds the normalized matrix of a single grant layer.
    #[must_use]
    pub fn from_grants<'a>(grants: impl IntoIterator<Item = &'a Grant>) -> Self {
        let mut matrix = Self::empty();
        for grant in grants {
            matrix.set(grant.app_key, grant.scope_key, grant.enabled);
        }
        matrix.normalize();
        matrix
    }

    /// Returns the switches of one app.
    #[must_use]
    pub fn flags(&self, app: AppKey) -> ScopeFlags {
        self.apps.get(&app).copied().unwrap_or_default()
    }

    /// Returns whether a cell is enabled.
    #[must_use]
    pub fn is_granted(&self, app: AppKey, scope: ScopeKey) -> bool {
        self.flags(app).get(scope)
    }

    /// Overwrites one cell.
    pub fn set(&mut self, app: AppKey, scope: ScopeKey, value: bool) {
        self.apps.entry(app).or_default().set(scope, value);
    }

    /// Applies the `manage => write => read` cascade to every app.
    pub fn normalize(&mut self) {
        for flags in self.apps.values_mut() {
            flags.normalize();
        }
    }

    /// Returns apps with at least one enabled scope, in matrix order.
    #[must_use]
    pub fn enabled_apps(&self) -> Vec<AppKey> {
        self.apps
            .iter()
            .filter_map(|(app, flags)| flags.any().then_some(*app))
            .collect()
    }

    /// Iterates apps and their switches in matrix order.
    pub fn iter(&self) -> impl Iterator<Item = (AppKey, ScopeFlags)> + '_ {
        self.apps.iter().map(|(app, flags)| (*app, *flags))
    }

    /// Checks a typed cell.
    #[must_use]
    pub fn evaluate(&self, app: AppKey, scope: ScopeKey) -> AccessDecision {
        let flags = self.flags(app);
        if flags.get(scope) {
            AccessDecision::Allowed
        } else if flags.any() {
            AccessDecision::Denied(ForbiddenReason::Scope)
        } else {
            AccessDecision::Denied(ForbiddenReason::App)
        }
    }

    /// Checks a cell named by transport keys, failing closed.
    ///
    /// Unknown app keys deny with [`ForbiddenReason::App`]; unknown scope keys
    /// deny with [`ForbiddenReason::Scope`] when the app is otherwise usable.
    #[must_use]
    pub fn evaluate_keys(&self, app_key: &str, scope_key: &str) -> AccessDecision {
        let Ok(app) = AppKey::from_str(app_key) else {
            return AccessDecision::Denied(ForbiddenReason::App);
        };

        match ScopeKey::from_str(scope_key) {
            Ok(scope) => self.evaluate(app, scope),
            Err(_) if self.flags(app).any() => AccessDecision::Denied(ForbiddenReason::Scope),
            Err(_) => AccessDecision::Denied(ForbiddenReason::App),
        }
    }
}
