use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AppKey, ScopeKey, SubjectRef};

/// One persisted `(subject, app, scope) -> enabled` fact.
///
/// A missing grant row is equivalent to `enabled = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    /// Subject owning the grant.
    pub subject: SubjectRef,
    /// Governed app.
    pub app_key: AppKey,
    /// Governed scope.
    pub scope_key: ScopeKey,
    /// Whether the cell is switched on for the subject.
    pub enabled: bool,
}

/// A requested cell toggle inside a change batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantChange {
    /// Governed app.
    pub app_key: AppKey,
    /// Governed scope.
    pub scope_key: ScopeKey,
    /// New value for the cell.
    pub enabled: bool,
}

impl GrantChange {
    /// Collapses a batch so every cell appears once; later entries win.
    ///
    /// The result is ordered by app, then scope.
    #[must_use]
    pub fn collapse(changes: &[Self]) -> Vec<Self> {
        let mut by_cell = BTreeMap::new();
        for change in changes {
            by_cell.insert((change.app_key, change.scope_key), change.enabled);
        }

        by_cell
            .into_iter()
            .map(|((app_key, scope_key), enabled)| Self {
                app_key,
                scope_key,
                enabled,
            })
            .collect()
    }
}

/// Before/after value of one cell touched by a change batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantDiff {
    /// Governed app.
    pub app_key: AppKey,
    /// Governed scope.
    pub scope_key: ScopeKey,
    /// Stored value before the batch.
    pub old_value: bool,
    /// Stored value after the batch.
    pub new_value: bool,
}

impl GrantDiff {
    /// Computes the cells a batch actually changes on one subject's grant layer.
    ///
    /// `stored` holds the subject's current rows; cells absent from it are
    /// `false`. Cells whose value does not change are omitted.
    #[must_use]
    pub fn compute(
        stored: &BTreeMap<(AppKey, ScopeKey), bool>,
        changes: &[GrantChange],
    ) -> Vec<Self> {
        GrantChange::collapse(changes)
            .into_iter()
            .filter_map(|change| {
                let old_value = stored
                    .get(&(change.app_key, change.scope_key))
                    .copied()
                    .unwrap_or(false);
                (old_value != change.enabled).then_some(Self {
                    app_key: change.app_key,
                    scope_key: change.scope_key,
                    old_value,
                    new_value: change.enabled,
                })
            })
            .collect()
    }
}
