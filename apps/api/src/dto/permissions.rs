use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use worksuite_application::{AppliedMatrixChanges, CallerApps, GrantChangeInput, SubjectMatrixView};
use worksuite_domain::{AppKey, Grant, GrantDiff, PermissionMatrix, ScopeFlags, SubjectRef};

/// One requested cell toggle.
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grant-change-request.ts"
)]
pub struct GrantChangeRequest {
    pub app_key: String,
    pub scope_key: String,
    pub enabled: bool,
}

impl From<GrantChangeRequest> for GrantChangeInput {
    fn from(value: GrantChangeRequest) -> Self {
        GrantChangeInput::new(value.app_key, value.scope_key, value.enabled)
    }
}

/// Incoming payload for a matrix change batch.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/apply-matrix-changes-request.ts"
)]
pub struct ApplyMatrixChangesRequest {
    pub changes: Vec<GrantChangeRequest>,
}

/// Scope switches of one app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/scope-flags-response.ts"
)]
pub struct ScopeFlagsResponse {
    pub read: bool,
    pub write: bool,
    pub manage: bool,
}

impl From<ScopeFlags> for ScopeFlagsResponse {
    fn from(value: ScopeFlags) -> Self {
        Self {
            read: value.read,
            write: value.write,
            manage: value.manage,
        }
    }
}

/// Subject a matrix or audit entry refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/subject-response.ts"
)]
pub struct SubjectResponse {
    pub subject_type: String,
    pub subject_id: String,
}

impl From<SubjectRef> for SubjectResponse {
    fn from(value: SubjectRef) -> Self {
        Self {
            subject_type: value.subject_type().as_str().to_owned(),
            subject_id: value.subject_id().to_string(),
        }
    }
}

/// Stored grant row of a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grant-response.ts"
)]
pub struct GrantResponse {
    pub app_key: String,
    pub scope_key: String,
    pub enabled: bool,
}

impl From<Grant> for GrantResponse {
    fn from(value: Grant) -> Self {
        Self {
            app_key: value.app_key.as_str().to_owned(),
            scope_key: value.scope_key.as_str().to_owned(),
            enabled: value.enabled,
        }
    }
}

/// Before/after value of one changed cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grant-diff-response.ts"
)]
pub struct GrantDiffResponse {
    pub app_key: String,
    pub scope_key: String,
    pub old_value: bool,
    pub new_value: bool,
}

impl From<GrantDiff> for GrantDiffResponse {
    fn from(value: GrantDiff) -> Self {
        Self {
            app_key: value.app_key.as_str().to_owned(),
            scope_key: value.scope_key.as_str().to_owned(),
            old_value: value.old_value,
            new_value: value.new_value,
        }
    }
}

/// Matrix view of one subject.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/subject-matrix-response.ts"
)]
pub struct SubjectMatrixResponse {
    pub subject: SubjectResponse,
    pub matrix: BTreeMap<String, ScopeFlagsResponse>,
    pub enabled_apps: Vec<String>,
    pub explicit_grants: Vec<GrantResponse>,
    /// Whether the caller may submit changes for this subject.
    pub can_edit: bool,
}

impl SubjectMatrixResponse {
    #[must_use]
    pub fn from_view(view: SubjectMatrixView, can_edit: bool) -> Self {
        Self {
            subject: view.subject.into(),
            matrix: matrix_response(&view.matrix),
            enabled_apps: app_names(&view.enabled_apps),
            explicit_grants: view
                .explicit_grants
                .into_iter()
                .map(GrantResponse::from)
                .collect(),
            can_edit,
        }
    }
}

/// Outcome of a committed change batch.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/applied-matrix-changes-response.ts"
)]
pub struct AppliedMatrixChangesResponse {
    pub subject: SubjectResponse,
    pub matrix: BTreeMap<String, ScopeFlagsResponse>,
    pub enabled_apps: Vec<String>,
    pub audit_entry_id: String,
    pub diff: Vec<GrantDiffResponse>,
}

impl From<AppliedMatrixChanges> for AppliedMatrixChangesResponse {
    fn from(value: AppliedMatrixChanges) -> Self {
        Self {
            subject: value.subject.into(),
            matrix: matrix_response(&value.matrix),
            enabled_apps: app_names(&value.enabled_apps),
            audit_entry_id: value.audit_entry_id.to_string(),
            diff: value
                .diff
                .into_iter()
                .map(GrantDiffResponse::from)
                .collect(),
        }
    }
}

/// Caller's own matrix for client-side navigation.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/caller-apps-response.ts"
)]
pub struct CallerAppsResponse {
    pub matrix: BTreeMap<String, ScopeFlagsResponse>,
    pub enabled_apps: Vec<String>,
}

impl From<CallerApps> for CallerAppsResponse {
    fn from(value: CallerApps) -> Self {
        Self {
            matrix: matrix_response(&value.matrix),
            enabled_apps: app_names(&value.enabled_apps),
        }
    }
}

fn matrix_response(matrix: &PermissionMatrix) -> BTreeMap<String, ScopeFlagsResponse> {
    matrix
        .iter()
        .map(|(app, flags)| (app.as_str().to_owned(), flags.into()))
        .collect()
}

fn app_names(apps: &[AppKey]) -> Vec<String> {
    apps.iter().map(|app| app.as_str().to_owned()).collect()
}
