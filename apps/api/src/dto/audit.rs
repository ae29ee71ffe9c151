use serde::Serialize;
use ts_rs::TS;
use worksuite_application::{AuditEntry, AuditEntryPage};

use super::{GrantDiffResponse, SubjectResponse};

/// API representation of one permission audit entry.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/audit-entry-response.ts"
)]
pub struct AuditEntryResponse {
    pub entry_id: String,
    #[ts(type = "number")]
    pub sequence: i64,
    pub actor_id: String,
    pub target: SubjectResponse,
    pub action: String,
    pub diff: Vec<GrantDiffResponse>,
    pub created_at: String,
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(value: AuditEntry) -> Self {
        Self {
            entry_id: value.entry_id.to_string(),
            sequence: value.sequence,
            actor_id: value.actor_id.to_string(),
            target: value.target.into(),
            action: value.action.as_str().to_owned(),
            diff: value
                .diff
                .into_iter()
                .map(GrantDiffResponse::from)
                .collect(),
            created_at: value.created_at,
        }
    }
}

/// One newest-first page of audit entries.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/audit-entry-page-response.ts"
)]
pub struct AuditEntryPageResponse {
    pub entries: Vec<AuditEntryResponse>,
    pub next_cursor: Option<String>,
}

impl From<AuditEntryPage> for AuditEntryPageResponse {
    fn from(value: AuditEntryPage) -> Self {
        Self {
            entries: value
                .entries
                .into_iter()
                .map(AuditEntryResponse::from)
                .collect(),
            next_cursor: value.next_cursor,
        }
    }
}
