//! Domain entities and invariants of the tenant permission matrix.

#![forbid(unsafe_code)]

mod app_key;
mod audit;
mod grant;
mod matrix;
mod resolution;
mod subject;

pub use app_key::{AppKey, ScopeKey};
pub use audit::AuditAction;
pub use grant::{Grant, GrantChange, GrantDiff};
pub use matrix::{AccessDecision, PermissionMatrix, ScopeFlags};
pub use resolution::GrantLayers;
pub use subject::{AuditEntryId, RoleId, SubjectRef, SubjectType, TeamId};
