//! Application services and ports for the tenant permission matrix.

#![forbid(unsafe_code)]

mod access_gate;
mod audit_service;
mod directory_service;
mod permission_matrix_service;
mod permission_ports;
mod permission_resolver;

#[cfg(test)]
mod test_fakes;

pub use access_gate::AccessGate;
pub use audit_service::{
    AuditEntryPage, AuditService, DEFAULT_AUDIT_PAGE_SIZE, MAX_AUDIT_PAGE_SIZE,
};
pub use directory_service::DirectoryService;
pub use permission_matrix_service::{
    AppliedMatrixChanges, CallerApps, GrantChangeInput, PermissionMatrixService,
    SubjectMatrixView, validate_changes,
};
pub use permission_ports::{
    AppliedGrantChanges, AuditEntry, AuditEntryQuery, AuditLogRepository, CreateUserInput,
    DirectoryRepository, GrantChangeSet, GrantRepository, RoleRecord, TeamRecord, UserRecord,
};
pub use permission_resolver::PermissionResolver;
