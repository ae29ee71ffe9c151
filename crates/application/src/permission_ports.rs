mod audit;
mod directory;
mod grants;

pub use audit::{AuditEntry, AuditEntryQuery, AuditLogRepository};
pub use directory::{CreateUserInput, DirectoryRepository, RoleRecord, TeamRecord, UserRecord};
pub use grants::{AppliedGrantChanges, GrantChangeSet, GrantRepository};
