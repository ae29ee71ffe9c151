//! Infrastructure adapters for the permission ports.

#![forbid(unsafe_code)]

mod in_memory_permission_store;
mod postgres_audit_log_repository;
mod postgres_directory_repository;
mod postgres_grant_repository;

#[cfg(test)]
mod postgres_test_support;

pub use in_memory_permission_store::InMemoryPermissionStore;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_directory_repository::PostgresDirectoryRepository;
pub use postgres_grant_repository::PostgresGrantRepository;
