use worksuite_application::{
    AuditEntryQuery, AuditLogRepository, CreateUserInput, DirectoryRepository, GrantChangeSet,
    GrantRepository,
};
use worksuite_core::{AppError, UserId};
use worksuite_domain::{AppKey, GrantChange, GrantDiff, ScopeKey, SubjectRef, TeamId};

use crate::PostgresAuditLogRepository;
use crate::postgres_test_support::{fresh_tenant, test_pool};

use super::PostgresGrantRepository;

fn change(app_key: AppKey, scope_key: ScopeKey, enabled: bool) -> GrantChange {
    GrantChange {
        app_key,
        scope_key,
        enabled,
    }
}

#[tokio::test]
async fn apply_upserts_and_records_audit_entry() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let (tenant_id, directory) = fresh_tenant(&pool, "Grant Tenant").await;
    let grants = PostgresGrantRepository::new(pool.clone());
    let audit = PostgresAuditLogRepository::new(pool.clone());

    let Ok(user) = directory
        .create_user(
            tenant_id,
            CreateUserInput {
                display_name: "Ada".to_owned(),
                role_id: None,
            },
        )
        .await
    else {
        panic!("user creation failed");
    };
    let target = SubjectRef::user(user.user_id);
    let batch = GrantChangeSet {
        actor_id: user.user_id,
        target,
        changes: vec![
            change(AppKey::Crm, ScopeKey::Write, false),
            change(AppKey::Crm, ScopeKey::Write, true),
        ],
    };

    let first = grants.apply_grant_changes(tenant_id, batch.clone()).await;
    let Ok(first) = first else {
        panic!("first apply failed: {first:?}");
    };
    assert_eq!(
        first.diff,
        vec![GrantDiff {
            app_key: AppKey::Crm,
            scope_key: ScopeKey::Write,
            old_value: false,
            new_value: true,
        }]
    );

    let second = grants.apply_grant_changes(tenant_id, batch).await;
    assert!(second.is_ok_and(|second| second.diff.is_empty()));

    let stored = grants.list_grants_for_subjects(tenant_id, &[target]).await;
    let Ok(stored) = stored else {
        panic!("listing failed: {stored:?}");
    };
    assert_eq!(stored.len(), 1);
    assert!(stored[0].enabled);
    assert_eq!(first.grants, stored);

    let entries = audit
        .list_entries(
            tenant_id,
            AuditEntryQuery {
                limit: 10,
                before_sequence: None,
            },
        )
        .await;
    let Ok(entries) = entries else {
        panic!("audit listing failed: {entries:?}");
    };
    assert_eq!(entries.len(), 2);
    assert!(entries[0].sequence > entries[1].sequence);
    assert!(entries[0].diff.is_empty());
    assert_eq!(entries[1].entry_id, first.audit_entry_id);
    assert_eq!(entries[1].action.as_str(), "permissions.user.updated");
}

#[tokio::test]
async fn foreign_target_is_not_found_and_writes_nothing() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let (tenant_id, _) = fresh_tenant(&pool, "Grant Tenant A").await;
    let (other_tenant, other_directory) = fresh_tenant(&pool, "Grant Tenant B").await;
    let grants = PostgresGrantRepository::new(pool.clone());
    let audit = PostgresAuditLogRepository::new(pool.clone());

    let Ok(team) = other_directory.create_team(other_tenant, "Foreign").await else {
        panic!("team creation failed");
    };

    let result = grants
        .apply_grant_changes(
            tenant_id,
            GrantChangeSet {
                actor_id: UserId::new(),
                target: SubjectRef::team(team.team_id),
                changes: vec![change(AppKey::Files, ScopeKey::Read, true)],
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let missing = grants
        .apply_grant_changes(
            tenant_id,
            GrantChangeSet {
                actor_id: UserId::new(),
                target: SubjectRef::team(TeamId::new()),
                changes: Vec::new(),
            },
        )
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let entries = audit
        .list_entries(
            tenant_id,
            AuditEntryQuery {
                limit: 10,
                before_sequence: None,
            },
        )
        .await;
    assert!(entries.is_ok_and(|entries| entries.is_empty()));
}

#[tokio::test]
async fn listing_only_returns_requested_subjects() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let (tenant_id, directory) = fresh_tenant(&pool, "Grant Tenant C").await;
    let grants = PostgresGrantRepository::new(pool.clone());

    let Ok(role) = directory.create_role(tenant_id, "Member", false).await else {
        panic!("role creation failed");
    };
    let Ok(team) = directory.create_team(tenant_id, "Sales").await else {
        panic!("team creation failed");
    };

    for (target, app_key) in [
        (SubjectRef::role(role.role_id), AppKey::Crm),
        (SubjectRef::team(team.team_id), AppKey::Kanban),
    ] {
        let applied = grants
            .apply_grant_changes(
                tenant_id,
                GrantChangeSet {
                    actor_id: UserId::new(),
                    target,
                    changes: vec![change(app_key, ScopeKey::Read, true)],
                },
            )
            .await;
        assert!(applied.is_ok());
    }

    let role_only = grants
        .list_grants_for_subjects(tenant_id, &[SubjectRef::role(role.role_id)])
        .await;
    assert_eq!(
        role_only
            .ok()
            .map(|grants| grants.iter().map(|grant| grant.app_key).collect::<Vec<_>>()),
        Some(vec![AppKey::Crm])
    );

    let none = grants.list_grants_for_subjects(tenant_id, &[]).await;
    assert!(none.is_ok_and(|grants| grants.is_empty()));
}
