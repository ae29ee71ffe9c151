use sqlx::PgPool;
use uuid::Uuid;
use worksuite_application::{
    CreateUserInput, DirectoryRepository, GrantChangeSet, GrantRepository, RoleRecord, UserRecord,
};
use worksuite_core::{AppResult, TenantId, UserId};
use worksuite_domain::{AppKey, GrantChange, RoleId, ScopeKey, SubjectRef};
use worksuite_infrastructure::{PostgresDirectoryRepository, PostgresGrantRepository};

const DEV_SEED_TENANT_ID: Uuid = Uuid::from_u128(0x1111_1111_1111_1111_1111_1111_1111_1111);
const DEV_SEED_TENANT_NAME: &str = "Development Tenant";
const OWNER_ROLE_NAME: &str = "Owner";
const MEMBER_ROLE_NAME: &str = "Member";
pub(crate) const ADMIN_DISPLAY_NAME: &str = "Dev Admin";
pub(crate) const MEMBER_DISPLAY_NAME: &str = "Dev Member";

/// Identifiers of the seeded development tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededTenant {
    pub tenant_id: TenantId,
    pub owner_role_id: RoleId,
    pub member_role_id: RoleId,
    pub admin_user_id: UserId,
    pub member_user_id: UserId,
}

pub async fn run(pool: PgPool) -> AppResult<SeededTenant> {
    let directory = PostgresDirectoryRepository::new(pool.clone());
    let grants = PostgresGrantRepository::new(pool);

    let seeded = seed_tenant(
        &directory,
        &grants,
        TenantId::from_uuid(DEV_SEED_TENANT_ID),
    )
    .await?;

    tracing::info!(
        tenant_id = %seeded.tenant_id,
        owner_role_id = %seeded.owner_role_id,
        member_role_id = %seeded.member_role_id,
        admin_user_id = %seeded.admin_user_id,
        member_user_id = %seeded.member_user_id,
        "seeded development tenant"
    );
    Ok(seeded)
}

/// Seeds an Owner and a Member role plus one user of each.
///
/// Re-running is a no-op: existing roles and users are matched by name and
/// role defaults are only written when the role is created.
pub async fn seed_tenant(
    directory: &dyn DirectoryRepository,
    grants: &dyn GrantRepository,
    tenant_id: TenantId,
) -> AppResult<SeededTenant> {
    directory
        .ensure_tenant(tenant_id, DEV_SEED_TENANT_NAME)
        .await?;

    let (owner_role, owner_created) =
        ensure_role(directory, tenant_id, OWNER_ROLE_NAME, true).await?;
    let (member_role, member_created) =
        ensure_role(directory, tenant_id, MEMBER_ROLE_NAME, false).await?;

    let admin = ensure_user(directory, tenant_id, ADMIN_DISPLAY_NAME, owner_role.role_id).await?;
    let member = ensure_user(
        directory,
        tenant_id,
        MEMBER_DISPLAY_NAME,
        member_role.role_id,
    )
    .await?;

    if owner_created {
        let changes = AppKey::all()
            .iter()
            .flat_map(|app_key| {
                ScopeKey::all().iter().map(|scope_key| GrantChange {
                    app_key: *app_key,
                    scope_key: *scope_key,
                    enabled: true,
                })
            })
            .collect();
        seed_role_defaults(
            grants,
            tenant_id,
            admin.user_id,
            owner_role.role_id,
            changes,
        )
        .await?;
    }

    if member_created {
        let changes = vec![GrantChange {
            app_key: AppKey::Crm,
            scope_key: ScopeKey::Read,
            enabled: true,
        }];
        seed_role_defaults(
            grants,
            tenant_id,
            admin.user_id,
            member_role.role_id,
            changes,
        )
        .await?;
    }

    Ok(SeededTenant {
        tenant_id,
        owner_role_id: owner_role.role_id,
        member_role_id: member_role.role_id,
        admin_user_id: admin.user_id,
        member_user_id: member.user_id,
    })
}

async fn ensure_role(
    directory: &dyn DirectoryRepository,
    tenant_id: TenantId,
    name: &str,
    is_system: bool,
) -> AppResult<(RoleRecord, bool)> {
    let existing = directory
        .list_roles(tenant_id)
        .await?
        .into_iter()
        .find(|role| role.name == name);

    match existing {
        Some(role) => Ok((role, false)),
        None => Ok((
            directory.create_role(tenant_id, name, is_system).await?,
            true,
        )),
    }
}

async fn ensure_user(
    directory: &dyn DirectoryRepository,
    tenant_id: TenantId,
    display_name: &str,
    role_id: RoleId,
) -> AppResult<UserRecord> {
    let existing = directory
        .list_users(tenant_id)
        .await?
        .into_iter()
        .find(|user| user.display_name == display_name);

    match existing {
        Some(user) => Ok(user),
        None => {
            directory
                .create_user(
                    tenant_id,
                    CreateUserInput {
                        display_name: display_name.to_owned(),
                        role_id: Some(role_id),
                    },
                )
                .await
        }
    }
}

async fn seed_role_defaults(
    grants: &dyn GrantRepository,
    tenant_id: TenantId,
    actor_id: UserId,
    role_id: RoleId,
    changes: Vec<GrantChange>,
) -> AppResult<()> {
    grants
        .apply_grant_changes(
            tenant_id,
            GrantChangeSet {
                actor_id,
                target: SubjectRef::role(role_id),
                changes,
            },
        )
        .await?;

    Ok(())
}
