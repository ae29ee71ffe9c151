use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio::sync::RwLock;

use worksuite_application::{
    AppliedGrantChanges, AuditEntry, AuditEntryQuery, AuditLogRepository, CreateUserInput,
    DirectoryRepository, GrantChangeSet, GrantRepository, RoleRecord, TeamRecord, UserRecord,
};
use worksuite_core::{AppError, AppResult, TenantId, UserId};
use worksuite_domain::{
    AppKey, AuditAction, AuditEntryId, Grant, GrantChange, GrantDiff, RoleId, ScopeKey,
    SubjectRef, SubjectType, TeamId,
};


type GrantKey = (TenantId, SubjectRef, AppKey, ScopeKey);

#[derive(Debug, Clone)]
struct StoredUser {
    tenant_id: TenantId,
    display_name: String,
    role_id: Option<RoleId>,
}

#[derive(Debug, Clone)]
struct StoredRole {
    tenant_id: TenantId,
    name: String,
    is_system: bool,
}

#[derive(Debug, Clone)]
struct StoredTeam {
    tenant_id: TenantId,
    name: String,
}

#[derive(Debug, Clone, Default)]
struct PermissionState {
    tenants: HashMap<TenantId, String>,
    users: HashMap<UserId, StoredUser>,
    roles: HashMap<RoleId, StoredRole>,
    teams: HashMap<TeamId, StoredTeam>,
    memberships: BTreeSet<(TeamId, UserId)>,
    grants: BTreeMap<GrantKey, bool>,
    audit: Vec<(TenantId, AuditEntry)>,
    last_sequence: i64,
}

impl PermissionState {
    fn user(&self, tenant_id: TenantId, user_id: UserId) -> Option<&StoredUser> {
        self.users
            .get(&user_id)
            .filter(|user| user.tenant_id == tenant_id)
    }

    fn role(&self, tenant_id: TenantId, role_id: RoleId) -> Option<&StoredRole> {
        self.roles
            .get(&role_id)
            .filter(|role| role.tenant_id == tenant_id)
    }

    fn team(&self, tenant_id: TenantId, team_id: TeamId) -> Option<&StoredTeam> {
        self.teams
            .get(&team_id)
            .filter(|team| team.tenant_id == tenant_id)
    }

    fn subject_exists(&self, tenant_id: TenantId, subject: SubjectRef) -> bool {
        let id = subject.subject_id();
        match subject.subject_type() {
            SubjectType::User => self.user(tenant_id, UserId::from_uuid(id)).is_some(),
            SubjectType::Role => self.role(tenant_id, RoleId::from_uuid(id)).is_some(),
            SubjectType::Team => self.team(tenant_id, TeamId::from_uuid(id)).is_some(),
        }
    }

    fn team_record(&self, team_id: TeamId, team: &StoredTeam) -> TeamRecord {
        TeamRecord {
            team_id,
            name: team.name.clone(),
            member_ids: self
                .memberships
                .range((team_id, UserId::from_uuid(uuid::Uuid::nil()))..)
                .take_while(|(member_team, _)| *member_team == team_id)
                .map(|(_, user_id)| *user_id)
                .collect(),
        }
    }

    fn drop_subject_grants(&mut self, tenant_id: TenantId, subject: SubjectRef) {
        self.grants.retain(|(owner, stored_subject, _, _), _| {
            !(*owner == tenant_id && *stored_subject == subject)
        });
    }
}

/// In-memory implementation of every permission port.
///
/// Change batches are applied to a staged copy of the state that replaces
/// the live state only after the audit entry was appended.
#[derive(Debug, Default)]
pub struct InMemoryPermissionStore {
    state: RwLock<PermissionState>,
    audit_capacity: Option<usize>,
}

impl InMemoryPermissionStore {
    /// Creates an empty store with an unbounded audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose audit log rejects appends past `capacity`.
    #[must_use]
    pub fn with_audit_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(PermissionState::default()),
            audit_capacity: Some(capacity),
        }
    }

    fn append_audit(
        &self,
        state: &mut PermissionState,
        tenant_id: TenantId,
        entry: AuditEntry,
    ) -> AppResult<()> {
        if self
            .audit_capacity
            .is_some_and(|capacity| state.audit.len() >= capacity)
        {
            return Err(AppError::Persistence(
                "permission audit log is full".to_owned(),
            ));
        }

        state.audit.push((tenant_id, entry));
        Ok(())
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryPermissionStore {
    async fn ensure_tenant(&self, tenant_id: TenantId, name: &str) -> AppResult<()> {
        self.state
            .write()
            .await
            .tenants
            .entry(tenant_id)
            .or_insert_with(|| name.to_owned());
        Ok(())
    }

    async fn find_tenant_for_user(&self, user_id: UserId) -> AppResult<Option<TenantId>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .get(&user_id)
            .map(|user| user.tenant_id))
    }

    async fn find_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<UserRecord>> {
        Ok(self
            .state
            .read()
            .await
            .user(tenant_id, user_id)
            .map(|user| UserRecord {
                user_id,
                display_name: user.display_name.clone(),
                role_id: user.role_id,
            }))
    }

    async fn list_users(&self, tenant_id: TenantId) -> AppResult<Vec<UserRecord>> {
        let state = self.state.read().await;
        let mut users = state
            .users
            .iter()
            .filter(|(_, user)| user.tenant_id == tenant_id)
            .map(|(user_id, user)| UserRecord {
                user_id: *user_id,
                display_name: user.display_name.clone(),
                role_id: user.role_id,
            })
            .collect::<Vec<_>>();
        users.sort_by(|left, right| {
            left.display_name
                .cmp(&right.display_name)
                .then(left.user_id.cmp(&right.user_id))
        });
        Ok(users)
    }

    async fn create_user(
        &self,
        tenant_id: TenantId,
        input: CreateUserInput,
    ) -> AppResult<UserRecord> {
        let user_id = UserId::new();
        self.state.write().await.users.insert(
            user_id,
            StoredUser {
                tenant_id,
                display_name: input.display_name.clone(),
                role_id: input.role_id,
            },
        );

        Ok(UserRecord {
            user_id,
            display_name: input.display_name,
            role_id: input.role_id,
        })
    }

    async fn set_user_role(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        role_id: Option<RoleId>,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user_id) {
            Some(user) if user.tenant_id == tenant_id => {
                user.role_id = role_id;
                Ok(())
            }
            _ => Err(AppError::NotFound(format!("user '{user_id}' was not found"))),
        }
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Option<RoleRecord>> {
        Ok(self
            .state
            .read()
            .await
            .role(tenant_id, role_id)
            .map(|role| RoleRecord {
                role_id,
                name: role.name.clone(),
                is_system: role.is_system,
            }))
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<RoleRecord>> {
        let state = self.state.read().await;
        let mut roles = state
            .roles
            .iter()
            .filter(|(_, role)| role.tenant_id == tenant_id)
            .map(|(role_id, role)| RoleRecord {
                role_id: *role_id,
                name: role.name.clone(),
                is_system: role.is_system,
            })
            .collect::<Vec<_>>();
        roles.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(roles)
    }

    async fn create_role(
        &self,
        tenant_id: TenantId,
        name: &str,
        is_system: bool,
    ) -> AppResult<RoleRecord> {
        let mut state = self.state.write().await;
        if state
            .roles
            .values()
            .any(|role| role.tenant_id == tenant_id && role.name == name)
        {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }

        let role_id = RoleId::new();
        state.roles.insert(
            role_id,
            StoredRole {
                tenant_id,
                name: name.to_owned(),
                is_system,
            },
        );

        Ok(RoleRecord {
            role_id,
            name: name.to_owned(),
            is_system,
        })
    }

    async fn delete_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.role(tenant_id, role_id).is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        state.roles.remove(&role_id);
        state.drop_subject_grants(tenant_id, SubjectRef::role(role_id));
        for user in state.users.values_mut() {
            if user.role_id == Some(role_id) {
                user.role_id = None;
            }
        }

        Ok(())
    }

    async fn find_team(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
    ) -> AppResult<Option<TeamRecord>> {
        let state = self.state.read().await;
        Ok(state
            .team(tenant_id, team_id)
            .map(|team| state.team_record(team_id, team)))
    }

    async fn list_teams(&self, tenant_id: TenantId) -> AppResult<Vec<TeamRecord>> {
        let state = self.state.read().await;
        let mut teams = state
            .teams
            .iter()
            .filter(|(_, team)| team.tenant_id == tenant_id)
            .map(|(team_id, team)| state.team_record(*team_id, team))
            .collect::<Vec<_>>();
        teams.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(teams)
    }

    async fn create_team(&self, tenant_id: TenantId, name: &str) -> AppResult<TeamRecord> {
        let mut state = self.state.write().await;
        if state
            .teams
            .values()
            .any(|team| team.tenant_id == tenant_id && team.name == name)
        {
            return Err(AppError::Conflict(format!("team '{name}' already exists")));
        }

        let team_id = TeamId::new();
        state.teams.insert(
            team_id,
            StoredTeam {
                tenant_id,
                name: name.to_owned(),
            },
        );

        Ok(TeamRecord {
            team_id,
            name: name.to_owned(),
            member_ids: Vec::new(),
        })
    }

    async fn delete_team(&self, tenant_id: TenantId, team_id: TeamId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.team(tenant_id, team_id).is_none() {
            return Err(AppError::NotFound(format!("team '{team_id}' was not found")));
        }

        state.teams.remove(&team_id);
        state
            .memberships
            .retain(|(member_team, _)| *member_team != team_id);
        state.drop_subject_grants(tenant_id, SubjectRef::team(team_id));
        Ok(())
    }

    async fn add_team_member(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.team(tenant_id, team_id).is_none() {
            return Err(AppError::NotFound(format!("team '{team_id}' was not found")));
        }
        if state.user(tenant_id, user_id).is_none() {
            return Err(AppError::NotFound(format!("user '{user_id}' was not found")));
        }

        state.memberships.insert((team_id, user_id));
        Ok(())
    }

    async fn remove_team_member(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.team(tenant_id, team_id).is_none()
            || !state.memberships.remove(&(team_id, user_id))
        {
            return Err(AppError::NotFound(format!(
                "membership '{team_id}:{user_id}' was not found"
            )));
        }

        Ok(())
    }

    async fn list_team_ids_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<TeamId>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|(team_id, member)| {
                *member == user_id && state.team(tenant_id, *team_id).is_some()
            })
            .map(|(team_id, _)| *team_id)
            .collect())
    }
}

#[async_trait]
impl GrantRepository for InMemoryPermissionStore {
    async fn list_grants_for_subjects(
        &self,
        tenant_id: TenantId,
        subjects: &[SubjectRef],
    ) -> AppResult<Vec<Grant>> {
        Ok(self
            .state
            .read()
            .await
            .grants
            .iter()
            .filter(|((owner, subject, _, _), _)| *owner == tenant_id && subjects.contains(subject))
            .map(|((_, subject, app_key, scope_key), enabled)| Grant {
                subject: *subject,
                app_key: *app_key,
                scope_key: *scope_key,
                enabled: *enabled,
            })
            .collect())
    }

    async fn apply_grant_changes(
        &self,
        tenant_id: TenantId,
        change_set: GrantChangeSet,
    ) -> AppResult<AppliedGrantChanges> {
        let target = change_set.target;
        let mut state = self.state.write().await;
        if !state.subject_exists(tenant_id, target) {
            return Err(AppError::NotFound(format!(
                "{} '{}' was not found",
                target.subject_type().as_str(),
                target.subject_id()
            )));
        }

        let mut layer = state
            .grants
            .iter()
            .filter(|((owner, subject, _, _), _)| *owner == tenant_id && *subject == target)
            .map(|((_, _, app_key, scope_key), enabled)| ((*app_key, *scope_key), *enabled))
            .collect::<BTreeMap<_, _>>();
        let diff = GrantDiff::compute(&layer, &change_set.changes);

        let mut staged = state.clone();
        for GrantChange {
            app_key,
            scope_key,
            enabled,
        } in GrantChange::collapse(&change_set.changes)
        {
            layer.insert((app_key, scope_key), enabled);
            staged
                .grants
                .insert((tenant_id, target, app_key, scope_key), enabled);
        }

        staged.last_sequence += 1;
        let entry = AuditEntry {
            entry_id: AuditEntryId::new(),
            sequence: staged.last_sequence,
            actor_id: change_set.actor_id,
            target,
            action: AuditAction::for_target(target.subject_type()),
            diff: diff.clone(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        let audit_entry_id = entry.entry_id;
        self.append_audit(&mut staged, tenant_id, entry)?;

        *state = staged;
        Ok(AppliedGrantChanges {
            audit_entry_id,
            diff,
            grants: layer
                .into_iter()
                .map(|((app_key, scope_key), enabled)| Grant {
                    subject: target,
                    app_key,
                    scope_key,
                    enabled,
                })
                .collect(),
        })
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryPermissionStore {
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: AuditEntryQuery,
    ) -> AppResult<Vec<AuditEntry>> {
        Ok(self
            .state
            .read()
            .await
            .audit
            .iter()
            .rev()
            .filter(|(owner, entry)| {
                *owner == tenant_id
                    && query
                        .before_sequence
                        .is_none_or(|before| entry.sequence < before)
            })
            .take(query.limit)
            .map(|(_, entry)| entry.clone())
            .collect())
    }
}
