use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use worksuite_core::{AppError, AppResult, TenantId, UserId};
use worksuite_domain::{
    AppKey, AuditAction, AuditEntryId, Grant, GrantChange, GrantDiff, RoleId, ScopeKey,
    SubjectRef, TeamId,
};

use crate::{
    AppliedGrantChanges, AuditEntry, AuditEntryQuery, AuditLogRepository, CreateUserInput,
    DirectoryRepository, GrantChangeSet, GrantRepository, RoleRecord, TeamRecord, UserRecord,
};

pub(crate) fn grant(
    subject: SubjectRef,
    app_key: AppKey,
    scope_key: ScopeKey,
    enabled: bool,
) -> Grant {
    Grant {
        subject,
        app_key,
        scope_key,
        enabled,
    }
}

#[derive(Default)]
struct FakeState {
    users: HashMap<UserId, (TenantId, UserRecord)>,
    roles: HashMap<RoleId, (TenantId, RoleRecord)>,
    teams: HashMap<TeamId, (TenantId, TeamRecord)>,
    grants: BTreeMap<(TenantId, SubjectRef, AppKey, ScopeKey), bool>,
    audit: Vec<(TenantId, AuditEntry)>,
    fail_audit_writes: bool,
}

/// Single fake backing every port, so tests observe one consistent state.
///
/// Only what the service tests touch is stored; the remaining port methods
/// answer with empty results.
#[derive(Default)]
pub(crate) struct FakeStore {
    state: Mutex<FakeState>,
}

impl FakeStore {
    pub(crate) async fn add_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        role_id: Option<RoleId>,
    ) {
        self.state.lock().await.users.insert(
            user_id,
            (
                tenant_id,
                UserRecord {
                    user_id,
                    display_name: format!("user {user_id}"),
                    role_id,
                },
            ),
        );
    }

    pub(crate) async fn add_role(&self, tenant_id: TenantId, role_id: RoleId, name: &str) {
        self.state.lock().await.roles.insert(
            role_id,
            (
                tenant_id,
                RoleRecord {
                    role_id,
                    name: name.to_owned(),
                    is_system: false,
                },
            ),
        );
    }

    pub(crate) async fn add_team(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
        name: &str,
        member_ids: Vec<UserId>,
    ) {
        self.state.lock().await.teams.insert(
            team_id,
            (
                tenant_id,
                TeamRecord {
                    team_id,
                    name: name.to_owned(),
                    member_ids,
                },
            ),
        );
    }

    pub(crate) async fn remove_member(&self, team_id: TeamId, user_id: UserId) {
        if let Some((_, team)) = self.state.lock().await.teams.get_mut(&team_id) {
            team.member_ids.retain(|member| *member != user_id);
        }
    }

    pub(crate) async fn put_grant(&self, tenant_id: TenantId, grant: Grant) {
        self.state.lock().await.grants.insert(
            (tenant_id, grant.subject, grant.app_key, grant.scope_key),
            grant.enabled,
        );
    }

    pub(crate) async fn fail_audit_writes(&self) {
        self.state.lock().await.fail_audit_writes = true;
    }

    pub(crate) async fn audit_entries(&self, tenant_id: TenantId) -> Vec<AuditEntry> {
        self.state
            .lock()
            .await
            .audit
            .iter()
            .filter(|(owner, _)| *owner == tenant_id)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    pub(crate) async fn grant_count(&self) -> usize {
        self.state.lock().await.grants.len()
    }
}

#[async_trait]
impl DirectoryRepository for FakeStore {
    async fn ensure_tenant(&self, _tenant_id: TenantId, _name: &str) -> AppResult<()> {
        Ok(())
    }

    async fn find_tenant_for_user(&self, user_id: UserId) -> AppResult<Option<TenantId>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .get(&user_id)
            .map(|(tenant_id, _)| *tenant_id))
    }

    async fn find_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<UserRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .get(&user_id)
            .filter(|(owner, _)| *owner == tenant_id)
            .map(|(_, user)| user.clone()))
    }

    async fn list_users(&self, _tenant_id: TenantId) -> AppResult<Vec<UserRecord>> {
        Ok(Vec::new())
    }

    async fn create_user(
        &self,
        tenant_id: TenantId,
        input: CreateUserInput,
    ) -> AppResult<UserRecord> {
        let user = UserRecord {
            user_id: UserId::new(),
            display_name: input.display_name,
            role_id: input.role_id,
        };
        self.state
            .lock()
            .await
            .users
            .insert(user.user_id, (tenant_id, user.clone()));
        Ok(user)
    }

    async fn set_user_role(
        &self,
        _tenant_id: TenantId,
        _user_id: UserId,
        _role_id: Option<RoleId>,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Option<RoleRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .get(&role_id)
            .filter(|(owner, _)| *owner == tenant_id)
            .map(|(_, role)| role.clone()))
    }

    async fn list_roles(&self, _tenant_id: TenantId) -> AppResult<Vec<RoleRecord>> {
        Ok(Vec::new())
    }

    async fn create_role(
        &self,
        tenant_id: TenantId,
        name: &str,
        is_system: bool,
    ) -> AppResult<RoleRecord> {
        let role = RoleRecord {
            role_id: RoleId::new(),
            name: name.to_owned(),
            is_system,
        };
        self.state
            .lock()
            .await
            .roles
            .insert(role.role_id, (tenant_id, role.clone()));
        Ok(role)
    }

    async fn delete_role(&self, _tenant_id: TenantId, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.roles.remove(&role_id);
        state
            .grants
            .retain(|(_, subject, _, _), _| *subject != SubjectRef::role(role_id));
        for (_, user) in state.users.values_mut() {
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
        Ok(self
            .state
            .lock()
            .await
            .teams
            .get(&team_id)
            .filter(|(owner, _)| *owner == tenant_id)
            .map(|(_, team)| team.clone()))
    }

    async fn list_teams(&self, _tenant_id: TenantId) -> AppResult<Vec<TeamRecord>> {
        Ok(Vec::new())
    }

    async fn create_team(&self, _tenant_id: TenantId, name: &str) -> AppResult<TeamRecord> {
        Ok(TeamRecord {
            team_id: TeamId::new(),
            name: name.to_owned(),
            member_ids: Vec::new(),
        })
    }

    async fn delete_team(&self, _tenant_id: TenantId, _team_id: TeamId) -> AppResult<()> {
        Ok(())
    }

    async fn add_team_member(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()> {
        match self.state.lock().await.teams.get_mut(&team_id) {
            Some((owner, team)) if *owner == tenant_id => {
                if !team.member_ids.contains(&user_id) {
                    team.member_ids.push(user_id);
                }
                Ok(())
            }
            _ => Err(AppError::NotFound(format!("team '{team_id}' was not found"))),
        }
    }

    async fn remove_team_member(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()> {
        match self.state.lock().await.teams.get_mut(&team_id) {
            Some((owner, team)) if *owner == tenant_id && team.member_ids.contains(&user_id) => {
                team.member_ids.retain(|member| *member != user_id);
                Ok(())
            }
            _ => Err(AppError::NotFound(format!(
                "membership '{team_id}:{user_id}' was not found"
            ))),
        }
    }

    async fn list_team_ids_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<TeamId>> {
        Ok(self
            .state
            .lock()
            .await
            .teams
            .values()
            .filter(|(owner, team)| *owner == tenant_id && team.member_ids.contains(&user_id))
            .map(|(_, team)| team.team_id)
            .collect())
    }
}

#[async_trait]
impl GrantRepository for FakeStore {
    async fn list_grants_for_subjects(
        &self,
        tenant_id: TenantId,
        subjects: &[SubjectRef],
    ) -> AppResult<Vec<Grant>> {
        Ok(self
            .state
            .lock()
            .await
            .grants
            .iter()
            .filter(|((owner, subject, _, _), _)| *owner == tenant_id && subjects.contains(subject))
            .map(|((_, subject, app_key, scope_key), enabled)| {
                grant(*subject, *app_key, *scope_key, *enabled)
            })
            .collect())
    }

    async fn apply_grant_changes(
        &self,
        tenant_id: TenantId,
        change_set: GrantChangeSet,
    ) -> AppResult<AppliedGrantChanges> {
        let mut state = self.state.lock().await;
        if state.fail_audit_writes {
            return Err(AppError::Persistence("audit append failed".to_owned()));
        }

        let target = change_set.target;
        let mut layer = state
            .grants
            .iter()
            .filter(|((owner, subject, _, _), _)| *owner == tenant_id && *subject == target)
            .map(|((_, _, app_key, scope_key), enabled)| ((*app_key, *scope_key), *enabled))
            .collect::<BTreeMap<_, _>>();
        let diff = GrantDiff::compute(&layer, &change_set.changes);

        for change in GrantChange::collapse(&change_set.changes) {
            layer.insert((change.app_key, change.scope_key), change.enabled);
            state.grants.insert(
                (tenant_id, target, change.app_key, change.scope_key),
                change.enabled,
            );
        }

        let entry = AuditEntry {
            entry_id: AuditEntryId::new(),
            sequence: i64::try_from(state.audit.len()).unwrap_or(i64::MAX) + 1,
            actor_id: change_set.actor_id,
            target,
            action: AuditAction::for_target(target.subject_type()),
            diff: diff.clone(),
            created_at: "2026-01-01T00:00:00Z".to_owned(),
        };
        let audit_entry_id = entry.entry_id;
        state.audit.push((tenant_id, entry));

        Ok(AppliedGrantChanges {
            audit_entry_id,
            diff,
            grants: layer
                .into_iter()
                .map(|((app_key, scope_key), enabled)| grant(target, app_key, scope_key, enabled))
                .collect(),
        })
    }
}

#[async_trait]
impl AuditLogRepository for FakeStore {
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: AuditEntryQuery,
    ) -> AppResult<Vec<AuditEntry>> {
        Ok(self
            .state
            .lock()
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
