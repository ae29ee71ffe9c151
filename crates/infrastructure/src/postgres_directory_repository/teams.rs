use std::collections::HashMap;

use super::*;

#[derive(Debug, FromRow)]
struct TeamRow {
    id: Uuid,
    name: String,
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    team_id: Uuid,
    user_id: Uuid,
}

impl PostgresDirectoryRepository {
    pub(super) async fn find_team_impl(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
    ) -> AppResult<Option<TeamRecord>> {
        let row = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, name
            FROM teams
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(team_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to find team: {error}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let member_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM team_members
            WHERE tenant_id = $1 AND team_id = $2
            ORDER BY added_at, user_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(team_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to list team members: {error}"))
        })?;

        Ok(Some(TeamRecord {
            team_id: TeamId::from_uuid(row.id),
            name: row.name,
            member_ids: member_ids.into_iter().map(UserId::from_uuid).collect(),
        }))
    }

    pub(super) async fn list_teams_impl(&self, tenant_id: TenantId) -> AppResult<Vec<TeamRecord>> {
        let rows = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, name
            FROM teams
            WHERE tenant_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to list teams: {error}")))?;

        let memberships = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT team_id, user_id
            FROM team_members
            WHERE tenant_id = $1
            ORDER BY added_at, user_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to list team members: {error}"))
        })?;

        let mut members_by_team: HashMap<Uuid, Vec<UserId>> = HashMap::new();
        for membership in memberships {
            members_by_team
                .entry(membership.team_id)
                .or_default()
                .push(UserId::from_uuid(membership.user_id));
        }

        Ok(rows
            .into_iter()
            .map(|row| TeamRecord {
                team_id: TeamId::from_uuid(row.id),
                member_ids: members_by_team.remove(&row.id).unwrap_or_default(),
                name: row.name,
            })
            .collect())
    }

    pub(super) async fn create_team_impl(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> AppResult<TeamRecord> {
        let team_id = TeamId::new();

        sqlx::query(
            r#"
            INSERT INTO teams (id, tenant_id, name)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(team_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::Conflict(format!("team '{name}' already exists"))
            } else {
                AppError::Persistence(format!("failed to create team: {error}"))
            }
        })?;

        Ok(TeamRecord {
            team_id,
            name: name.to_owned(),
            member_ids: Vec::new(),
        })
    }

    pub(super) async fn delete_team_impl(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Persistence(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            DELETE FROM permission_grants
            WHERE tenant_id = $1 AND subject_type = $2 AND subject_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(SubjectType::Team.as_str())
        .bind(team_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to delete team grants: {error}"))
        })?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM teams
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(team_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to delete team: {error}")))?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("team '{team_id}' was not found")));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Persistence(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn add_team_member_impl(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO team_members (tenant_id, team_id, user_id)
            SELECT teams.tenant_id, teams.id, users.id
            FROM teams
            INNER JOIN users ON users.tenant_id = teams.tenant_id
            WHERE teams.tenant_id = $1 AND teams.id = $2 AND users.id = $3
            ON CONFLICT (team_id, user_id) DO NOTHING
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(team_id.as_uuid())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to add team member: {error}"))
        })?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        if self.find_team_impl(tenant_id, team_id).await?.is_none() {
            return Err(AppError::NotFound(format!("team '{team_id}' was not found")));
        }
        if self.find_user_impl(tenant_id, user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("user '{user_id}' was not found")));
        }

        Ok(())
    }

    pub(super) async fn remove_team_member_impl(
        &self,
        tenant_id: TenantId,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM team_members
            WHERE tenant_id = $1 AND team_id = $2 AND user_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(team_id.as_uuid())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to remove team member: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "membership '{team_id}:{user_id}' was not found"
            )));
        }

        Ok(())
    }

    pub(super) async fn list_team_ids_for_user_impl(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<TeamId>> {
        let team_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT team_id
            FROM team_members
            WHERE tenant_id = $1 AND user_id = $2
            ORDER BY team_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to list teams for user: {error}"))
        })?;

        Ok(team_ids.into_iter().map(TeamId::from_uuid).collect())
    }
}
