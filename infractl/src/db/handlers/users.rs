//! Database repository for users and their group memberships.

use std::collections::HashMap;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Page, Repository},
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::{GroupId, UserId};
use sqlx::PgConnection;
use tracing::instrument;

const USER_COLUMNS: &str = r#"
    SELECT u.id, u.userid, u.name, u.email, u.phone_number, u.password_hash, u.settings,
           u.current_group_id, u.status, u.enable_two_factors,
           ARRAY(SELECT ug.group_id FROM user_groups ug WHERE ug.user_id = u.id ORDER BY ug.group_id) AS group_ids,
           u.created_on, u.updated_on
    FROM users u
"#;

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = Page;

    #[instrument(skip(self, request), fields(userid = %request.userid), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: UserId = sqlx::query_scalar(
            r#"
            INSERT INTO users (userid, name, email, phone_number, password_hash, settings, current_group_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&request.userid)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone_number)
        .bind(&request.password_hash)
        .bind(&request.settings)
        .bind(request.group_ids.first().copied())
        .bind(request.status)
        .fetch_one(&mut *self.db)
        .await?;

        self.replace_groups(id, &request.group_ids).await?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("{USER_COLUMNS} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<UserId>) -> Result<HashMap<UserId, UserDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = sqlx::query_as::<_, UserDBResponse>(&format!("{USER_COLUMNS} WHERE u.id = ANY($1)"))
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, UserDBResponse>(&format!("{USER_COLUMNS} ORDER BY u.id LIMIT $1 OFFSET $2"))
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let updated: Option<UserId> = sqlx::query_scalar(
            r#"
            UPDATE users SET
                userid = COALESCE($2, userid),
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone_number = COALESCE($5, phone_number),
                password_hash = COALESCE($6, password_hash),
                settings = COALESCE($7, settings),
                updated_on = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&request.userid)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone_number)
        .bind(&request.password_hash)
        .bind(&request.settings)
        .fetch_optional(&mut *self.db)
        .await?;

        if updated.is_none() {
            return Err(DbError::NotFound);
        }

        if let Some(group_ids) = &request.group_ids {
            self.replace_groups(id, group_ids).await?;
            // Keep the current group pointing at a group the user still belongs to
            sqlx::query(
                r#"
                UPDATE users SET current_group_id = $2[1]
                WHERE id = $1 AND (current_group_id IS NULL OR NOT current_group_id = ANY($2))
                "#,
            )
            .bind(id)
            .bind(group_ids)
            .execute(&mut *self.db)
            .await?;
        }

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_userid(&mut self, userid: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("{USER_COLUMNS} WHERE u.userid = $1"))
            .bind(userid)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    /// Point the user at one of their groups. Membership is checked by the caller.
    #[instrument(skip(self), err)]
    pub async fn set_current_group(&mut self, id: UserId, group_id: GroupId) -> Result<UserDBResponse> {
        let result = sqlx::query("UPDATE users SET current_group_id = $2, updated_on = NOW() WHERE id = $1")
            .bind(id)
            .bind(group_id)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    pub async fn set_enable_two_factors(&mut self, id: UserId, enabled: bool) -> Result<()> {
        let result = sqlx::query("UPDATE users SET enable_two_factors = $2, updated_on = NOW() WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, password_hash), err)]
    pub async fn set_password_hash(&mut self, id: UserId, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_on = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    async fn replace_groups(&mut self, id: UserId, group_ids: &[GroupId]) -> Result<()> {
        sqlx::query("DELETE FROM user_groups WHERE user_id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        match sqlx::query("INSERT INTO user_groups (user_id, group_id) SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING")
            .bind(id)
            .bind(group_ids)
            .execute(&mut *self.db)
            .await
        {
            Ok(_) => Ok(()),
            // A dangling group id
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => Err(DbError::NotFound),
            Err(e) => Err(DbError::from(e)),
        }
    }
}
