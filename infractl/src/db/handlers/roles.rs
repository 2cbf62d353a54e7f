//! Database repository for roles.

use crate::db::{errors::Result, handlers::repository::Page, models::roles::RoleDBResponse};
use crate::types::{GroupId, RoleId};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Roles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Roles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: RoleId) -> Result<Option<RoleDBResponse>> {
        let role = sqlx::query_as::<_, RoleDBResponse>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(role)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<RoleDBResponse>> {
        let role = sqlx::query_as::<_, RoleDBResponse>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(role)
    }

    /// The role attached to a group, if any.
    #[instrument(skip(self), err)]
    pub async fn get_for_group(&mut self, group_id: GroupId) -> Result<Option<RoleDBResponse>> {
        let role = sqlx::query_as::<_, RoleDBResponse>(
            "SELECT r.* FROM roles r INNER JOIN groups g ON g.role_id = r.id WHERE g.id = $1",
        )
        .bind(group_id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(role)
    }

    #[instrument(skip(self, page), err)]
    pub async fn list(&mut self, page: &Page) -> Result<Vec<RoleDBResponse>> {
        let roles = sqlx::query_as::<_, RoleDBResponse>("SELECT * FROM roles ORDER BY id LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(roles)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles").fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    /// Insert a role, or replace the features of an existing one with the same name.
    #[instrument(skip(self, features), err)]
    pub async fn upsert(&mut self, name: &str, features: &[String]) -> Result<RoleDBResponse> {
        let role = sqlx::query_as::<_, RoleDBResponse>(
            r#"
            INSERT INTO roles (name, features) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET features = EXCLUDED.features
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(features)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SUPER_ADMIN_ROLE;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_seeded_roles(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut roles = Roles::new(&mut conn);
        assert!(roles.get_by_name(SUPER_ADMIN_ROLE).await.unwrap().is_some());
        assert!(roles.get_by_name("user").await.unwrap().is_some());
        assert_eq!(roles.count().await.unwrap(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upsert_replaces_features(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut roles = Roles::new(&mut conn);
        let first = roles.upsert("auditor", &["users_read".to_string()]).await.unwrap();
        let second = roles.upsert("auditor", &["groups_read".to_string()]).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.features, vec!["groups_read".to_string()]);
    }
}
