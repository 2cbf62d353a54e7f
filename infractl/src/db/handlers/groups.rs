//! Database repository for groups.

use std::collections::HashMap;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Page, Repository},
    models::groups::{GroupCreateDBRequest, GroupDBResponse, GroupUpdateDBRequest},
};
use crate::types::GroupId;
use sqlx::PgConnection;
use tracing::instrument;

pub struct Groups<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Groups<'c> {
    type CreateRequest = GroupCreateDBRequest;
    type UpdateRequest = GroupUpdateDBRequest;
    type Response = GroupDBResponse;
    type Id = GroupId;
    type Filter = Page;

    #[instrument(skip(self, request), fields(description = %request.description), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let group = sqlx::query_as::<_, GroupDBResponse>(
            r#"
            INSERT INTO groups (description, group_type, tenant_id, role_id, filters, filter_expression)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&request.description)
        .bind(request.group_type.as_str())
        .bind(request.tenant_id)
        .bind(request.role_id)
        .bind(&request.filters)
        .bind(&request.filter_expression)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(group)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let group = sqlx::query_as::<_, GroupDBResponse>("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(group)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<GroupId>) -> Result<HashMap<GroupId, GroupDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let groups = sqlx::query_as::<_, GroupDBResponse>("SELECT * FROM groups WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(groups.into_iter().map(|g| (g.id, g)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let groups = sqlx::query_as::<_, GroupDBResponse>("SELECT * FROM groups ORDER BY id LIMIT $1 OFFSET $2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(groups)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let is_default: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants WHERE default_group_id = $1)")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;

        if is_default {
            return Err(DbError::ProtectedEntity {
                entity_type: "Group".to_string(),
                entity_id: Some(id.to_string()),
                reason: "A tenant default group can not be deleted".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM groups WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let group = sqlx::query_as::<_, GroupDBResponse>(
            r#"
            UPDATE groups SET
                description = COALESCE($2, description),
                tenant_id = COALESCE($3, tenant_id),
                role_id = COALESCE($4, role_id),
                filters = COALESCE($5, filters),
                filter_expression = COALESCE($6, filter_expression),
                updated_on = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.description)
        .bind(request.tenant_id)
        .bind(request.role_id)
        .bind(&request.filters)
        .bind(&request.filter_expression)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(group)
    }
}

impl<'c> Groups<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM groups").fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_description(&mut self, description: &str) -> Result<Option<GroupDBResponse>> {
        let group = sqlx::query_as::<_, GroupDBResponse>("SELECT * FROM groups WHERE description = $1")
            .bind(description)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Tenants;
    use crate::db::models::groups::GroupType;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_update_delete(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let root = Tenants::new(&mut conn).root().await.unwrap();
        let mut groups = Groups::new(&mut conn);

        let group = groups
            .create(&GroupCreateDBRequest {
                description: "operators".to_string(),
                group_type: GroupType::User,
                tenant_id: root.id,
                role_id: None,
                filters: Some(json!({"managed": [["/managed/area/east"]]})),
                filter_expression: None,
            })
            .await
            .unwrap();
        assert_eq!(group.group_type, "user");

        let updated = groups
            .update(
                group.id,
                &GroupUpdateDBRequest {
                    description: Some("operators-east".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description, "operators-east");
        assert_eq!(updated.filters, group.filters);

        assert!(groups.delete(group.id).await.unwrap());
        assert!(groups.get_by_id(group.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_tenant_default_group_is_protected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let root = Tenants::new(&mut conn).root().await.unwrap();
        let default_group = root.default_group_id.expect("root tenant has a default group");

        let err = Groups::new(&mut conn).delete(default_group).await.unwrap_err();
        assert!(matches!(err, DbError::ProtectedEntity { .. }));
        assert!(err.to_string().contains("A tenant default group can not be deleted"));

        assert!(Groups::new(&mut conn).get_by_id(default_group).await.unwrap().is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_description_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let root = Tenants::new(&mut conn).root().await.unwrap();
        let request = GroupCreateDBRequest {
            description: "EvmGroup-super_administrator".to_string(),
            group_type: GroupType::User,
            tenant_id: root.id,
            role_id: None,
            filters: None,
            filter_expression: None,
        };

        let err = Groups::new(&mut conn).create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
