//! Database repository for tenants.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Page,
    models::tenants::{TenantCreateDBRequest, TenantDBResponse},
};
use crate::types::{GroupId, TenantId};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Tenants<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Tenants<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    pub async fn create(&mut self, request: &TenantCreateDBRequest) -> Result<TenantDBResponse> {
        let tenant = sqlx::query_as::<_, TenantDBResponse>(
            r#"
            INSERT INTO tenants (name, description, divisible, parent_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, divisible, parent_id, default_group_id, created_on
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.divisible)
        .bind(request.parent_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(tenant)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: TenantId) -> Result<Option<TenantDBResponse>> {
        let tenant = sqlx::query_as::<_, TenantDBResponse>(
            "SELECT id, name, description, divisible, parent_id, default_group_id, created_on FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(tenant)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<TenantDBResponse>> {
        let tenant = sqlx::query_as::<_, TenantDBResponse>(
            "SELECT id, name, description, divisible, parent_id, default_group_id, created_on FROM tenants WHERE name = $1 ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(tenant)
    }

    /// The top of the tenant tree, seeded by the first migration.
    #[instrument(skip(self), err)]
    pub async fn root(&mut self) -> Result<TenantDBResponse> {
        let tenant = sqlx::query_as::<_, TenantDBResponse>(
            "SELECT id, name, description, divisible, parent_id, default_group_id, created_on FROM tenants WHERE parent_id IS NULL ORDER BY id LIMIT 1",
        )
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(tenant)
    }

    #[instrument(skip(self, page), err)]
    pub async fn list(&mut self, page: &Page) -> Result<Vec<TenantDBResponse>> {
        let tenants = sqlx::query_as::<_, TenantDBResponse>(
            "SELECT id, name, description, divisible, parent_id, default_group_id, created_on FROM tenants ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(tenants)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants").fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn set_default_group(&mut self, id: TenantId, group_id: GroupId) -> Result<()> {
        let result = sqlx::query("UPDATE tenants SET default_group_id = $2, updated_on = NOW() WHERE id = $1")
            .bind(id)
            .bind(group_id)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
