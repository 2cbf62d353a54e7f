//! Database repository for load balancers, their pools, pool members, listeners and health checks.

use crate::db::{
    errors::Result,
    handlers::repository::Page,
    models::load_balancers::{
        LoadBalancerDBResponse, LoadBalancerHealthCheckDBResponse, LoadBalancerListenerDBResponse, LoadBalancerPoolDBResponse,
        LoadBalancerPoolMemberDBResponse,
    },
};
use crate::types::Id;
use sqlx::PgConnection;
use tracing::instrument;

pub struct LoadBalancers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> LoadBalancers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: Id) -> Result<Option<LoadBalancerDBResponse>> {
        let load_balancer = sqlx::query_as::<_, LoadBalancerDBResponse>("SELECT * FROM load_balancers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(load_balancer)
    }

    #[instrument(skip(self, page), err)]
    pub async fn list(&mut self, page: &Page) -> Result<Vec<LoadBalancerDBResponse>> {
        let load_balancers = sqlx::query_as::<_, LoadBalancerDBResponse>("SELECT * FROM load_balancers ORDER BY id LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(load_balancers)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM load_balancers").fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn get_pool(&mut self, id: Id) -> Result<Option<LoadBalancerPoolDBResponse>> {
        let pool = sqlx::query_as::<_, LoadBalancerPoolDBResponse>("SELECT * FROM load_balancer_pools WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(pool)
    }

    #[instrument(skip(self, page), err)]
    pub async fn list_pools(&mut self, page: &Page) -> Result<Vec<LoadBalancerPoolDBResponse>> {
        let pools = sqlx::query_as::<_, LoadBalancerPoolDBResponse>("SELECT * FROM load_balancer_pools ORDER BY id LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(pools)
    }

    #[instrument(skip(self), err)]
    pub async fn count_pools(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM load_balancer_pools")
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn pools_of(&mut self, load_balancer_id: Id) -> Result<Vec<LoadBalancerPoolDBResponse>> {
        let pools = sqlx::query_as::<_, LoadBalancerPoolDBResponse>(
            "SELECT * FROM load_balancer_pools WHERE load_balancer_id = $1 ORDER BY id",
        )
        .bind(load_balancer_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(pools)
    }

    /// Members of every pool of a load balancer.
    #[instrument(skip(self), err)]
    pub async fn members_of_load_balancer(&mut self, load_balancer_id: Id) -> Result<Vec<LoadBalancerPoolMemberDBResponse>> {
        let members = sqlx::query_as::<_, LoadBalancerPoolMemberDBResponse>(
            r#"
            SELECT m.* FROM load_balancer_pool_members m
            INNER JOIN load_balancer_pools p ON p.id = m.pool_id
            WHERE p.load_balancer_id = $1
            ORDER BY m.id
            "#,
        )
        .bind(load_balancer_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(members)
    }

    #[instrument(skip(self), err)]
    pub async fn members_of_pool(&mut self, pool_id: Id) -> Result<Vec<LoadBalancerPoolMemberDBResponse>> {
        let members = sqlx::query_as::<_, LoadBalancerPoolMemberDBResponse>(
            "SELECT * FROM load_balancer_pool_members WHERE pool_id = $1 ORDER BY id",
        )
        .bind(pool_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(members)
    }

    #[instrument(skip(self), err)]
    pub async fn listeners_of(&mut self, load_balancer_id: Id) -> Result<Vec<LoadBalancerListenerDBResponse>> {
        let listeners = sqlx::query_as::<_, LoadBalancerListenerDBResponse>(
            "SELECT * FROM load_balancer_listeners WHERE load_balancer_id = $1 ORDER BY id",
        )
        .bind(load_balancer_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(listeners)
    }

    #[instrument(skip(self), err)]
    pub async fn health_checks_of_load_balancer(&mut self, load_balancer_id: Id) -> Result<Vec<LoadBalancerHealthCheckDBResponse>> {
        let checks = sqlx::query_as::<_, LoadBalancerHealthCheckDBResponse>(
            "SELECT * FROM load_balancer_health_checks WHERE load_balancer_id = $1 ORDER BY id",
        )
        .bind(load_balancer_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(checks)
    }

    #[instrument(skip(self), err)]
    pub async fn health_checks_of_pool(&mut self, pool_id: Id) -> Result<Vec<LoadBalancerHealthCheckDBResponse>> {
        let checks = sqlx::query_as::<_, LoadBalancerHealthCheckDBResponse>(
            "SELECT * FROM load_balancer_health_checks WHERE pool_id = $1 ORDER BY id",
        )
        .bind(pool_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(checks)
    }
}
