//! Database repository for floating IPs.

use std::collections::HashMap;

use crate::db::{errors::Result, handlers::repository::Page, models::floating_ips::FloatingIpDBResponse};
use crate::types::Id;
use sqlx::PgConnection;
use tracing::instrument;

pub struct FloatingIps<'c> {
    db: &'c mut PgConnection,
}

impl<'c> FloatingIps<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: Id) -> Result<Option<FloatingIpDBResponse>> {
        let ip = sqlx::query_as::<_, FloatingIpDBResponse>("SELECT * FROM floating_ips WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(ip)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn get_bulk(&mut self, ids: Vec<Id>) -> Result<HashMap<Id, FloatingIpDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ips = sqlx::query_as::<_, FloatingIpDBResponse>("SELECT * FROM floating_ips WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(ips.into_iter().map(|ip| (ip.id, ip)).collect())
    }

    #[instrument(skip(self, page), err)]
    pub async fn list(&mut self, page: &Page) -> Result<Vec<FloatingIpDBResponse>> {
        let ips = sqlx::query_as::<_, FloatingIpDBResponse>("SELECT * FROM floating_ips ORDER BY id LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(ips)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM floating_ips").fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}
