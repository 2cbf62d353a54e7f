//! Database repository for cloud volumes.

use crate::db::{errors::Result, handlers::repository::Page, models::cloud_volumes::CloudVolumeDBResponse};
use crate::types::Id;
use sqlx::PgConnection;
use tracing::instrument;

pub struct CloudVolumes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> CloudVolumes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: Id) -> Result<Option<CloudVolumeDBResponse>> {
        let volume = sqlx::query_as::<_, CloudVolumeDBResponse>("SELECT * FROM cloud_volumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(volume)
    }

    #[instrument(skip(self, page), err)]
    pub async fn list(&mut self, page: &Page) -> Result<Vec<CloudVolumeDBResponse>> {
        let volumes = sqlx::query_as::<_, CloudVolumeDBResponse>("SELECT * FROM cloud_volumes ORDER BY id LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(volumes)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cloud_volumes").fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cloud_volumes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
