//! Database repository for providers.

use crate::db::{errors::Result, handlers::repository::Page, models::providers::ProviderDBResponse};
use crate::types::ProviderId;
use sqlx::PgConnection;
use tracing::instrument;

pub struct Providers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Providers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: ProviderId) -> Result<Option<ProviderDBResponse>> {
        let provider = sqlx::query_as::<_, ProviderDBResponse>("SELECT * FROM providers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(provider)
    }

    #[instrument(skip(self, page), err)]
    pub async fn list(&mut self, page: &Page) -> Result<Vec<ProviderDBResponse>> {
        let providers = sqlx::query_as::<_, ProviderDBResponse>("SELECT * FROM providers ORDER BY id LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(providers)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM providers").fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}
