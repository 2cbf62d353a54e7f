//! Database repository for authentication key pairs.

use std::collections::HashMap;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Page, Repository},
    models::key_pairs::{KeyPairCreateDBRequest, KeyPairDBResponse},
};
use crate::types::Id;
use sqlx::PgConnection;
use tracing::instrument;

pub struct KeyPairs<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for KeyPairs<'c> {
    type CreateRequest = KeyPairCreateDBRequest;
    /// Key pairs are immutable once imported
    type UpdateRequest = ();
    type Response = KeyPairDBResponse;
    type Id = Id;
    type Filter = Page;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let key_pair = sqlx::query_as::<_, KeyPairDBResponse>(
            r#"
            INSERT INTO auth_key_pairs (name, provider_id, fingerprint, public_key)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(request.provider_id)
        .bind(&request.fingerprint)
        .bind(&request.public_key)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(key_pair)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let key_pair = sqlx::query_as::<_, KeyPairDBResponse>("SELECT * FROM auth_key_pairs WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(key_pair)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Id>) -> Result<HashMap<Id, KeyPairDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let key_pairs = sqlx::query_as::<_, KeyPairDBResponse>("SELECT * FROM auth_key_pairs WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(key_pairs.into_iter().map(|k| (k.id, k)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let key_pairs = sqlx::query_as::<_, KeyPairDBResponse>("SELECT * FROM auth_key_pairs ORDER BY id LIMIT $1 OFFSET $2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(key_pairs)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM auth_key_pairs WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update(&mut self, id: Self::Id, _request: &Self::UpdateRequest) -> Result<Self::Response> {
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> KeyPairs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM auth_key_pairs").fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}
