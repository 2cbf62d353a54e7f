//! Database repository for API sessions. Only token hashes are stored.

use crate::db::{errors::Result, models::sessions::SessionDBResponse};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Sessions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Sessions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, token_hash), err)]
    pub async fn create(&mut self, user_id: UserId, token_hash: &str, expires_on: DateTime<Utc>) -> Result<SessionDBResponse> {
        let session = sqlx::query_as::<_, SessionDBResponse>(
            "INSERT INTO sessions (user_id, token_hash, expires_on) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_on)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(session)
    }

    /// The session for a token hash, if it has not expired.
    #[instrument(skip(self, token_hash), err)]
    pub async fn find_valid(&mut self, token_hash: &str) -> Result<Option<SessionDBResponse>> {
        let session = sqlx::query_as::<_, SessionDBResponse>("SELECT * FROM sessions WHERE token_hash = $1 AND expires_on > NOW()")
            .bind(token_hash)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(session)
    }

    #[instrument(skip(self, token_hash), err)]
    pub async fn delete_by_token_hash(&mut self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every session of a user. Returns how many were removed.
    #[instrument(skip(self), err)]
    pub async fn delete_for_user(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    pub async fn count_for_user(&mut self, user_id: UserId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count)
    }
}
