//! Database repository for two-factor records.

use crate::db::{
    errors::{DbError, Result},
    models::two_factors::{TwoFactorDBResponse, TwoFactorStatus},
};
use crate::types::UserId;
use sqlx::PgConnection;
use tracing::instrument;

pub struct TwoFactors<'c> {
    db: &'c mut PgConnection,
}

impl<'c> TwoFactors<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn lookup_by_user_id(&mut self, user_id: UserId) -> Result<Option<TwoFactorDBResponse>> {
        let record = sqlx::query_as::<_, TwoFactorDBResponse>("SELECT * FROM two_factors WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(record)
    }

    /// First enrolment: a new record in `pending`.
    #[instrument(skip(self, encrypted_secret), err)]
    pub async fn create(&mut self, user_id: UserId, encrypted_secret: &str) -> Result<TwoFactorDBResponse> {
        let record = sqlx::query_as::<_, TwoFactorDBResponse>(
            "INSERT INTO two_factors (user_id, secret, status) VALUES ($1, $2, 'pending') RETURNING *",
        )
        .bind(user_id)
        .bind(encrypted_secret)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(record)
    }

    /// Re-enrolment: a fresh secret and back to `pending`.
    #[instrument(skip(self, encrypted_secret), err)]
    pub async fn regenerate(&mut self, user_id: UserId, encrypted_secret: &str) -> Result<TwoFactorDBResponse> {
        let record = sqlx::query_as::<_, TwoFactorDBResponse>(
            "UPDATE two_factors SET secret = $2, status = 'pending', updated_on = NOW() WHERE user_id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(encrypted_secret)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(record)
    }

    #[instrument(skip(self), err)]
    pub async fn set_status(&mut self, user_id: UserId, status: TwoFactorStatus) -> Result<()> {
        let result = sqlx::query("UPDATE two_factors SET status = $2, updated_on = NOW() WHERE user_id = $1")
            .bind(user_id)
            .bind(status.as_str())
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
