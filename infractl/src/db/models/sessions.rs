//! Database models for API sessions issued by `GET /api/auth`.

use crate::types::{Id, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct SessionDBResponse {
    pub id: Id,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_on: DateTime<Utc>,
    pub created_on: DateTime<Utc>,
}
