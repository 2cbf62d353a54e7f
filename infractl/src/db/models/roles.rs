//! Database models for roles.

use crate::types::RoleId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct RoleDBResponse {
    pub id: RoleId,
    pub name: String,
    /// Feature identifiers granted by this role, e.g. `groups_create`
    pub features: Vec<String>,
    pub created_on: DateTime<Utc>,
}
