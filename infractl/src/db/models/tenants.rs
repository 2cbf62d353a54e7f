//! Database models for tenants.

use crate::types::{GroupId, TenantId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct TenantCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
    pub divisible: bool,
    pub parent_id: Option<TenantId>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TenantDBResponse {
    pub id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub divisible: bool,
    pub parent_id: Option<TenantId>,
    pub default_group_id: Option<GroupId>,
    pub created_on: DateTime<Utc>,
}
