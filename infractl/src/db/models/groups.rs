//! Database models for groups.

use crate::types::{GroupId, RoleId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Where a group came from. Per-user groups are created alongside their user; tenant groups are
/// a tenant's default group; system groups are seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    System,
    Tenant,
    User,
}

impl GroupType {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupType::System => "system",
            GroupType::Tenant => "tenant",
            GroupType::User => "user",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupCreateDBRequest {
    pub description: String,
    pub group_type: GroupType,
    pub tenant_id: TenantId,
    pub role_id: Option<RoleId>,
    pub filters: Option<Value>,
    pub filter_expression: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupUpdateDBRequest {
    pub description: Option<String>,
    pub tenant_id: Option<TenantId>,
    pub role_id: Option<RoleId>,
    pub filters: Option<Value>,
    pub filter_expression: Option<Value>,
}

#[derive(Debug, Clone, FromRow)]
pub struct GroupDBResponse {
    pub id: GroupId,
    pub description: String,
    pub group_type: String,
    pub tenant_id: TenantId,
    pub role_id: Option<RoleId>,
    pub filters: Option<Value>,
    pub filter_expression: Option<Value>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}
