//! Database models for automate workspaces.

use crate::types::{Id, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A workspace as stored. `input` and `output` may contain `password::<ciphertext>` strings.
#[derive(Debug, Clone, FromRow)]
pub struct AutomateWorkspaceDBResponse {
    pub id: Id,
    pub guid: Uuid,
    pub user_id: Option<UserId>,
    pub tenant_id: Option<TenantId>,
    pub input: Value,
    pub output: Value,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}
