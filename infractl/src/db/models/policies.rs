//! Database models for control policies, the events they react to and the actions they run.

use crate::types::Id;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct EventDBResponse {
    pub id: Id,
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PolicyActionDBResponse {
    pub id: Id,
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub action_type: Option<String>,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PolicyDBResponse {
    pub id: Id,
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub mode: String,
    pub created_on: DateTime<Utc>,
}
