//! Database models for queued tasks.

use crate::types::TaskId;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;

pub const STATE_QUEUED: &str = "queued";
pub const STATE_ACTIVE: &str = "active";
pub const STATE_FINISHED: &str = "finished";

pub const STATUS_OK: &str = "ok";
pub const STATUS_ERROR: &str = "error";

#[derive(Debug, Clone)]
pub struct TaskCreateDBRequest {
    pub name: String,
    pub userid: String,
    /// Serialized [`crate::tasks::TaskAction`]
    pub action: Value,
}

#[derive(Debug, Clone, FromRow)]
pub struct TaskDBResponse {
    pub id: TaskId,
    pub name: String,
    pub userid: String,
    pub action: Value,
    pub state: String,
    pub status: Option<String>,
    pub message: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}
