use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;

use super::collections::Linked;
use crate::db::models::tasks::TaskDBResponse;
use crate::types::{Collection, TaskId};

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: TaskId,
    pub name: String,
    pub userid: String,
    #[schema(value_type = Object)]
    pub action: Value,
    /// `queued`, `active` or `finished`
    pub state: String,
    /// `ok` or `error` once finished
    pub status: Option<String>,
    pub message: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl TaskResponse {
    pub fn new(db: TaskDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::Tasks.href(api_base, db.id),
            id: db.id,
            name: db.name,
            userid: db.userid,
            action: db.action,
            state: db.state,
            status: db.status,
            message: db.message,
            created_on: db.created_on,
            updated_on: db.updated_on,
        }
    }
}

impl Linked for TaskResponse {
    fn href(&self) -> &str {
        &self.href
    }
}
