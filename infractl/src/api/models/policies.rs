use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;
use uuid::Uuid;

use super::collections::Linked;
use crate::db::models::policies::{EventDBResponse, PolicyActionDBResponse, PolicyDBResponse};
use crate::types::{Collection, Id};

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl EventResponse {
    pub fn new(db: EventDBResponse, href: String) -> Self {
        Self {
            href,
            id: db.id,
            guid: db.guid,
            name: db.name,
            description: db.description,
            event_type: db.event_type,
            created_on: db.created_on,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PolicyActionResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub action_type: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl PolicyActionResponse {
    pub fn new(db: PolicyActionDBResponse, href: String) -> Self {
        Self {
            href,
            id: db.id,
            guid: db.guid,
            name: db.name,
            description: db.description,
            action_type: db.action_type,
            created_on: db.created_on,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PolicyResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub mode: String,
    pub created_on: DateTime<Utc>,
    /// Present with `expand=events`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventResponse>>,
    /// Present with `expand=policy_actions`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_actions: Option<Vec<PolicyActionResponse>>,
}

impl PolicyResponse {
    pub fn new(db: PolicyDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::Policies.href(api_base, db.id),
            id: db.id,
            guid: db.guid,
            name: db.name,
            description: db.description,
            mode: db.mode,
            created_on: db.created_on,
            events: None,
            policy_actions: None,
        }
    }
}

impl Linked for EventResponse {
    fn href(&self) -> &str {
        &self.href
    }
}

impl Linked for PolicyActionResponse {
    fn href(&self) -> &str {
        &self.href
    }
}

impl Linked for PolicyResponse {
    fn href(&self) -> &str {
        &self.href
    }
}
