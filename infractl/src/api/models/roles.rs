use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;

use super::collections::Linked;
use crate::db::models::roles::RoleDBResponse;
use crate::types::{Collection, RoleId};

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: RoleId,
    pub name: String,
    /// Feature identifiers granted to members of groups with this role
    pub features: Vec<String>,
    pub created_on: DateTime<Utc>,
}

impl RoleResponse {
    pub fn new(db: RoleDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::Roles.href(api_base, db.id),
            id: db.id,
            name: db.name,
            features: db.features,
            created_on: db.created_on,
        }
    }
}

impl Linked for RoleResponse {
    fn href(&self) -> &str {
        &self.href
    }
}
