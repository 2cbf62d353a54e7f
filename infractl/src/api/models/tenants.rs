use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;

use super::collections::Linked;
use crate::db::models::tenants::TenantDBResponse;
use crate::types::{Collection, GroupId, TenantId};

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub divisible: bool,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[schema(value_type = Option<String>)]
    pub parent_id: Option<TenantId>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[schema(value_type = Option<String>)]
    pub default_miq_group_id: Option<GroupId>,
    pub created_on: DateTime<Utc>,
}

impl TenantResponse {
    pub fn new(db: TenantDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::Tenants.href(api_base, db.id),
            id: db.id,
            name: db.name,
            description: db.description,
            divisible: db.divisible,
            parent_id: db.parent_id,
            default_miq_group_id: db.default_group_id,
            created_on: db.created_on,
        }
    }
}

impl Linked for TenantResponse {
    fn href(&self) -> &str {
        &self.href
    }
}
