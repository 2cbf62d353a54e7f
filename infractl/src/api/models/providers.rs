use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;

use super::collections::Linked;
use crate::db::models::providers::ProviderDBResponse;
use crate::types::{Collection, ProviderId};

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: ProviderId,
    pub name: String,
    /// One of `openstack`, `amazon`, `azure`, `vmware`
    #[serde(rename = "type")]
    pub kind: String,
    pub created_on: DateTime<Utc>,
}

impl ProviderResponse {
    pub fn new(db: ProviderDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::Providers.href(api_base, db.id),
            id: db.id,
            name: db.name,
            kind: db.kind,
            created_on: db.created_on,
        }
    }
}

impl Linked for ProviderResponse {
    fn href(&self) -> &str {
        &self.href
    }
}
