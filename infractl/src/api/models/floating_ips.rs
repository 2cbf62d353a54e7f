use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;

use super::{actions::ActionResult, collections::Linked};
use crate::db::models::floating_ips::FloatingIpDBResponse;
use crate::types::{Collection, Id, ProviderId};

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FloatingIpResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    pub address: String,
    pub fixed_ip_address: Option<String>,
    pub status: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[schema(value_type = Option<String>)]
    pub ems_id: Option<ProviderId>,
    pub created_on: DateTime<Utc>,
}

impl FloatingIpResponse {
    pub fn new(db: FloatingIpDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::FloatingIps.href(api_base, db.id),
            id: db.id,
            address: db.address,
            fixed_ip_address: db.fixed_ip_address,
            status: db.status,
            ems_id: db.provider_id,
            created_on: db.created_on,
        }
    }
}

impl Linked for FloatingIpResponse {
    fn href(&self) -> &str {
        &self.href
    }
}

/// One entry of a `query` action: the resource, or why it could not be returned.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum QueryResult {
    Found(FloatingIpResponse),
    Failed(ActionResult),
}
