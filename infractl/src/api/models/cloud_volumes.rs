use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;

use super::collections::Linked;
use crate::db::models::cloud_volumes::{BackupScheduleDBResponse, CloudVolumeDBResponse};
use crate::types::{Collection, Id, ProviderId};

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CloudVolumeResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    pub name: String,
    pub size: Option<i64>,
    pub status: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[schema(value_type = Option<String>)]
    pub ems_id: Option<ProviderId>,
    pub created_on: DateTime<Utc>,
}

impl CloudVolumeResponse {
    pub fn new(db: CloudVolumeDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::CloudVolumes.href(api_base, db.id),
            id: db.id,
            name: db.name,
            size: db.size,
            status: db.status,
            ems_id: db.provider_id,
            created_on: db.created_on,
        }
    }
}

impl Linked for CloudVolumeResponse {
    fn href(&self) -> &str {
        &self.href
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BackupScheduleResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    pub name: String,
}

impl BackupScheduleResponse {
    pub fn new(db: BackupScheduleDBResponse, href: String) -> Self {
        Self {
            href,
            id: db.id,
            name: db.name,
        }
    }
}

impl Linked for BackupScheduleResponse {
    fn href(&self) -> &str {
        &self.href
    }
}
