//! Database models for cloud volumes.

use crate::types::{Id, ProviderId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct CloudVolumeDBResponse {
    pub id: Id,
    pub name: String,
    pub size: Option<i64>,
    pub status: Option<String>,
    pub provider_id: Option<ProviderId>,
    pub created_on: DateTime<Utc>,
}

/// A scheduled backup of a cloud volume. No provider kind reports schedules yet, so the relation
/// is always rendered empty.
#[derive(Debug, Clone, FromRow)]
pub struct BackupScheduleDBResponse {
    pub id: Id,
    pub cloud_volume_id: Id,
    pub name: String,
}
