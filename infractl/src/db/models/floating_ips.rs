//! Database models for floating IPs.

use crate::types::{Id, ProviderId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct FloatingIpDBResponse {
    pub id: Id,
    pub address: String,
    pub fixed_ip_address: Option<String>,
    pub status: Option<String>,
    pub provider_id: Option<ProviderId>,
    pub created_on: DateTime<Utc>,
}
