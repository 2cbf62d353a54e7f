//! Database models for authentication key pairs.

use crate::types::{Id, ProviderId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct KeyPairCreateDBRequest {
    pub name: String,
    pub provider_id: Option<ProviderId>,
    pub fingerprint: Option<String>,
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct KeyPairDBResponse {
    pub id: Id,
    pub name: String,
    pub provider_id: Option<ProviderId>,
    pub fingerprint: Option<String>,
    pub public_key: Option<String>,
    pub created_on: DateTime<Utc>,
}
