//! API models for `GET /api` and `GET /api/auth`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::users::CurrentUser;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollectionLink {
    pub name: String,
    pub href: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntrypointResponse {
    pub name: String,
    pub description: String,
    pub version: String,
    pub identity: CurrentUser,
    pub collections: Vec<CollectionLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthTokenResponse {
    pub auth_token: String,
    /// Seconds until the token expires
    pub token_ttl: u64,
    pub expires_on: DateTime<Utc>,
}
