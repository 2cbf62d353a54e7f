//! API response models for authentication key pairs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;

use super::collections::Linked;
use crate::db::models::key_pairs::KeyPairDBResponse;
use crate::types::{Collection, Id, ProviderId};

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KeyPairResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    pub name: String,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[schema(value_type = Option<String>)]
    pub ems_id: Option<ProviderId>,
    pub fingerprint: Option<String>,
    pub public_key: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl KeyPairResponse {
    pub fn new(db: KeyPairDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::AuthKeyPairs.href(api_base, db.id),
            id: db.id,
            name: db.name,
            ems_id: db.provider_id,
            fingerprint: db.fingerprint,
            public_key: db.public_key,
            created_on: db.created_on,
        }
    }
}

impl Linked for KeyPairResponse {
    fn href(&self) -> &str {
        &self.href
    }
}

/// `result` of a `create_ssh_key` action, both halves in OpenSSH format.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SshKeyPair {
    pub public_key: String,
    pub private_key: String,
}
