//! Database models for two-factor authentication records.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Lifecycle of a two-factor record. A user with no row is in the implicit "absent" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoFactorStatus {
    Pending,
    Enabled,
    Disabled,
}

impl TwoFactorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TwoFactorStatus::Pending => "pending",
            TwoFactorStatus::Enabled => "enabled",
            TwoFactorStatus::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TwoFactorDBResponse {
    pub user_id: UserId,
    /// Encrypted base32 secret
    pub secret: String,
    pub status: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}
