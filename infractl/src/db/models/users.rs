//! Database models for users.

use crate::types::{GroupId, UserId};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub userid: String,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    pub settings: Value,
    /// Memberships; the first one becomes the current group
    pub group_ids: Vec<GroupId>,
    pub status: bool,
}

/// Database request for updating a user. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub userid: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    /// Already merged with the stored settings
    pub settings: Option<Value>,
    pub group_ids: Option<Vec<GroupId>>,
}

/// Database response for a user, with group memberships folded in
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub userid: String,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    pub settings: Value,
    pub current_group_id: Option<GroupId>,
    pub status: bool,
    pub enable_two_factors: bool,
    pub group_ids: Vec<GroupId>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}
