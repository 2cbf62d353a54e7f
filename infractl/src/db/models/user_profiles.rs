//! Database models for user profiles (one per user).

use crate::types::{Id, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Profile columns as written by create and upsert. `None` keeps the stored value on update.
#[derive(Debug, Clone, Default)]
pub struct UserProfileDBRequest {
    pub user_type: Option<String>,
    pub account_type: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub tax_number: Option<String>,
    pub contract_codes: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub id_number: Option<String>,
    pub id_issue_date: Option<NaiveDate>,
    pub id_issue_location: Option<String>,
    pub rep_name: Option<String>,
    pub rep_phone: Option<String>,
    pub rep_email: Option<String>,
    pub ref_name: Option<String>,
    pub ref_phone: Option<String>,
    pub ref_email: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserProfileDBResponse {
    pub id: Id,
    pub user_id: UserId,
    pub user_type: Option<String>,
    pub account_type: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub tax_number: Option<String>,
    pub contract_codes: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub id_number: Option<String>,
    pub id_issue_date: Option<NaiveDate>,
    pub id_issue_location: Option<String>,
    pub rep_name: Option<String>,
    pub rep_phone: Option<String>,
    pub rep_email: Option<String>,
    pub ref_name: Option<String>,
    pub ref_phone: Option<String>,
    pub ref_email: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}
