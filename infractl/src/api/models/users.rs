//! API request/response models for users and their profiles.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;

use super::collections::Linked;
use crate::db::models::{
    roles::RoleDBResponse,
    user_profiles::{UserProfileDBRequest, UserProfileDBResponse},
    users::UserDBResponse,
};
use crate::errors::{Error, Result};
use crate::types::{Collection, GroupId, Id, SUPER_ADMIN_ROLE, UserId};

/// The authenticated principal, with the features of its current group's role.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: UserId,
    pub userid: String,
    pub name: String,
    pub email: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[schema(value_type = Option<String>)]
    pub current_group_id: Option<GroupId>,
    pub role_name: Option<String>,
    pub features: Vec<String>,
}

impl CurrentUser {
    pub fn new(user: UserDBResponse, role: Option<RoleDBResponse>) -> Self {
        let (role_name, features) = match role {
            Some(role) => (Some(role.name), role.features),
            None => (None, Vec::new()),
        };
        Self {
            id: user.id,
            userid: user.userid,
            name: user.name,
            email: user.email,
            current_group_id: user.current_group_id,
            role_name,
            features,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role_name.as_deref() == Some(SUPER_ADMIN_ROLE)
    }

    pub fn role_allows(&self, identifier: &str) -> bool {
        self.is_super_admin() || self.features.iter().any(|f| f == identifier)
    }

    pub fn require_identifier(&self, identifier: &str) -> Result<()> {
        if self.role_allows(identifier) {
            Ok(())
        } else {
            Err(Error::InsufficientPermissions {
                identifier: identifier.to_string(),
            })
        }
    }

    /// Require the `<collection>_<action>` feature.
    pub fn require(&self, collection: Collection, action: &str) -> Result<()> {
        self.require_identifier(&collection.identifier(action))
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: UserId,
    pub userid: String,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[schema(value_type = Option<String>)]
    pub current_group_id: Option<GroupId>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    #[schema(value_type = Vec<String>)]
    pub miq_group_ids: Vec<GroupId>,
    pub status: bool,
    pub enable_two_factors: bool,
    #[schema(value_type = Object)]
    pub settings: Value,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(db: UserDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::Users.href(api_base, db.id),
            id: db.id,
            userid: db.userid,
            name: db.name,
            email: db.email,
            phone_number: db.phone_number,
            current_group_id: db.current_group_id,
            miq_group_ids: db.group_ids,
            status: db.status,
            enable_two_factors: db.enable_two_factors,
            settings: db.settings,
            created_on: db.created_on,
            updated_on: db.updated_on,
        }
    }
}

impl Linked for UserResponse {
    fn href(&self) -> &str {
        &self.href
    }
}

/// The `user` half of a create/edit response.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: UserId,
    pub name: String,
    pub userid: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl From<&UserDBResponse> for UserSummary {
    fn from(db: &UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name.clone(),
            userid: db.userid.clone(),
            email: db.email.clone(),
            phone_number: db.phone_number.clone(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfileResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
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

impl UserProfileResponse {
    pub fn new(db: UserProfileDBResponse, api_base: &str) -> Self {
        let user_href = Collection::Users.href(api_base, db.user_id);
        Self {
            href: Collection::UserProfiles.nested_href(&user_href, db.id),
            id: db.id,
            user_type: db.user_type,
            account_type: db.account_type,
            company: db.company,
            address: db.address,
            tax_number: db.tax_number,
            contract_codes: db.contract_codes,
            date_of_birth: db.date_of_birth,
            id_number: db.id_number,
            id_issue_date: db.id_issue_date,
            id_issue_location: db.id_issue_location,
            rep_name: db.rep_name,
            rep_phone: db.rep_phone,
            rep_email: db.rep_email,
            ref_name: db.ref_name,
            ref_phone: db.ref_phone,
            ref_email: db.ref_email,
        }
    }
}

impl Linked for UserProfileResponse {
    fn href(&self) -> &str {
        &self.href
    }
}

/// What user create and edit return.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserWithProfile {
    pub user: UserSummary,
    pub user_profile: UserProfileResponse,
}

/// The `profile` attribute of a user create/edit request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UserProfileAttributes {
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

impl From<UserProfileAttributes> for UserProfileDBRequest {
    fn from(attrs: UserProfileAttributes) -> Self {
        Self {
            user_type: attrs.user_type,
            account_type: attrs.account_type,
            company: attrs.company,
            address: attrs.address,
            tax_number: attrs.tax_number,
            contract_codes: attrs.contract_codes,
            date_of_birth: attrs.date_of_birth,
            id_number: attrs.id_number,
            id_issue_date: attrs.id_issue_date,
            id_issue_location: attrs.id_issue_location,
            rep_name: attrs.rep_name,
            rep_phone: attrs.rep_phone,
            rep_email: attrs.rep_email,
            ref_name: attrs.ref_name,
            ref_phone: attrs.ref_phone,
            ref_email: attrs.ref_email,
        }
    }
}

/// Typed view of user attributes, after the key checks have passed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserAttributes {
    pub name: Option<String>,
    pub userid: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub settings: Option<Value>,
    pub group: Option<Value>,
    pub miq_groups: Option<Vec<Value>>,
    pub profile: Option<UserProfileAttributes>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OtpTokenResponse {
    /// `otpauth://totp/...` provisioning URI
    pub otp_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Option<&str>, features: &[&str]) -> CurrentUser {
        CurrentUser {
            id: 1,
            userid: "alice".to_string(),
            name: "Alice".to_string(),
            email: None,
            current_group_id: Some(1),
            role_name: role.map(str::to_string),
            features: features.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_role_allows_listed_features() {
        let user = principal(Some("user"), &["groups_read"]);
        assert!(user.role_allows("groups_read"));
        assert!(!user.role_allows("groups_create"));
        assert!(user.require(Collection::Groups, "read").is_ok());

        let err = user.require(Collection::Groups, "delete").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_super_administrator_is_allowed_everything() {
        let admin = principal(Some(SUPER_ADMIN_ROLE), &[]);
        assert!(admin.is_super_admin());
        assert!(admin.role_allows("anything_at_all"));
    }

    #[test]
    fn test_no_role_allows_nothing() {
        let user = principal(None, &[]);
        assert!(!user.role_allows("users_read"));
    }

    #[test]
    fn test_ids_render_as_strings() {
        let rendered = serde_json::to_value(UserSummary {
            id: 42,
            name: "n".to_string(),
            userid: "u".to_string(),
            email: None,
            phone_number: None,
        })
        .unwrap();
        assert_eq!(rendered["id"], "42");
    }
}
