//! API response models for groups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;

use super::collections::Linked;
use crate::db::models::groups::GroupDBResponse;
use crate::types::{Collection, GroupId, RoleId, TenantId};

/// Keys accepted inside a group's `filters` object.
pub const FILTER_KEYS: [&str; 2] = ["managed", "belongsto"];

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: GroupId,
    pub description: String,
    pub group_type: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub tenant_id: TenantId,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[schema(value_type = Option<String>)]
    pub role_id: Option<RoleId>,
    #[schema(value_type = Option<Object>)]
    pub filters: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub filter_expression: Option<Value>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl GroupResponse {
    pub fn new(db: GroupDBResponse, api_base: &str) -> Self {
        Self {
            href: Collection::Groups.href(api_base, db.id),
            id: db.id,
            description: db.description,
            group_type: db.group_type,
            tenant_id: db.tenant_id,
            role_id: db.role_id,
            filters: db.filters,
            filter_expression: db.filter_expression,
            created_on: db.created_on,
            updated_on: db.updated_on,
        }
    }
}

impl Linked for GroupResponse {
    fn href(&self) -> &str {
        &self.href
    }
}

/// True when `filters.managed` holds at least one entry.
pub fn has_managed_filters(filters: Option<&Value>) -> bool {
    match filters.and_then(|f| f.get("managed")) {
        Some(Value::Array(entries)) => !entries.is_empty(),
        Some(Value::Object(entries)) => !entries.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// True when a filter expression is present and not an empty object.
pub fn has_filter_expression(expression: Option<&Value>) -> bool {
    match expression {
        None | Some(Value::Null) => false,
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}
