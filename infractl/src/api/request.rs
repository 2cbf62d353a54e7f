//! Action request parsing.
//!
//! Every mutating `POST` carries its intent in the body:
//!
//! ```text
//! {"action": "edit", "resource": {"description": "ops"}}          one target
//! {"action": "delete", "resources": [{"id": "1"}, {"href": ".."}]}  bulk
//! {"description": "ops"}                                            bare body = create
//! ```
//!
//! Targets inside a bulk request, and the values of reference attributes such as `group` or
//! `role`, are located by `id`, by `href` (last path segment), or by a natural key.

use serde_json::{Map, Value};

use crate::errors::{Error, Result};
use crate::types::{Id, parse_id};

pub type Attributes = Map<String, Value>;

/// Action requested when the body carries no `action`.
pub const DEFAULT_ACTION: &str = "create";

#[derive(Debug, Clone)]
pub enum Targets {
    Single(Attributes),
    Bulk(Vec<Attributes>),
}

#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action: String,
    pub targets: Targets,
}

impl ActionRequest {
    pub fn parse(body: Value) -> Result<Self> {
        let Value::Object(mut body) = body else {
            return Err(Error::bad_request("Request body must be a JSON object"));
        };

        let action = match body.remove("action") {
            None | Some(Value::Null) => DEFAULT_ACTION.to_string(),
            Some(Value::String(action)) if !action.is_empty() => action,
            Some(_) => return Err(Error::bad_request("Action must be a non-empty string")),
        };

        if let Some(resources) = body.remove("resources") {
            let Value::Array(items) = resources else {
                return Err(Error::bad_request("resources must be an array"));
            };
            let items = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(attrs) => Ok(attrs),
                    _ => Err(Error::bad_request("Each entry of resources must be an object")),
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(Self {
                action,
                targets: Targets::Bulk(items),
            });
        }

        let resource = match body.remove("resource") {
            Some(Value::Object(attrs)) => attrs,
            // Anything but an object (`""` is common for parameterless actions) means no attributes
            Some(_) => Attributes::new(),
            None => body,
        };

        Ok(Self {
            action,
            targets: Targets::Single(resource),
        })
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self.targets, Targets::Bulk(_))
    }

    /// The single target's attributes. Bulk requests yield their first entry.
    pub fn into_single(self) -> Attributes {
        match self.targets {
            Targets::Single(attrs) => attrs,
            Targets::Bulk(items) => items.into_iter().next().unwrap_or_default(),
        }
    }

    pub fn into_items(self) -> Vec<Attributes> {
        match self.targets {
            Targets::Single(attrs) => vec![attrs],
            Targets::Bulk(items) => items,
        }
    }
}

/// A pointer to another record, as accepted in request bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Id(Id),
    /// Natural key: a group's description, a role's or tenant's name.
    Key(String),
}

impl Reference {
    /// Parse `{"id": ..}`, `{"href": ..}`, `{<key_field>: ..}`, or a bare id.
    pub fn parse(value: &Value, key_field: &str) -> Option<Self> {
        match value {
            Value::Object(attrs) => target_id(attrs).map(Reference::Id).or_else(|| {
                attrs
                    .get(key_field)
                    .and_then(Value::as_str)
                    .map(|key| Reference::Key(key.to_string()))
            }),
            other => value_to_id(other).map(Reference::Id),
        }
    }

    /// What to print in a "not found" message.
    pub fn describe(&self) -> String {
        match self {
            Reference::Id(id) => id.to_string(),
            Reference::Key(key) => key.clone(),
        }
    }
}

/// Interpret a JSON number or numeric string as an id.
pub fn value_to_id(value: &Value) -> Option<Id> {
    match value {
        Value::Number(n) => n.as_i64().filter(|id| *id > 0),
        Value::String(s) => parse_id(s),
        _ => None,
    }
}

/// The id at the end of an href such as `http://host/api/groups/12`.
pub fn href_id(href: &str) -> Option<Id> {
    href.trim_end_matches('/').rsplit('/').next().and_then(parse_id)
}

/// Locate the record a bulk entry targets, from `id` or `href`.
pub fn target_id(attrs: &Attributes) -> Option<Id> {
    attrs
        .get("id")
        .and_then(value_to_id)
        .or_else(|| attrs.get("href").and_then(Value::as_str).and_then(href_id))
}

pub fn has_identity(attrs: &Attributes) -> bool {
    attrs.contains_key("id") || attrs.contains_key("href")
}

pub fn strip_identity(attrs: &mut Attributes) {
    attrs.remove("id");
    attrs.remove("href");
}

/// Keys of `attrs` found in `names`, in key order.
pub fn keys_in(attrs: &Attributes, names: &[&str]) -> Vec<String> {
    attrs.keys().filter(|k| names.contains(&k.as_str())).cloned().collect()
}

/// Keys of `attrs` not found in `names`.
pub fn keys_not_in(attrs: &Attributes, names: &[&str]) -> Vec<String> {
    attrs.keys().filter(|k| !names.contains(&k.as_str())).cloned().collect()
}

/// Missing, null and empty-string attributes all count as blank.
pub fn is_blank(attrs: &Attributes, name: &str) -> bool {
    match attrs.get(name) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

pub fn string_attr(attrs: &Attributes, name: &str) -> Result<Option<String>> {
    match attrs.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(Error::bad_request(format!("Attribute {name} must be a string"))),
    }
}
