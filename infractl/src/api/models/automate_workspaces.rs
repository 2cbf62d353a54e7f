//! API models for automate workspaces.
//!
//! Workspaces are addressed by guid. Secret values inside `input` and `output` are stored as
//! `password::<ciphertext>` and never leave the server unmasked except through `decrypt`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::crypto::mask_passwords;
use crate::db::models::automate_workspaces::AutomateWorkspaceDBResponse;
use crate::types::{Collection, Id};

/// Keys of an `edit` resource merged into the workspace output.
pub const EDITABLE_SECTIONS: [&str; 3] = ["objects", "state_vars", "method_parameters"];

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceAction {
    pub name: String,
    pub method: String,
    pub href: String,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AutomateWorkspaceResponse {
    pub href: String,
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub id: Id,
    pub guid: Uuid,
    #[schema(value_type = Object)]
    pub input: Value,
    #[schema(value_type = Object)]
    pub output: Value,
    pub actions: Vec<ResourceAction>,
}

impl AutomateWorkspaceResponse {
    pub fn new(db: AutomateWorkspaceDBResponse, api_base: &str) -> Self {
        let href = Collection::AutomateWorkspaces.href(api_base, db.guid);
        let actions = ["edit", "decrypt", "encrypt"]
            .into_iter()
            .map(|name| ResourceAction {
                name: name.to_string(),
                method: "post".to_string(),
                href: href.clone(),
            })
            .collect();
        Self {
            href,
            id: db.id,
            guid: db.guid,
            input: mask_passwords(&db.input),
            output: mask_passwords(&db.output),
            actions,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DecryptRequest {
    pub object: String,
    pub attribute: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EncryptRequest {
    pub object: String,
    pub attribute: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecryptedValue {
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_rendering_masks_secrets_and_lists_actions() {
        let guid = Uuid::new_v4();
        let db = AutomateWorkspaceDBResponse {
            id: 5,
            guid,
            user_id: None,
            tenant_id: None,
            input: json!({"objects": {"root": {"var1": "password::abc"}}}),
            output: json!({"objects": {"root": {"plain": "x", "secret": "password::def"}}}),
            created_on: Utc::now(),
            updated_on: Utc::now(),
        };
        let rendered = AutomateWorkspaceResponse::new(db, "http://h/api");

        assert_eq!(rendered.href, format!("http://h/api/automate_workspaces/{guid}"));
        assert_eq!(rendered.input["objects"]["root"]["var1"], "password::********");
        assert_eq!(rendered.output["objects"]["root"]["secret"], "password::********");
        assert_eq!(rendered.output["objects"]["root"]["plain"], "x");
        let names: Vec<_> = rendered.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["edit", "decrypt", "encrypt"]);
        assert_eq!(serde_json::to_value(&rendered).unwrap()["id"], "5");
    }
}
