//! Automate workspaces, addressed by guid.
//!
//! `edit` merges sections into the workspace output. `encrypt` stores a `password::` secret in
//! the output and `decrypt` reads one back in plaintext from the input or the output.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    AppState,
    api::{
        handlers::{not_found, unsupported_action},
        models::{
            automate_workspaces::{AutomateWorkspaceResponse, DecryptRequest, DecryptedValue, EDITABLE_SECTIONS, EncryptRequest},
            collections::CollectionResponse,
            users::CurrentUser,
        },
        request::{ActionRequest, Attributes},
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{handlers::AutomateWorkspaces, models::automate_workspaces::AutomateWorkspaceDBResponse},
    errors::{Error, Result},
    json::{deep_merge, fetch_path, store_path},
    types::Collection,
};

const WORKSPACE_ACTIONS: [&str; 3] = ["edit", "decrypt", "encrypt"];

/// Body of a workspace action: the updated workspace, or a decrypted value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WorkspaceActionBody {
    Workspace(AutomateWorkspaceResponse),
    Decrypted(DecryptedValue),
}

/// Numeric ids are not accepted; a workspace is only reachable by guid.
async fn find_workspace(conn: &mut PgConnection, raw: &str) -> Result<AutomateWorkspaceDBResponse> {
    let guid = Uuid::parse_str(raw).map_err(|_| not_found(Collection::AutomateWorkspaces, raw))?;
    AutomateWorkspaces::new(conn)
        .get_by_guid(guid)
        .await?
        .ok_or_else(|| not_found(Collection::AutomateWorkspaces, raw))
}

fn edited_output(workspace: &AutomateWorkspaceDBResponse, attrs: Attributes) -> Result<Value> {
    let patch: serde_json::Map<String, Value> = attrs
        .into_iter()
        .filter(|(key, _)| EDITABLE_SECTIONS.contains(&key.as_str()))
        .collect();
    if patch.is_empty() {
        return Err(Error::bad_request(
            "Must specify objects, state_vars or method_parameters to update",
        ));
    }

    let mut output = workspace.output.clone();
    deep_merge(&mut output, Value::Object(patch));
    Ok(output)
}

fn decrypt(state: &AppState, workspace: &AutomateWorkspaceDBResponse, request: &DecryptRequest) -> Result<String> {
    let path = ["objects", request.object.as_str(), request.attribute.as_str()];
    let found = fetch_path(&workspace.input, &path).or_else(|| fetch_path(&workspace.output, &path));
    match found {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(stored)) => Ok(state.cipher.decrypt_password(stored)?),
        Some(other) => Ok(other.to_string()),
    }
}

#[utoipa::path(
    get,
    path = "/automate_workspaces",
    tag = "automate_workspaces",
    summary = "Count automate workspaces",
    description = "Only counts are returned; members are fetched by guid.",
    responses(
        (status = 200, description = "Counts without resources", body = CollectionResponse<AutomateWorkspaceResponse>),
        (status = 403, description = "Missing automate_workspaces_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_workspaces(
    State(state): State<AppState>,
    _: RequiresPermission<resource::AutomateWorkspaces, operation::Read>,
) -> Result<Json<CollectionResponse<AutomateWorkspaceResponse>>> {
    let mut conn = state.db.acquire().await?;
    let count = AutomateWorkspaces::new(&mut conn).count().await?;
    Ok(Json(CollectionResponse::counts_only(Collection::AutomateWorkspaces, count, count)))
}

#[utoipa::path(
    get,
    path = "/automate_workspaces/{guid}",
    tag = "automate_workspaces",
    summary = "Show an automate workspace",
    params(("guid" = String, Path, description = "Workspace guid")),
    responses(
        (status = 200, description = "Workspace with secrets masked", body = AutomateWorkspaceResponse),
        (status = 404, description = "No workspace with that guid"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_workspace(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    _: RequiresPermission<resource::AutomateWorkspaces, operation::Read>,
) -> Result<Json<AutomateWorkspaceResponse>> {
    let mut conn = state.db.acquire().await?;
    let workspace = find_workspace(&mut conn, &guid).await?;
    Ok(Json(AutomateWorkspaceResponse::new(workspace, &state.api_base())))
}

#[utoipa::path(
    post,
    path = "/automate_workspaces/{guid}",
    tag = "automate_workspaces",
    summary = "Edit a workspace or encrypt/decrypt one of its values",
    params(("guid" = String, Path, description = "Workspace guid")),
    request_body(content = Object, description = "`{\"action\": \"edit\"|\"decrypt\"|\"encrypt\", \"resource\": {...}}`"),
    responses(
        (status = 200, description = "Updated workspace, or `{value}` for decrypt", body = AutomateWorkspaceResponse),
        (status = 400, description = "Missing or invalid attributes"),
        (status = 404, description = "No workspace with that guid"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn post_workspace(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    current_user: CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<WorkspaceActionBody>> {
    let request = ActionRequest::parse(body)?;
    let action = request.action.clone();
    if !WORKSPACE_ACTIONS.contains(&action.as_str()) {
        return Err(unsupported_action(Collection::AutomateWorkspaces, &action));
    }
    current_user.require(Collection::AutomateWorkspaces, &action)?;

    let mut conn = state.db.acquire().await?;
    let workspace = find_workspace(&mut conn, &guid).await?;
    let attrs = request.into_single();
    let api_base = state.api_base();

    match action.as_str() {
        "edit" => {
            let output = edited_output(&workspace, attrs)?;
            let updated = AutomateWorkspaces::new(&mut conn).update_output(workspace.guid, &output).await?;
            Ok(Json(WorkspaceActionBody::Workspace(AutomateWorkspaceResponse::new(updated, &api_base))))
        }
        "decrypt" => {
            let request: DecryptRequest = serde_json::from_value(Value::Object(attrs))
                .map_err(|_| Error::bad_request("Must specify object and attribute for decrypting"))?;
            let value = decrypt(&state, &workspace, &request)?;
            Ok(Json(WorkspaceActionBody::Decrypted(DecryptedValue { value })))
        }
        "encrypt" => {
            let request: EncryptRequest = serde_json::from_value(Value::Object(attrs))
                .map_err(|_| Error::bad_request("Must specify object, attribute and value for encrypting"))?;
            let encrypted = state.cipher.encrypt_password(&request.value)?;

            let mut output = workspace.output.clone();
            store_path(
                &mut output,
                &["objects", request.object.as_str(), request.attribute.as_str()],
                Value::String(encrypted),
            );
            let updated = AutomateWorkspaces::new(&mut conn).update_output(workspace.guid, &output).await?;
            Ok(Json(WorkspaceActionBody::Workspace(AutomateWorkspaceResponse::new(updated, &api_base))))
        }
        other => Err(unsupported_action(Collection::AutomateWorkspaces, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretCipher;
    use crate::test_utils::{TEST_SECRET_KEY, add_auth_headers, create_test_app, create_test_user, create_test_workspace};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    const WORKSPACE_FEATURES: [&str; 4] = [
        "automate_workspaces_read",
        "automate_workspaces_edit",
        "automate_workspaces_decrypt",
        "automate_workspaces_encrypt",
    ];

    async fn seeded_workspace(pool: &PgPool) -> AutomateWorkspaceDBResponse {
        let cipher = SecretCipher::new(TEST_SECRET_KEY);
        let secret = cipher.encrypt_password("secret").unwrap();
        create_test_workspace(
            pool,
            json!({
                "objects": {"root": {"var1": 1, "var2": secret}},
                "method_parameters": {"arg1": secret}
            }),
            json!({}),
        )
        .await
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_collection_has_counts_only(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &WORKSPACE_FEATURES).await;
        let (name, value) = add_auth_headers(&user);
        seeded_workspace(&pool).await;

        let body: Value = app.get("/api/automate_workspaces").add_header(name, value).await.json();
        assert_eq!(body["count"], 1);
        assert_eq!(body["subcount"], 1);
        assert!(body.get("resources").is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_show_by_guid_only_and_masked(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &WORKSPACE_FEATURES).await;
        let (name, value) = add_auth_headers(&user);
        let workspace = seeded_workspace(&pool).await;

        app.get(&format!("/api/automate_workspaces/{}", workspace.id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let body: Value = app
            .get(&format!("/api/automate_workspaces/{}", workspace.guid))
            .add_header(name, value)
            .await
            .json();
        assert_eq!(
            body["href"],
            format!("http://localhost:3000/api/automate_workspaces/{}", workspace.guid)
        );
        assert_eq!(body["id"], workspace.id.to_string());
        assert_eq!(body["input"]["objects"]["root"]["var1"], 1);
        assert_eq!(body["input"]["objects"]["root"]["var2"], "password::********");
        assert_eq!(body["input"]["method_parameters"]["arg1"], "password::********");
        assert_eq!(body["actions"][0]["method"], "post");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_edit_merges_output(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &WORKSPACE_FEATURES).await;
        let (name, value) = add_auth_headers(&user);
        let workspace = seeded_workspace(&pool).await;
        let url = format!("/api/automate_workspaces/{}", workspace.guid);

        let body: Value = app
            .post(&url)
            .add_header(name.clone(), value.clone())
            .json(&json!({"action": "edit", "resource": {"objects": {"root": {"a": "1"}}, "state_vars": {"b": 2}}}))
            .await
            .json();
        assert_eq!(body["output"]["objects"]["root"]["a"], "1");
        assert_eq!(body["output"]["state_vars"]["b"], 2);

        let response = app
            .post(&url)
            .add_header(name, value)
            .json(&json!({"action": "edit", "resource": {}}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"]["message"],
            "Must specify objects, state_vars or method_parameters to update"
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_encrypt_then_decrypt(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &WORKSPACE_FEATURES).await;
        let (name, value) = add_auth_headers(&user);
        let workspace = seeded_workspace(&pool).await;
        let url = format!("/api/automate_workspaces/{}", workspace.guid);

        let decrypted: DecryptedValue = app
            .post(&url)
            .add_header(name.clone(), value.clone())
            .json(&json!({"action": "decrypt", "resource": {"object": "root", "attribute": "var2"}}))
            .await
            .json();
        assert_eq!(decrypted.value, "secret");

        let bogus: DecryptedValue = app
            .post(&url)
            .add_header(name.clone(), value.clone())
            .json(&json!({"action": "decrypt", "resource": {"object": "nada", "attribute": "nada"}}))
            .await
            .json();
        assert_eq!(bogus.value, "");

        let encrypted: Value = app
            .post(&url)
            .add_header(name.clone(), value.clone())
            .json(&json!({"action": "encrypt", "resource": {"object": "root", "attribute": "var3", "value": "hunter2"}}))
            .await
            .json();
        assert_eq!(encrypted["output"]["objects"]["root"]["var3"], "password::********");

        let mut conn = pool.acquire().await.unwrap();
        let stored = AutomateWorkspaces::new(&mut conn).get_by_guid(workspace.guid).await.unwrap().unwrap();
        let raw = stored.output["objects"]["root"]["var3"].as_str().unwrap();
        assert_eq!(SecretCipher::new(TEST_SECRET_KEY).decrypt_password(raw).unwrap(), "hunter2");

        let decrypted: DecryptedValue = app
            .post(&url)
            .add_header(name, value)
            .json(&json!({"action": "decrypt", "resource": {"object": "root", "attribute": "var3"}}))
            .await
            .json();
        assert_eq!(decrypted.value, "hunter2");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_actions_require_their_feature(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &["automate_workspaces_read"]).await;
        let (name, value) = add_auth_headers(&user);
        let workspace = seeded_workspace(&pool).await;

        app.post(&format!("/api/automate_workspaces/{}", workspace.guid))
            .add_header(name, value)
            .json(&json!({"action": "decrypt", "resource": {"object": "root", "attribute": "var2"}}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
