//! Authentication key pairs.
//!
//! Creating and deleting a key pair happens on the provider, so both are queued as tasks and the
//! caller gets an envelope with the task id. Every failure of a queued action is reported in the
//! envelope rather than as an HTTP error, except a missing key pair addressed by its own URL.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::Value;
use sqlx::PgConnection;

use crate::{
    AppState,
    api::{
        handlers::{not_found, path_id, unsupported_action},
        models::{
            actions::{ActionOutcome, ActionResponse, ActionResult},
            collections::{CollectionQuery, CollectionResponse},
            key_pairs::{KeyPairResponse, SshKeyPair},
            users::CurrentUser,
        },
        request::{ActionRequest, Attributes, is_blank, string_attr, target_id, value_to_id},
    },
    auth::permissions::{RequiresPermission, operation, resource},
    crypto::generate_ssh_key_pair,
    db::{
        handlers::{KeyPairs, Providers, Repository},
        models::key_pairs::KeyPairDBResponse,
    },
    errors::{Error, Result},
    tasks::TaskAction,
    types::{Collection, Id},
};

const COLLECTION_ACTIONS: [&str; 3] = ["create", "delete", "create_ssh_key"];
const RESOURCE_ACTIONS: [&str; 2] = ["delete", "create_ssh_key"];

async fn find_key_pair(conn: &mut PgConnection, id: Id) -> Result<KeyPairDBResponse> {
    KeyPairs::new(conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(Collection::AuthKeyPairs, id))
}

async fn queue_create(state: &AppState, conn: &mut PgConnection, userid: &str, attrs: &Attributes) -> Result<ActionResult> {
    if is_blank(attrs, "ems_id") || is_blank(attrs, "name") {
        return Err(Error::bad_request("Must specify ems_id and name for creating a key pair"));
    }
    let provider_id = attrs
        .get("ems_id")
        .and_then(value_to_id)
        .ok_or_else(|| Error::bad_request("Invalid ems_id specified"))?;
    let name = string_attr(attrs, "name")?.unwrap_or_default();

    let provider = Providers::new(conn)
        .get_by_id(provider_id)
        .await?
        .ok_or_else(|| not_found(Collection::Providers, provider_id))?;
    let kind = provider
        .kind()
        .ok_or_else(|| Error::bad_request(format!("Unsupported provider type {}", provider.kind)))?;
    let capability = kind.supports_create_key_pair();
    if !capability.available {
        return Err(Error::bad_request(capability.message.unwrap_or_default()));
    }

    let task_id = state
        .task_queue
        .enqueue(
            userid,
            TaskAction::CreateKeyPair {
                provider_id: provider.id,
                name: name.clone(),
            },
            &format!("Creating Cloud Key Pair {name}"),
        )
        .await?;
    Ok(ActionResult::success(format!("Creating Cloud Key Pair {name} for Provider: {}", provider.name))
        .with_task(task_id, &state.api_base()))
}

/// Queue deletion of a key pair that exists. Providers that cannot delete key pairs yield a
/// failure envelope.
async fn queue_delete(state: &AppState, conn: &mut PgConnection, userid: &str, key_pair: KeyPairDBResponse) -> Result<ActionResult> {
    let provider = match key_pair.provider_id {
        Some(provider_id) => Providers::new(conn).get_by_id(provider_id).await?,
        None => None,
    };
    let supported = provider
        .and_then(|p| p.kind())
        .is_some_and(|kind| kind.supports_delete_key_pair().available);
    if !supported {
        return Ok(ActionResult::failure(format!("Delete not supported for {}", key_pair.name)));
    }

    let message = format!("Deleting {}", key_pair.name);
    let task_id = state
        .task_queue
        .enqueue(userid, TaskAction::DeleteKeyPair { key_pair_id: key_pair.id }, &message)
        .await?;
    let api_base = state.api_base();
    Ok(ActionResult::success(message)
        .with_task(task_id, &api_base)
        .with_href(Collection::AuthKeyPairs.href(&api_base, key_pair.id)))
}

async fn delete_action(state: &AppState, conn: &mut PgConnection, userid: &str, id: Option<Id>) -> ActionResult {
    let Some(id) = id else {
        return ActionResult::failure("Must specify an id for deleting a key pair");
    };
    let key_pair = match KeyPairs::new(conn).get_by_id(id).await {
        Ok(Some(key_pair)) => key_pair,
        Ok(None) => return ActionResult::failure(format!("{} id: {id} not found", Collection::AuthKeyPairs.name())),
        Err(e) => return ActionResult::from_error(&e.into()),
    };
    queue_delete(state, conn, userid, key_pair)
        .await
        .unwrap_or_else(|e| ActionResult::from_error(&e))
}

fn create_ssh_key(attrs: &Attributes) -> ActionResult {
    let comment = attrs.get("name").and_then(Value::as_str).unwrap_or_default();
    match generate_ssh_key_pair(comment) {
        Ok(generated) => {
            let result = SshKeyPair {
                public_key: generated.public_key,
                private_key: generated.private_key,
            };
            match serde_json::to_value(result) {
                Ok(result) => ActionResult::success("Generated ssh key pair").with_result(result),
                Err(e) => ActionResult::failure(e.to_string()),
            }
        }
        Err(e) => ActionResult::failure(format!("{e:#}")),
    }
}

#[utoipa::path(
    get,
    path = "/auth_key_pairs",
    tag = "auth_key_pairs",
    summary = "List key pairs",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Key pairs collection", body = CollectionResponse<KeyPairResponse>),
        (status = 403, description = "Missing auth_key_pairs_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_key_pairs(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::AuthKeyPairs, operation::Read>,
) -> Result<Json<CollectionResponse<KeyPairResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = KeyPairs::new(&mut conn);
    let count = repo.count().await?;
    let key_pairs = repo.list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let key_pairs = key_pairs.into_iter().map(|k| KeyPairResponse::new(k, &api_base)).collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::AuthKeyPairs,
        count,
        key_pairs,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/auth_key_pairs/{id}",
    tag = "auth_key_pairs",
    summary = "Show a key pair",
    params(("id" = String, Path, description = "Key pair id")),
    responses(
        (status = 200, description = "Key pair", body = KeyPairResponse),
        (status = 404, description = "Key pair not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_key_pair(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::AuthKeyPairs, operation::Read>,
) -> Result<Json<KeyPairResponse>> {
    let id = path_id(Collection::AuthKeyPairs, &id)?;
    let mut conn = state.db.acquire().await?;
    let key_pair = find_key_pair(&mut conn, id).await?;
    Ok(Json(KeyPairResponse::new(key_pair, &state.api_base())))
}

#[utoipa::path(
    post,
    path = "/auth_key_pairs",
    tag = "auth_key_pairs",
    summary = "Create, delete or generate key pairs",
    description = "`create` and `delete` are queued and answer with the task id. `create_ssh_key` generates an ed25519 pair without storing it.",
    request_body(content = Object, description = "`{\"action\": \"create\"|\"delete\"|\"create_ssh_key\", ...}`"),
    responses(
        (status = 200, description = "One envelope per requested resource", body = ActionResult),
        (status = 400, description = "Unsupported action"),
        (status = 403, description = "Missing the action's feature"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn post_key_pairs(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<ActionResponse<()>>> {
    let request = ActionRequest::parse(body)?;
    let bulk = request.is_bulk();
    let action = request.action.clone();
    if !COLLECTION_ACTIONS.contains(&action.as_str()) {
        return Err(unsupported_action(Collection::AuthKeyPairs, &action));
    }
    current_user.require(Collection::AuthKeyPairs, &action)?;
    let mut conn = state.db.acquire().await?;

    let mut outcomes: Vec<ActionOutcome<()>> = Vec::new();
    match action.as_str() {
        "create" => {
            for attrs in request.into_items() {
                let result = queue_create(&state, &mut conn, &current_user.userid, &attrs)
                    .await
                    .unwrap_or_else(|e| ActionResult::from_error(&e));
                outcomes.push(result.into());
            }
        }
        "delete" => {
            for attrs in request.into_items() {
                outcomes.push(delete_action(&state, &mut conn, &current_user.userid, target_id(&attrs)).await.into());
            }
        }
        "create_ssh_key" => {
            for attrs in request.into_items() {
                outcomes.push(create_ssh_key(&attrs).into());
            }
        }
        other => return Err(unsupported_action(Collection::AuthKeyPairs, other)),
    }

    Ok(Json(ActionResponse::new(bulk, outcomes)))
}

#[utoipa::path(
    post,
    path = "/auth_key_pairs/{id}",
    tag = "auth_key_pairs",
    summary = "Delete one key pair or generate an ssh key",
    params(("id" = String, Path, description = "Key pair id")),
    request_body(content = Object, description = "`{\"action\": \"delete\"|\"create_ssh_key\"}`"),
    responses(
        (status = 200, description = "Action envelope", body = ActionResult),
        (status = 404, description = "Key pair not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn post_key_pair(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current_user: CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<ActionResponse<()>>> {
    let id = path_id(Collection::AuthKeyPairs, &id)?;
    let request = ActionRequest::parse(body)?;
    if !RESOURCE_ACTIONS.contains(&request.action.as_str()) {
        return Err(unsupported_action(Collection::AuthKeyPairs, &request.action));
    }
    current_user.require(Collection::AuthKeyPairs, &request.action)?;
    let mut conn = state.db.acquire().await?;

    let result = match request.action.as_str() {
        "delete" => {
            let key_pair = find_key_pair(&mut conn, id).await?;
            queue_delete(&state, &mut conn, &current_user.userid, key_pair)
                .await
                .unwrap_or_else(|e| ActionResult::from_error(&e))
        }
        "create_ssh_key" => create_ssh_key(&request.into_single()),
        other => return Err(unsupported_action(Collection::AuthKeyPairs, other)),
    };
    Ok(Json(ActionResponse::result(result)))
}

#[utoipa::path(
    delete,
    path = "/auth_key_pairs/{id}",
    tag = "auth_key_pairs",
    summary = "Queue deletion of a key pair",
    params(("id" = String, Path, description = "Key pair id")),
    responses(
        (status = 204, description = "Deletion queued"),
        (status = 400, description = "Provider cannot delete key pairs"),
        (status = 404, description = "Key pair not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn delete_key_pair(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    current_user.require(Collection::AuthKeyPairs, "delete")?;
    let id = path_id(Collection::AuthKeyPairs, &id)?;
    let mut conn = state.db.acquire().await?;
    let key_pair = find_key_pair(&mut conn, id).await?;

    let result = queue_delete(&state, &mut conn, &current_user.userid, key_pair).await?;
    if !result.success {
        return Err(Error::bad_request(result.message));
    }
    Ok(StatusCode::NO_CONTENT)
}
