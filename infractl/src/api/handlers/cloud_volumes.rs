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
            cloud_volumes::CloudVolumeResponse,
            collections::{CollectionQuery, CollectionResponse},
            users::CurrentUser,
        },
        request::{ActionRequest, target_id},
        subcollections::{NestedResource, nested_collection},
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{CloudVolumes, Providers},
        models::cloud_volumes::CloudVolumeDBResponse,
    },
    errors::{Error, Result},
    tasks::TaskAction,
    types::{Collection, Id},
};

async fn find_volume(conn: &mut PgConnection, id: Id) -> Result<CloudVolumeDBResponse> {
    CloudVolumes::new(conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(Collection::CloudVolumes, id))
}

async fn queue_delete(state: &AppState, conn: &mut PgConnection, userid: &str, volume: CloudVolumeDBResponse) -> Result<ActionResult> {
    let provider = match volume.provider_id {
        Some(provider_id) => Providers::new(conn).get_by_id(provider_id).await?,
        None => None,
    };
    let Some(kind) = provider.and_then(|p| p.kind()) else {
        return Ok(ActionResult::failure(format!("Delete not supported for {}", volume.name)));
    };
    let capability = kind.supports_delete_cloud_volume();
    if !capability.available {
        return Ok(ActionResult::failure(capability.message.unwrap_or_default()));
    }

    let message = format!("Deleting Cloud Volume {}", volume.name);
    let task_id = state
        .task_queue
        .enqueue(userid, TaskAction::DeleteCloudVolume { volume_id: volume.id }, &message)
        .await?;
    let api_base = state.api_base();
    Ok(ActionResult::success(message)
        .with_task(task_id, &api_base)
        .with_href(Collection::CloudVolumes.href(&api_base, volume.id)))
}

async fn delete_action(state: &AppState, conn: &mut PgConnection, userid: &str, id: Option<Id>) -> ActionResult {
    let Some(id) = id else {
        return ActionResult::failure("Must specify an id for deleting a cloud volume");
    };
    let volume = match CloudVolumes::new(conn).get_by_id(id).await {
        Ok(Some(volume)) => volume,
        Ok(None) => return ActionResult::failure(format!("{} id: {id} not found", Collection::CloudVolumes.name())),
        Err(e) => return ActionResult::from_error(&e.into()),
    };
    queue_delete(state, conn, userid, volume)
        .await
        .unwrap_or_else(|e| ActionResult::from_error(&e))
}

#[utoipa::path(
    get,
    path = "/cloud_volumes",
    tag = "cloud_volumes",
    summary = "List cloud volumes",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Cloud volumes collection", body = CollectionResponse<CloudVolumeResponse>),
        (status = 403, description = "Missing cloud_volumes_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_cloud_volumes(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::CloudVolumes, operation::Read>,
) -> Result<Json<CollectionResponse<CloudVolumeResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = CloudVolumes::new(&mut conn);
    let count = repo.count().await?;
    let volumes = repo.list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let volumes = volumes.into_iter().map(|v| CloudVolumeResponse::new(v, &api_base)).collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::CloudVolumes,
        count,
        volumes,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/cloud_volumes/{id}",
    tag = "cloud_volumes",
    summary = "Show a cloud volume",
    params(("id" = String, Path, description = "Cloud volume id")),
    responses(
        (status = 200, description = "Cloud volume", body = CloudVolumeResponse),
        (status = 404, description = "Cloud volume not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_cloud_volume(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::CloudVolumes, operation::Read>,
) -> Result<Json<CloudVolumeResponse>> {
    let id = path_id(Collection::CloudVolumes, &id)?;
    let mut conn = state.db.acquire().await?;
    let volume = find_volume(&mut conn, id).await?;
    Ok(Json(CloudVolumeResponse::new(volume, &state.api_base())))
}

#[utoipa::path(
    get,
    path = "/cloud_volumes/{id}/{subcollection}",
    tag = "cloud_volumes",
    summary = "List a relation of a cloud volume",
    description = "Only `backup_schedules` is routable.",
    params(
        ("id" = String, Path, description = "Cloud volume id"),
        ("subcollection" = String, Path, description = "Relation name"),
        CollectionQuery,
    ),
    responses(
        (status = 200, description = "Nested collection", body = CollectionResponse<NestedResource>),
        (status = 404, description = "Cloud volume or relation not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_cloud_volume_subcollection(
    State(state): State<AppState>,
    Path((id, subcollection)): Path<(String, String)>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::CloudVolumes, operation::Read>,
) -> Result<Json<CollectionResponse<NestedResource>>> {
    let id = path_id(Collection::CloudVolumes, &id)?;
    let mut conn = state.db.acquire().await?;
    let volume = find_volume(&mut conn, id).await?;

    let parent_href = Collection::CloudVolumes.href(&state.api_base(), id);
    let rendered = nested_collection(&volume, &parent_href, &subcollection, &mut conn, query.expands_resources()).await?;
    Ok(Json(rendered))
}

#[utoipa::path(
    post,
    path = "/cloud_volumes",
    tag = "cloud_volumes",
    summary = "Queue deletion of cloud volumes",
    request_body(content = Object, description = "`{\"action\": \"delete\", \"resources\": [{\"id\": ..}]}`"),
    responses(
        (status = 200, description = "One envelope per requested volume", body = ActionResult),
        (status = 400, description = "Unsupported action"),
        (status = 403, description = "Missing cloud_volumes_delete"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn post_cloud_volumes(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<ActionResponse<()>>> {
    let request = ActionRequest::parse(body)?;
    if request.action != "delete" {
        return Err(unsupported_action(Collection::CloudVolumes, &request.action));
    }
    current_user.require(Collection::CloudVolumes, "delete")?;

    let bulk = request.is_bulk();
    let mut conn = state.db.acquire().await?;
    let mut outcomes: Vec<ActionOutcome<()>> = Vec::new();
    for attrs in request.into_items() {
        outcomes.push(delete_action(&state, &mut conn, &current_user.userid, target_id(&attrs)).await.into());
    }
    Ok(Json(ActionResponse::new(bulk, outcomes)))
}

#[utoipa::path(
    post,
    path = "/cloud_volumes/{id}",
    tag = "cloud_volumes",
    summary = "Queue deletion of one cloud volume",
    params(("id" = String, Path, description = "Cloud volume id")),
    request_body(content = Object, description = "`{\"action\": \"delete\"}`"),
    responses(
        (status = 200, description = "Action envelope", body = ActionResult),
        (status = 404, description = "Cloud volume not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn post_cloud_volume(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current_user: CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<ActionResponse<()>>> {
    let id = path_id(Collection::CloudVolumes, &id)?;
    let request = ActionRequest::parse(body)?;
    if request.action != "delete" {
        return Err(unsupported_action(Collection::CloudVolumes, &request.action));
    }
    current_user.require(Collection::CloudVolumes, "delete")?;

    let mut conn = state.db.acquire().await?;
    let volume = find_volume(&mut conn, id).await?;
    let result = queue_delete(&state, &mut conn, &current_user.userid, volume).await?;
    Ok(Json(ActionResponse::result(result)))
}

#[utoipa::path(
    delete,
    path = "/cloud_volumes/{id}",
    tag = "cloud_volumes",
    summary = "Queue deletion of a cloud volume",
    params(("id" = String, Path, description = "Cloud volume id")),
    responses(
        (status = 204, description = "Deletion queued"),
        (status = 400, description = "Provider cannot delete volumes"),
        (status = 404, description = "Cloud volume not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn delete_cloud_volume(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    current_user.require(Collection::CloudVolumes, "delete")?;
    let id = path_id(Collection::CloudVolumes, &id)?;
    let mut conn = state.db.acquire().await?;
    let volume = find_volume(&mut conn, id).await?;

    let result = queue_delete(&state, &mut conn, &current_user.userid, volume).await?;
    if !result.success {
        return Err(Error::bad_request(result.message));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TasksConfig;
    use crate::tasks::worker::process_batch;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_cloud_volume, create_test_provider, create_test_user};
    use serde_json::json;
    use sqlx::PgPool;

    const VOLUME_FEATURES: [&str; 2] = ["cloud_volumes_read", "cloud_volumes_delete"];

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_is_queued(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &VOLUME_FEATURES).await;
        let (name, value) = add_auth_headers(&user);
        let provider = create_test_provider(&pool, "openstack").await;
        let volume = create_test_cloud_volume(&pool, provider.id, "CloudVolume1").await;

        let body: Value = app
            .post(&format!("/api/cloud_volumes/{}", volume.id))
            .add_header(name.clone(), value.clone())
            .json(&json!({"action": "delete"}))
            .await
            .json();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Deleting Cloud Volume CloudVolume1");
        assert!(body["task_id"].is_string());

        process_batch(&pool, &TasksConfig::default()).await.unwrap();
        app.get(&format!("/api/cloud_volumes/{}", volume.id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bulk_delete(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &VOLUME_FEATURES).await;
        let (name, value) = add_auth_headers(&user);
        let provider = create_test_provider(&pool, "openstack").await;
        let vmware = create_test_provider(&pool, "vmware").await;
        let first = create_test_cloud_volume(&pool, provider.id, "CloudVolume1").await;
        let second = create_test_cloud_volume(&pool, vmware.id, "CloudVolume2").await;

        let body: Value = app
            .post("/api/cloud_volumes")
            .add_header(name, value)
            .json(&json!({
                "action": "delete",
                "resources": [
                    {"href": format!("http://localhost:3000/api/cloud_volumes/{}", first.id)},
                    {"id": second.id},
                    {"id": 999999}
                ]
            }))
            .await
            .json();
        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0]["message"], "Deleting Cloud Volume CloudVolume1");
        assert_eq!(results[1]["success"], false);
        assert_eq!(results[1]["message"], "Delete Cloud Volume operation not supported for VMware vCenter");
        assert_eq!(results[2]["message"], "cloud_volumes id: 999999 not found");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_verb_and_missing_volume(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &VOLUME_FEATURES).await;
        let (name, value) = add_auth_headers(&user);
        let provider = create_test_provider(&pool, "amazon").await;
        let volume = create_test_cloud_volume(&pool, provider.id, "CloudVolume1").await;

        app.delete(&format!("/api/cloud_volumes/{}", volume.id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.delete("/api/cloud_volumes/999999")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_backup_schedules_are_empty(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &VOLUME_FEATURES).await;
        let (name, value) = add_auth_headers(&user);
        let provider = create_test_provider(&pool, "openstack").await;
        let volume = create_test_cloud_volume(&pool, provider.id, "CloudVolume1").await;

        let body: Value = app
            .get(&format!("/api/cloud_volumes/{}/backup_schedules", volume.id))
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(body["name"], "backup_schedules");
        assert_eq!(body["count"], 0);

        app.get(&format!("/api/cloud_volumes/{}/load_balancer_pools", volume.id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_requires_feature(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &["cloud_volumes_read"]).await;
        let (name, value) = add_auth_headers(&user);
        let provider = create_test_provider(&pool, "openstack").await;
        let volume = create_test_cloud_volume(&pool, provider.id, "CloudVolume1").await;

        app.post(&format!("/api/cloud_volumes/{}", volume.id))
            .add_header(name, value)
            .json(&json!({"action": "delete"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
