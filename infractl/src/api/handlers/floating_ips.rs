use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::Value;

use crate::{
    AppState,
    api::{
        handlers::{not_found, path_id, unsupported_action},
        models::{
            actions::{ActionResult, BulkResults},
            collections::{CollectionQuery, CollectionResponse},
            floating_ips::{FloatingIpResponse, QueryResult},
            users::CurrentUser,
        },
        request::{ActionRequest, target_id},
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::FloatingIps,
    errors::Result,
    types::Collection,
};

#[utoipa::path(
    get,
    path = "/floating_ips",
    tag = "floating_ips",
    summary = "List floating IPs",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Floating IPs collection", body = CollectionResponse<FloatingIpResponse>),
        (status = 403, description = "Missing floating_ips_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_floating_ips(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::FloatingIps, operation::Read>,
) -> Result<Json<CollectionResponse<FloatingIpResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = FloatingIps::new(&mut conn);
    let count = repo.count().await?;
    let floating_ips = repo.list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let floating_ips = floating_ips.into_iter().map(|f| FloatingIpResponse::new(f, &api_base)).collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::FloatingIps,
        count,
        floating_ips,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/floating_ips/{id}",
    tag = "floating_ips",
    summary = "Show a floating IP",
    params(("id" = String, Path, description = "Floating IP id")),
    responses(
        (status = 200, description = "Floating IP", body = FloatingIpResponse),
        (status = 404, description = "Floating IP not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_floating_ip(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::FloatingIps, operation::Read>,
) -> Result<Json<FloatingIpResponse>> {
    let id = path_id(Collection::FloatingIps, &id)?;
    let mut conn = state.db.acquire().await?;
    let floating_ip = FloatingIps::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(Collection::FloatingIps, id))?;
    Ok(Json(FloatingIpResponse::new(floating_ip, &state.api_base())))
}

/// Fetch the requested floating IPs in one round trip. Entries are answered in request order;
/// entries naming no id or an unknown id get a failure envelope.
#[utoipa::path(
    post,
    path = "/floating_ips",
    tag = "floating_ips",
    summary = "Query floating IPs",
    request_body(content = Object, description = "`{\"action\": \"query\", \"resources\": [{\"id\": ..} | {\"href\": ..}]}`"),
    responses(
        (status = 200, description = "One entry per requested resource", body = BulkResults<QueryResult>),
        (status = 400, description = "Unsupported action"),
        (status = 403, description = "Missing floating_ips_query"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn post_floating_ips(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<BulkResults<QueryResult>>> {
    let request = ActionRequest::parse(body)?;
    if request.action != "query" {
        return Err(unsupported_action(Collection::FloatingIps, &request.action));
    }
    current_user.require(Collection::FloatingIps, "query")?;

    let requested: Vec<_> = request.into_items().iter().map(target_id).collect();
    let mut conn = state.db.acquire().await?;
    let found = FloatingIps::new(&mut conn).get_bulk(requested.iter().flatten().copied().collect()).await?;

    let api_base = state.api_base();
    let results = requested
        .into_iter()
        .map(|id| match id {
            None => QueryResult::Failed(ActionResult::failure("Must specify an id for querying a floating ip")),
            Some(id) => match found.get(&id).cloned() {
                Some(floating_ip) => QueryResult::Found(FloatingIpResponse::new(floating_ip, &api_base)),
                None => QueryResult::Failed(ActionResult::failure(format!(
                    "{} id: {id} not found",
                    Collection::FloatingIps.name()
                ))),
            },
        })
        .collect();
    Ok(Json(BulkResults::new(results)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_floating_ip, create_test_provider, create_test_user};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_query_returns_requested_resources(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &["floating_ips_query"]).await;
        let (name, value) = add_auth_headers(&user);
        let provider = create_test_provider(&pool, "openstack").await;
        let first = create_test_floating_ip(&pool, provider.id, "172.16.0.10").await;
        let second = create_test_floating_ip(&pool, provider.id, "172.16.0.11").await;

        let body: Value = app
            .post("/api/floating_ips")
            .add_header(name, value)
            .json(&json!({
                "action": "query",
                "resources": [
                    {"id": second.id.to_string()},
                    {"href": format!("http://localhost:3000/api/floating_ips/{}", first.id)},
                    {"id": 999999}
                ]
            }))
            .await
            .json();
        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0]["address"], "172.16.0.11");
        assert_eq!(results[1]["address"], "172.16.0.10");
        assert_eq!(results[2]["success"], false);
        assert_eq!(results[2]["message"], "floating_ips id: 999999 not found");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_query_requires_feature(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &["floating_ips_read"]).await;
        let (name, value) = add_auth_headers(&user);

        app.post("/api/floating_ips")
            .add_header(name, value)
            .json(&json!({"action": "query", "resource": ""}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_and_show(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &["floating_ips_read"]).await;
        let (name, value) = add_auth_headers(&user);
        let provider = create_test_provider(&pool, "openstack").await;
        let floating_ip = create_test_floating_ip(&pool, provider.id, "172.16.0.10").await;

        let listed: Value = app.get("/api/floating_ips").add_header(name.clone(), value.clone()).await.json();
        assert_eq!(listed["count"], 1);

        let shown: FloatingIpResponse = app
            .get(&format!("/api/floating_ips/{}", floating_ip.id))
            .add_header(name, value)
            .await
            .json();
        assert_eq!(shown.status.as_deref(), Some("DOWN"));
    }
}
