use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    api::{
        handlers::{not_found, path_id},
        models::{
            collections::{CollectionQuery, CollectionResponse},
            load_balancers::{LoadBalancerPoolResponse, LoadBalancerResponse},
        },
        subcollections::{NestedResource, nested_collection},
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::LoadBalancers,
    errors::Result,
    types::Collection,
};

#[utoipa::path(
    get,
    path = "/load_balancers",
    tag = "load_balancers",
    summary = "List load balancers",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Load balancers collection", body = CollectionResponse<LoadBalancerResponse>),
        (status = 403, description = "Missing load_balancers_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_load_balancers(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::LoadBalancers, operation::Read>,
) -> Result<Json<CollectionResponse<LoadBalancerResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = LoadBalancers::new(&mut conn);
    let count = repo.count().await?;
    let load_balancers = repo.list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let load_balancers = load_balancers
        .into_iter()
        .map(|lb| LoadBalancerResponse::new(lb, &api_base))
        .collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::LoadBalancers,
        count,
        load_balancers,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/load_balancers/{id}",
    tag = "load_balancers",
    summary = "Show a load balancer",
    params(("id" = String, Path, description = "Load balancer id")),
    responses(
        (status = 200, description = "Load balancer", body = LoadBalancerResponse),
        (status = 404, description = "Load balancer not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_load_balancer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::LoadBalancers, operation::Read>,
) -> Result<Json<LoadBalancerResponse>> {
    let id = path_id(Collection::LoadBalancers, &id)?;
    let mut conn = state.db.acquire().await?;
    let load_balancer = LoadBalancers::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(Collection::LoadBalancers, id))?;
    Ok(Json(LoadBalancerResponse::new(load_balancer, &state.api_base())))
}

#[utoipa::path(
    get,
    path = "/load_balancers/{id}/{subcollection}",
    tag = "load_balancers",
    summary = "List a relation of a load balancer",
    description = "One of `load_balancer_pools`, `load_balancer_pool_members`, `load_balancer_listeners`, `load_balancer_health_checks`.",
    params(
        ("id" = String, Path, description = "Load balancer id"),
        ("subcollection" = String, Path, description = "Relation name"),
        CollectionQuery,
    ),
    responses(
        (status = 200, description = "Nested collection", body = CollectionResponse<NestedResource>),
        (status = 404, description = "Load balancer or relation not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_load_balancer_subcollection(
    State(state): State<AppState>,
    Path((id, subcollection)): Path<(String, String)>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::LoadBalancers, operation::Read>,
) -> Result<Json<CollectionResponse<NestedResource>>> {
    let id = path_id(Collection::LoadBalancers, &id)?;
    let mut conn = state.db.acquire().await?;
    let load_balancer = LoadBalancers::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(Collection::LoadBalancers, id))?;

    let parent_href = Collection::LoadBalancers.href(&state.api_base(), id);
    let rendered = nested_collection(&load_balancer, &parent_href, &subcollection, &mut conn, query.expands_resources()).await?;
    Ok(Json(rendered))
}

#[utoipa::path(
    get,
    path = "/load_balancer_pools",
    tag = "load_balancers",
    summary = "List load balancer pools",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Pools collection", body = CollectionResponse<LoadBalancerPoolResponse>),
        (status = 403, description = "Missing load_balancer_pools_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_pools(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::LoadBalancerPools, operation::Read>,
) -> Result<Json<CollectionResponse<LoadBalancerPoolResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = LoadBalancers::new(&mut conn);
    let count = repo.count_pools().await?;
    let pools = repo.list_pools(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let pools = pools
        .into_iter()
        .map(|p| {
            let href = Collection::LoadBalancerPools.href(&api_base, p.id);
            LoadBalancerPoolResponse::new(p, href)
        })
        .collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::LoadBalancerPools,
        count,
        pools,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/load_balancer_pools/{id}",
    tag = "load_balancers",
    summary = "Show a load balancer pool",
    params(("id" = String, Path, description = "Pool id")),
    responses(
        (status = 200, description = "Pool", body = LoadBalancerPoolResponse),
        (status = 404, description = "Pool not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_pool(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::LoadBalancerPools, operation::Read>,
) -> Result<Json<LoadBalancerPoolResponse>> {
    let id = path_id(Collection::LoadBalancerPools, &id)?;
    let mut conn = state.db.acquire().await?;
    let pool = LoadBalancers::new(&mut conn)
        .get_pool(id)
        .await?
        .ok_or_else(|| not_found(Collection::LoadBalancerPools, id))?;
    let href = Collection::LoadBalancerPools.href(&state.api_base(), id);
    Ok(Json(LoadBalancerPoolResponse::new(pool, href)))
}

#[utoipa::path(
    get,
    path = "/load_balancer_pools/{id}/{subcollection}",
    tag = "load_balancers",
    summary = "List a relation of a pool",
    description = "One of `load_balancer_pools` (always empty), `load_balancer_pool_members`, `load_balancer_health_checks`.",
    params(
        ("id" = String, Path, description = "Pool id"),
        ("subcollection" = String, Path, description = "Relation name"),
        CollectionQuery,
    ),
    responses(
        (status = 200, description = "Nested collection", body = CollectionResponse<NestedResource>),
        (status = 404, description = "Pool or relation not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_pool_subcollection(
    State(state): State<AppState>,
    Path((id, subcollection)): Path<(String, String)>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::LoadBalancerPools, operation::Read>,
) -> Result<Json<CollectionResponse<NestedResource>>> {
    let id = path_id(Collection::LoadBalancerPools, &id)?;
    let mut conn = state.db.acquire().await?;
    let pool = LoadBalancers::new(&mut conn)
        .get_pool(id)
        .await?
        .ok_or_else(|| not_found(Collection::LoadBalancerPools, id))?;

    let parent_href = Collection::LoadBalancerPools.href(&state.api_base(), id);
    let rendered = nested_collection(&pool, &parent_href, &subcollection, &mut conn, query.expands_resources()).await?;
    Ok(Json(rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_load_balancer, create_test_provider, create_test_user};
    use axum::http::StatusCode;
    use serde_json::Value;
    use sqlx::PgPool;

    const LB_FEATURES: [&str; 2] = ["load_balancers_read", "load_balancer_pools_read"];

    #[sqlx::test]
    #[test_log::test]
    async fn test_load_balancer_subcollections(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &LB_FEATURES).await;
        let (name, value) = add_auth_headers(&user);
        let provider = create_test_provider(&pool, "openstack").await;
        let (lb, lb_pool) = create_test_load_balancer(&pool, provider.id).await;

        for relation in [
            "load_balancer_pools",
            "load_balancer_pool_members",
            "load_balancer_listeners",
            "load_balancer_health_checks",
        ] {
            let body: Value = app
                .get(&format!("/api/load_balancers/{}/{relation}", lb.id))
                .add_header(name.clone(), value.clone())
                .await
                .json();
            assert_eq!(body["name"], relation);
            assert_eq!(body["count"], 1, "{relation}");
        }

        let pools: Value = app
            .get(&format!("/api/load_balancers/{}/load_balancer_pools?expand=resources", lb.id))
            .add_header(name, value)
            .await
            .json();
        assert_eq!(
            pools["resources"][0]["href"],
            format!("http://localhost:3000/api/load_balancers/{}/load_balancer_pools/{}", lb.id, lb_pool.id)
        );
        assert_eq!(pools["resources"][0]["name"], "pool-1");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_pool_subcollections(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &LB_FEATURES).await;
        let (name, value) = add_auth_headers(&user);
        let provider = create_test_provider(&pool, "openstack").await;
        let (_, lb_pool) = create_test_load_balancer(&pool, provider.id).await;

        let members: Value = app
            .get(&format!("/api/load_balancer_pools/{}/load_balancer_pool_members?expand=resources", lb_pool.id))
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(members["count"], 1);
        assert_eq!(members["resources"][0]["address"], "10.0.0.5");

        let nested_pools: Value = app
            .get(&format!("/api/load_balancer_pools/{}/load_balancer_pools", lb_pool.id))
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(nested_pools["count"], 0);

        app.get(&format!("/api/load_balancer_pools/{}/load_balancer_listeners", lb_pool.id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.get("/api/load_balancer_pools/999999/load_balancer_pool_members")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_and_show(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &LB_FEATURES).await;
        let (name, value) = add_auth_headers(&user);
        let provider = create_test_provider(&pool, "amazon").await;
        let (lb, lb_pool) = create_test_load_balancer(&pool, provider.id).await;

        let listed: Value = app.get("/api/load_balancers").add_header(name.clone(), value.clone()).await.json();
        assert_eq!(listed["count"], 1);

        let shown: LoadBalancerResponse = app
            .get(&format!("/api/load_balancers/{}", lb.id))
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(shown.ems_id, Some(provider.id));

        let shown_pool: LoadBalancerPoolResponse = app
            .get(&format!("/api/load_balancer_pools/{}", lb_pool.id))
            .add_header(name, value)
            .await
            .json();
        assert_eq!(shown_pool.load_balancer_id, lb.id);
    }
}
