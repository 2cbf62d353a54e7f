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
            tenants::TenantResponse,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::Tenants,
    errors::Result,
    types::Collection,
};

#[utoipa::path(
    get,
    path = "/tenants",
    tag = "tenants",
    summary = "List tenants",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Tenants collection", body = CollectionResponse<TenantResponse>),
        (status = 403, description = "Missing tenants_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_tenants(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::Tenants, operation::Read>,
) -> Result<Json<CollectionResponse<TenantResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = Tenants::new(&mut conn);
    let count = repo.count().await?;
    let tenants = repo.list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let tenants = tenants.into_iter().map(|t| TenantResponse::new(t, &api_base)).collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::Tenants,
        count,
        tenants,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/tenants/{id}",
    tag = "tenants",
    summary = "Show a tenant",
    params(("id" = String, Path, description = "Tenant id")),
    responses(
        (status = 200, description = "Tenant", body = TenantResponse),
        (status = 404, description = "Tenant not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::Tenants, operation::Read>,
) -> Result<Json<TenantResponse>> {
    let id = path_id(Collection::Tenants, &id)?;
    let mut conn = state.db.acquire().await?;
    let tenant = Tenants::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(Collection::Tenants, id))?;
    Ok(Json(TenantResponse::new(tenant, &state.api_base())))
}
