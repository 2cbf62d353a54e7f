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
            roles::RoleResponse,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::Roles,
    errors::Result,
    types::Collection,
};

#[utoipa::path(
    get,
    path = "/roles",
    tag = "roles",
    summary = "List roles",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Roles collection", body = CollectionResponse<RoleResponse>),
        (status = 403, description = "Missing roles_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_roles(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::Roles, operation::Read>,
) -> Result<Json<CollectionResponse<RoleResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = Roles::new(&mut conn);
    let count = repo.count().await?;
    let roles = repo.list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let roles = roles.into_iter().map(|r| RoleResponse::new(r, &api_base)).collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::Roles,
        count,
        roles,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/roles/{id}",
    tag = "roles",
    summary = "Show a role",
    params(("id" = String, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role with its feature identifiers", body = RoleResponse),
        (status = 404, description = "Role not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::Roles, operation::Read>,
) -> Result<Json<RoleResponse>> {
    let id = path_id(Collection::Roles, &id)?;
    let mut conn = state.db.acquire().await?;
    let role = Roles::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(Collection::Roles, id))?;
    Ok(Json(RoleResponse::new(role, &state.api_base())))
}
