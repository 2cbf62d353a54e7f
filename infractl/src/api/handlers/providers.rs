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
            providers::ProviderResponse,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::Providers,
    errors::Result,
    types::Collection,
};

#[utoipa::path(
    get,
    path = "/providers",
    tag = "providers",
    summary = "List providers",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Providers collection", body = CollectionResponse<ProviderResponse>),
        (status = 403, description = "Missing providers_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_providers(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::Providers, operation::Read>,
) -> Result<Json<CollectionResponse<ProviderResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = Providers::new(&mut conn);
    let count = repo.count().await?;
    let providers = repo.list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let providers = providers.into_iter().map(|p| ProviderResponse::new(p, &api_base)).collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::Providers,
        count,
        providers,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/providers/{id}",
    tag = "providers",
    summary = "Show a provider",
    params(("id" = String, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Provider", body = ProviderResponse),
        (status = 404, description = "Provider not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::Providers, operation::Read>,
) -> Result<Json<ProviderResponse>> {
    let id = path_id(Collection::Providers, &id)?;
    let mut conn = state.db.acquire().await?;
    let provider = Providers::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(Collection::Providers, id))?;
    Ok(Json(ProviderResponse::new(provider, &state.api_base())))
}
