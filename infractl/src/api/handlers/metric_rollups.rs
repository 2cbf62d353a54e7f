//! Windowed, paged metric rollups.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    api::{
        handlers::{not_found, path_id},
        models::{
            collections::CollectionResponse,
            metric_rollups::{MetricRollupQuery, MetricRollupResponse, paging_links},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::{MetricRollups, metric_rollups::MetricRollupFilter},
    errors::Result,
    types::Collection,
};

/// The filtering part of the request, repeated in every paging link.
fn filter_params(query: &MetricRollupQuery) -> String {
    let params = [
        ("resource_type", &query.resource_type),
        ("capture_interval", &query.capture_interval),
        ("start_date", &query.start_date),
        ("end_date", &query.end_date),
        ("resource_ids", &query.resource_ids),
        ("expand", &query.expand),
    ];
    params
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{name}={v}")))
        .collect::<Vec<_>>()
        .join("&")
}

#[utoipa::path(
    get,
    path = "/metric_rollups",
    tag = "metric_rollups",
    summary = "Query metric rollups",
    description = "`resource_type`, `capture_interval` and `start_date` are required. The end date is inclusive.",
    params(MetricRollupQuery),
    responses(
        (status = 200, description = "One page of rollups with paging links", body = CollectionResponse<MetricRollupResponse>),
        (status = 400, description = "Missing or invalid parameters"),
        (status = 403, description = "Missing metric_rollups_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_metric_rollups(
    State(state): State<AppState>,
    Query(query): Query<MetricRollupQuery>,
    _: RequiresPermission<resource::MetricRollups, operation::Read>,
) -> Result<Json<CollectionResponse<MetricRollupResponse>>> {
    let window = query.window()?;
    let offset = query.offset.unwrap_or(0).max(0);
    let limit = query
        .limit
        .unwrap_or(state.config.api.metrics_default_limit)
        .clamp(1, state.config.api.max_limit);

    let filter = MetricRollupFilter {
        resource_type: window.resource_type,
        capture_interval: window.capture_interval,
        start: window.start,
        end: window.end,
        resource_ids: window.resource_ids,
        skip: offset,
        limit,
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = MetricRollups::new(&mut conn);
    let count = repo.count_all().await?;
    let subquery_count = repo.count(&filter).await?;
    let rollups = repo.list(&filter).await?;

    let api_base = state.api_base();
    let rollups = rollups.into_iter().map(|r| MetricRollupResponse::new(r, &api_base)).collect();
    let (pages, links) = paging_links(
        &Collection::MetricRollups.collection_href(&api_base),
        &filter_params(&query),
        subquery_count,
        offset,
        limit,
    );

    Ok(Json(
        CollectionResponse::for_collection(Collection::MetricRollups, count, rollups, query.expands_resources())
            .with_paging(subquery_count, pages, links),
    ))
}

#[utoipa::path(
    get,
    path = "/metric_rollups/{id}",
    tag = "metric_rollups",
    summary = "Show a metric rollup",
    params(("id" = String, Path, description = "Rollup id")),
    responses(
        (status = 200, description = "Rollup", body = MetricRollupResponse),
        (status = 404, description = "Rollup not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_metric_rollup(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::MetricRollups, operation::Read>,
) -> Result<Json<MetricRollupResponse>> {
    let id = path_id(Collection::MetricRollups, &id)?;
    let mut conn = state.db.acquire().await?;
    let rollup = MetricRollups::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(Collection::MetricRollups, id))?;
    Ok(Json(MetricRollupResponse::new(rollup, &state.api_base())))
}
