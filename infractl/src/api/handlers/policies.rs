//! Policies and the events and actions they are built from.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use sqlx::PgConnection;

use crate::{
    AppState,
    api::{
        handlers::{not_found, path_id},
        models::{
            collections::{CollectionQuery, CollectionResponse, Linked, ResourceQuery},
            policies::{EventResponse, PolicyActionResponse, PolicyResponse},
            users::CurrentUser,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Events, Policies, PolicyActions},
        models::policies::PolicyDBResponse,
    },
    errors::{Error, Result},
    types::Collection,
};

/// A member of a policy subcollection.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum PolicyMember {
    Event(EventResponse),
    Action(PolicyActionResponse),
}

impl Linked for PolicyMember {
    fn href(&self) -> &str {
        match self {
            PolicyMember::Event(e) => e.href(),
            PolicyMember::Action(a) => a.href(),
        }
    }
}

/// Render a policy, embedding the relations named in `expand`.
async fn render_policy(
    conn: &mut PgConnection,
    policy: PolicyDBResponse,
    api_base: &str,
    events: bool,
    actions: bool,
) -> Result<PolicyResponse> {
    let id = policy.id;
    let mut rendered = PolicyResponse::new(policy, api_base);
    if events {
        let linked = Policies::new(conn).events_of(id).await?;
        rendered.events = Some(
            linked
                .into_iter()
                .map(|e| {
                    let href = Collection::Events.href(api_base, e.id);
                    EventResponse::new(e, href)
                })
                .collect(),
        );
    }
    if actions {
        let linked = Policies::new(conn).actions_of(id).await?;
        rendered.policy_actions = Some(
            linked
                .into_iter()
                .map(|a| {
                    let href = Collection::PolicyActions.href(api_base, a.id);
                    PolicyActionResponse::new(a, href)
                })
                .collect(),
        );
    }
    Ok(rendered)
}

#[utoipa::path(
    get,
    path = "/events",
    tag = "policies",
    summary = "List events",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Events collection", body = CollectionResponse<EventResponse>),
        (status = 403, description = "Missing events_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::Events, operation::Read>,
) -> Result<Json<CollectionResponse<EventResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = Events::new(&mut conn);
    let count = repo.count().await?;
    let events = repo.list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let events = events
        .into_iter()
        .map(|e| {
            let href = Collection::Events.href(&api_base, e.id);
            EventResponse::new(e, href)
        })
        .collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::Events,
        count,
        events,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "policies",
    summary = "Show an event",
    params(("id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "Event not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::Events, operation::Read>,
) -> Result<Json<EventResponse>> {
    let id = path_id(Collection::Events, &id)?;
    let mut conn = state.db.acquire().await?;
    let event = Events::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(Collection::Events, id))?;
    let href = Collection::Events.href(&state.api_base(), id);
    Ok(Json(EventResponse::new(event, href)))
}

#[utoipa::path(
    get,
    path = "/policy_actions",
    tag = "policies",
    summary = "List policy actions",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Policy actions collection", body = CollectionResponse<PolicyActionResponse>),
        (status = 403, description = "Missing policy_actions_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_policy_actions(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::PolicyActions, operation::Read>,
) -> Result<Json<CollectionResponse<PolicyActionResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = PolicyActions::new(&mut conn);
    let count = repo.count().await?;
    let actions = repo.list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let actions = actions
        .into_iter()
        .map(|a| {
            let href = Collection::PolicyActions.href(&api_base, a.id);
            PolicyActionResponse::new(a, href)
        })
        .collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::PolicyActions,
        count,
        actions,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/policy_actions/{id}",
    tag = "policies",
    summary = "Show a policy action",
    params(("id" = String, Path, description = "Policy action id")),
    responses(
        (status = 200, description = "Policy action", body = PolicyActionResponse),
        (status = 404, description = "Policy action not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_policy_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::PolicyActions, operation::Read>,
) -> Result<Json<PolicyActionResponse>> {
    let id = path_id(Collection::PolicyActions, &id)?;
    let mut conn = state.db.acquire().await?;
    let action = PolicyActions::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(Collection::PolicyActions, id))?;
    let href = Collection::PolicyActions.href(&state.api_base(), id);
    Ok(Json(PolicyActionResponse::new(action, href)))
}

#[utoipa::path(
    get,
    path = "/policies",
    tag = "policies",
    summary = "List policies",
    description = "With `expand=resources,events,policy_actions` each policy embeds its events and actions.",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Policies collection", body = CollectionResponse<PolicyResponse>),
        (status = 403, description = "Missing policies_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_policies(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::Policies, operation::Read>,
) -> Result<Json<CollectionResponse<PolicyResponse>>> {
    let mut conn = state.db.acquire().await?;
    let count = Policies::new(&mut conn).count().await?;
    let policies = Policies::new(&mut conn).list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let expand = query.expands_resources();
    let (events, actions) = (expand && query.expands("events"), expand && query.expands("policy_actions"));
    let mut rendered = Vec::with_capacity(policies.len());
    for policy in policies {
        rendered.push(render_policy(&mut conn, policy, &api_base, events, actions).await?);
    }
    Ok(Json(CollectionResponse::for_collection(Collection::Policies, count, rendered, expand)))
}

#[utoipa::path(
    get,
    path = "/policies/{id}",
    tag = "policies",
    summary = "Show a policy",
    params(("id" = String, Path, description = "Policy id"), ResourceQuery),
    responses(
        (status = 200, description = "Policy", body = PolicyResponse),
        (status = 404, description = "Policy not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_policy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ResourceQuery>,
    _: RequiresPermission<resource::Policies, operation::Read>,
) -> Result<Json<PolicyResponse>> {
    let id = path_id(Collection::Policies, &id)?;
    let mut conn = state.db.acquire().await?;
    let policy = Policies::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(Collection::Policies, id))?;
    let rendered = render_policy(
        &mut conn,
        policy,
        &state.api_base(),
        query.expands("events"),
        query.expands("policy_actions"),
    )
    .await?;
    Ok(Json(rendered))
}

/// `events` or `policy_actions` of one policy. Any authenticated caller may list these.
#[utoipa::path(
    get,
    path = "/policies/{id}/{subcollection}",
    tag = "policies",
    summary = "List the events or actions of a policy",
    params(
        ("id" = String, Path, description = "Policy id"),
        ("subcollection" = String, Path, description = "`events` or `policy_actions`"),
        CollectionQuery,
    ),
    responses(
        (status = 200, description = "Nested collection", body = CollectionResponse<PolicyMember>),
        (status = 404, description = "Policy or relation not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn list_policy_subcollection(
    State(state): State<AppState>,
    Path((id, subcollection)): Path<(String, String)>,
    Query(query): Query<CollectionQuery>,
    current_user: CurrentUser,
) -> Result<Json<CollectionResponse<PolicyMember>>> {
    let id = path_id(Collection::Policies, &id)?;
    let mut conn = state.db.acquire().await?;
    Policies::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(Collection::Policies, id))?;

    let parent_href = Collection::Policies.href(&state.api_base(), id);
    let (collection, members): (Collection, Vec<PolicyMember>) = match subcollection.as_str() {
        "events" => (
            Collection::Events,
            Policies::new(&mut conn)
                .events_of(id)
                .await?
                .into_iter()
                .map(|e| {
                    let href = Collection::Events.nested_href(&parent_href, e.id);
                    PolicyMember::Event(EventResponse::new(e, href))
                })
                .collect(),
        ),
        "policy_actions" => (
            Collection::PolicyActions,
            Policies::new(&mut conn)
                .actions_of(id)
                .await?
                .into_iter()
                .map(|a| {
                    let href = Collection::PolicyActions.nested_href(&parent_href, a.id);
                    PolicyMember::Action(PolicyActionResponse::new(a, href))
                })
                .collect(),
        ),
        other => return Err(Error::not_found("subcollection", other)),
    };

    let count = members.len() as i64;
    Ok(Json(CollectionResponse::for_collection(
        collection,
        count,
        members,
        query.expands_resources(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_policy, create_test_user};
    use axum::http::StatusCode;
    use serde_json::Value;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_events_and_actions(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &["events_read", "policy_actions_read"]).await;
        let (name, value) = add_auth_headers(&user);
        let (_, event, action) = create_test_policy(&pool).await;

        let events: Value = app.get("/api/events?expand=resources").add_header(name.clone(), value.clone()).await.json();
        assert_eq!(events["count"], 1);
        assert_eq!(events["resources"][0]["name"], "vm_start");

        let shown: PolicyActionResponse = app
            .get(&format!("/api/policy_actions/{}", action.id))
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(shown.name, "vm_stop");

        app.get(&format!("/api/events/{}", event.id + 1000))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_policy_expands_relations(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &["policies_read"]).await;
        let (name, value) = add_auth_headers(&user);
        let (policy, event, _) = create_test_policy(&pool).await;

        let plain: Value = app
            .get(&format!("/api/policies/{}", policy.id))
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert!(plain.get("events").is_none());

        let expanded: Value = app
            .get(&format!("/api/policies/{}?expand=events,policy_actions", policy.id))
            .add_header(name, value)
            .await
            .json();
        assert_eq!(expanded["events"][0]["guid"], event.guid.to_string());
        assert_eq!(expanded["policy_actions"][0]["name"], "vm_stop");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_subcollections_need_only_authentication(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &[]).await;
        let (name, value) = add_auth_headers(&user);
        let (policy, event, _) = create_test_policy(&pool).await;

        let events: Value = app
            .get(&format!("/api/policies/{}/events?expand=resources", policy.id))
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(events["name"], "events");
        assert_eq!(events["count"], 1);
        assert_eq!(
            events["resources"][0]["href"],
            format!("http://localhost:3000/api/policies/{}/events/{}", policy.id, event.id)
        );

        app.get(&format!("/api/policies/{}/conditions", policy.id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.get(&format!("/api/policies/{}", policy.id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        app.get(&format!("/api/policies/{}/events", policy.id))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
