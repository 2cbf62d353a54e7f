use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::Value;
use sqlx::PgConnection;
use tracing::info;

use crate::{
    AppState,
    api::{
        handlers::{forbid_identity_on_create, not_found, path_id, unsupported_action},
        models::{
            actions::{ActionOutcome, ActionResponse, ActionResult},
            collections::{CollectionQuery, CollectionResponse},
            groups::{FILTER_KEYS, GroupResponse, has_filter_expression, has_managed_filters},
            users::CurrentUser,
        },
        request::{ActionRequest, Attributes, Reference, keys_not_in, string_attr, strip_identity, target_id},
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Groups, Repository, Roles, Tenants},
        models::groups::{GroupCreateDBRequest, GroupDBResponse, GroupType, GroupUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{Collection, GroupId, Id, RoleId, TenantId},
};

const GROUP_ATTRS: [&str; 5] = ["description", "role", "tenant", "filters", "filter_expression"];

/// Resolve a group reference (id, href or description).
pub(crate) async fn resolve_group(conn: &mut PgConnection, value: &Value) -> Result<GroupId> {
    let reference = Reference::parse(value, "description").ok_or_else(|| Error::bad_request("Invalid group reference specified"))?;
    let group = match &reference {
        Reference::Id(id) => Groups::new(conn).get_by_id(*id).await?,
        Reference::Key(description) => Groups::new(conn).get_by_description(description).await?,
    };
    group.map(|g| g.id).ok_or_else(|| not_found(Collection::Groups, reference.describe()))
}

async fn resolve_role(conn: &mut PgConnection, value: &Value) -> Result<RoleId> {
    let reference = Reference::parse(value, "name").ok_or_else(|| Error::bad_request("Invalid role reference specified"))?;
    let role = match &reference {
        Reference::Id(id) => Roles::new(conn).get_by_id(*id).await?,
        Reference::Key(name) => Roles::new(conn).get_by_name(name).await?,
    };
    role.map(|r| r.id).ok_or_else(|| not_found(Collection::Roles, reference.describe()))
}

async fn resolve_tenant(conn: &mut PgConnection, value: &Value) -> Result<TenantId> {
    let reference = Reference::parse(value, "name").ok_or_else(|| Error::bad_request("Invalid tenant reference specified"))?;
    let tenant = match &reference {
        Reference::Id(id) => Tenants::new(conn).get_by_id(*id).await?,
        Reference::Key(name) => Tenants::new(conn).get_by_name(name).await?,
    };
    tenant.map(|t| t.id).ok_or_else(|| not_found(Collection::Tenants, reference.describe()))
}

/// Validated, resolved group attributes. `None` means "not given".
#[derive(Debug, Default)]
struct GroupChanges {
    description: Option<String>,
    role_id: Option<RoleId>,
    tenant_id: Option<TenantId>,
    filters: Option<Value>,
    filter_expression: Option<Value>,
}

async fn parse_group_changes(conn: &mut PgConnection, attrs: &Attributes) -> Result<GroupChanges> {
    let unknown = keys_not_in(attrs, &GROUP_ATTRS);
    if !unknown.is_empty() {
        return Err(Error::bad_request(format!(
            "Invalid attribute(s) {} specified for a group",
            unknown.join(", ")
        )));
    }

    let filters = match attrs.get("filters") {
        None | Some(Value::Null) => None,
        Some(Value::Object(filters)) => {
            let invalid: Vec<_> = filters.keys().filter(|k| !FILTER_KEYS.contains(&k.as_str())).cloned().collect();
            if !invalid.is_empty() {
                return Err(Error::bad_request(format!("Invalid filter(s) specified: {}", invalid.join(", "))));
            }
            Some(Value::Object(filters.clone()))
        }
        Some(_) => return Err(Error::bad_request("Attribute filters must be an object")),
    };

    let role_id = match attrs.get("role") {
        None | Some(Value::Null) => None,
        Some(role) => Some(resolve_role(conn, role).await?),
    };
    let tenant_id = match attrs.get("tenant") {
        None | Some(Value::Null) => None,
        Some(tenant) => Some(resolve_tenant(conn, tenant).await?),
    };

    Ok(GroupChanges {
        description: string_attr(attrs, "description")?,
        role_id,
        tenant_id,
        filters,
        filter_expression: attrs.get("filter_expression").filter(|v| !v.is_null()).cloned(),
    })
}

fn check_filter_combination(filters: Option<&Value>, expression: Option<&Value>) -> Result<()> {
    if has_managed_filters(filters) && has_filter_expression(expression) {
        return Err(Error::bad_request("A group cannot have both managed filters and a filter expression"));
    }
    Ok(())
}

async fn create_group(conn: &mut PgConnection, attrs: &Attributes) -> Result<GroupDBResponse> {
    forbid_identity_on_create(Collection::Groups, attrs)?;
    let changes = parse_group_changes(conn, attrs).await?;

    let description = changes
        .description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| Error::bad_request("Must specify a description for creating a group"))?;
    check_filter_combination(changes.filters.as_ref(), changes.filter_expression.as_ref())?;

    let tenant_id = match changes.tenant_id {
        Some(id) => id,
        None => Tenants::new(conn).root().await?.id,
    };

    let group = Groups::new(conn)
        .create(&GroupCreateDBRequest {
            description,
            group_type: GroupType::User,
            tenant_id,
            role_id: changes.role_id,
            filters: changes.filters,
            filter_expression: changes.filter_expression,
        })
        .await?;
    info!(group_id = group.id, "Created group");
    Ok(group)
}

async fn edit_group(conn: &mut PgConnection, id: GroupId, mut attrs: Attributes) -> Result<GroupDBResponse> {
    strip_identity(&mut attrs);
    let existing = Groups::new(conn).get_by_id(id).await?.ok_or_else(|| not_found(Collection::Groups, id))?;
    let changes = parse_group_changes(conn, &attrs).await?;

    if changes.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
        return Err(Error::bad_request("Description can't be blank"));
    }
    check_filter_combination(
        changes.filters.as_ref().or(existing.filters.as_ref()),
        changes.filter_expression.as_ref().or(existing.filter_expression.as_ref()),
    )?;

    let group = Groups::new(conn)
        .update(
            id,
            &GroupUpdateDBRequest {
                description: changes.description,
                tenant_id: changes.tenant_id,
                role_id: changes.role_id,
                filters: changes.filters,
                filter_expression: changes.filter_expression,
            },
        )
        .await?;
    Ok(group)
}

async fn destroy_group(conn: &mut PgConnection, id: GroupId) -> Result<()> {
    if !Groups::new(conn).delete(id).await? {
        return Err(not_found(Collection::Groups, id));
    }
    info!(group_id = id, "Deleted group");
    Ok(())
}

async fn delete_group_action(conn: &mut PgConnection, id: Option<Id>, api_base: &str) -> ActionResult {
    let Some(id) = id else {
        return ActionResult::failure("Must specify an id for deleting a group");
    };
    match destroy_group(conn, id).await {
        Ok(()) => ActionResult::success(format!("Deleting group id: {id}")).with_href(Collection::Groups.href(api_base, id)),
        Err(e) => ActionResult::from_error(&e),
    }
}

#[utoipa::path(
    get,
    path = "/groups",
    tag = "groups",
    summary = "List groups",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Groups collection", body = CollectionResponse<GroupResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing groups_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_groups(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::Groups, operation::Read>,
) -> Result<Json<CollectionResponse<GroupResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = Groups::new(&mut conn);
    let count = repo.count().await?;
    let groups = repo.list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let groups = groups.into_iter().map(|g| GroupResponse::new(g, &api_base)).collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::Groups,
        count,
        groups,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/groups/{id}",
    tag = "groups",
    summary = "Show a group",
    params(("id" = String, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group", body = GroupResponse),
        (status = 404, description = "Group not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _: RequiresPermission<resource::Groups, operation::Read>,
) -> Result<Json<GroupResponse>> {
    let id = path_id(Collection::Groups, &id)?;
    let mut conn = state.db.acquire().await?;
    let group = Groups::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(Collection::Groups, id))?;
    Ok(Json(GroupResponse::new(group, &state.api_base())))
}

#[utoipa::path(
    post,
    path = "/groups",
    tag = "groups",
    summary = "Create, edit or delete groups",
    description = "A bare body creates one group. `{\"action\": ..., \"resources\": [...]}` acts on several.",
    request_body(content = Object, description = "Action request"),
    responses(
        (status = 200, description = "Group representations, or action results for delete", body = GroupResponse),
        (status = 400, description = "Invalid attributes"),
        (status = 403, description = "Missing feature"),
        (status = 404, description = "Referenced role, tenant or group not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn post_groups(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<ActionResponse<GroupResponse>>> {
    let request = ActionRequest::parse(body)?;
    let api_base = state.api_base();
    let bulk = request.is_bulk();
    let action = request.action.clone();
    let mut conn = state.db.acquire().await?;

    let outcomes = match action.as_str() {
        "create" => {
            current_user.require(Collection::Groups, "create")?;
            let mut outcomes = Vec::new();
            for attrs in request.into_items() {
                let group = create_group(&mut conn, &attrs).await?;
                outcomes.push(ActionOutcome::Resource(GroupResponse::new(group, &api_base)));
            }
            outcomes
        }
        "edit" => {
            current_user.require(Collection::Groups, "edit")?;
            let mut outcomes = Vec::new();
            for attrs in request.into_items() {
                let id = target_id(&attrs).ok_or_else(|| Error::bad_request("Must specify an id for editing a group"))?;
                let group = edit_group(&mut conn, id, attrs).await?;
                outcomes.push(ActionOutcome::Resource(GroupResponse::new(group, &api_base)));
            }
            outcomes
        }
        "delete" => {
            current_user.require(Collection::Groups, "delete")?;
            let mut outcomes: Vec<ActionOutcome<GroupResponse>> = Vec::new();
            for attrs in request.into_items() {
                outcomes.push(delete_group_action(&mut conn, target_id(&attrs), &api_base).await.into());
            }
            outcomes
        }
        other => return Err(unsupported_action(Collection::Groups, other)),
    };

    Ok(Json(ActionResponse::new(bulk, outcomes)))
}

#[utoipa::path(
    post,
    path = "/groups/{id}",
    tag = "groups",
    summary = "Edit or delete one group",
    params(("id" = String, Path, description = "Group id")),
    request_body(content = Object, description = "`{\"action\": \"edit\"|\"delete\", \"resource\": {...}}`"),
    responses(
        (status = 200, description = "Group, or the delete result", body = GroupResponse),
        (status = 400, description = "Invalid attributes"),
        (status = 404, description = "Group not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn post_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current_user: CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<ActionResponse<GroupResponse>>> {
    let id = path_id(Collection::Groups, &id)?;
    let request = ActionRequest::parse(body)?;
    let api_base = state.api_base();
    let mut conn = state.db.acquire().await?;

    match request.action.as_str() {
        "edit" => {
            current_user.require(Collection::Groups, "edit")?;
            let group = edit_group(&mut conn, id, request.into_single()).await?;
            Ok(Json(ActionResponse::resource(GroupResponse::new(group, &api_base))))
        }
        "delete" => {
            current_user.require(Collection::Groups, "delete")?;
            destroy_group(&mut conn, id).await?;
            Ok(Json(ActionResponse::result(
                ActionResult::success(format!("Deleting group id: {id}")).with_href(Collection::Groups.href(&api_base, id)),
            )))
        }
        other => Err(unsupported_action(Collection::Groups, other)),
    }
}

#[utoipa::path(
    delete,
    path = "/groups/{id}",
    tag = "groups",
    summary = "Delete a group",
    params(("id" = String, Path, description = "Group id")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 403, description = "Tenant default groups cannot be deleted"),
        (status = 404, description = "Group not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    current_user.require(Collection::Groups, "delete")?;
    let id = path_id(Collection::Groups, &id)?;
    let mut conn = state.db.acquire().await?;
    destroy_group(&mut conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
