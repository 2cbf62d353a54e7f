//! Users: listing, the create/edit/delete actions, current group switching, session revocation
//! and two-factor enrolment.
//!
//! User creation provisions a private tenant and group for the new user in the same transaction,
//! so every user starts out with exactly one membership.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgConnection;
use tracing::{info, warn};

use crate::{
    AppState,
    api::{
        handlers::{forbid_identity_on_create, groups::resolve_group, not_found, path_id, unsupported_action},
        models::{
            actions::{ActionOutcome, ActionResponse, ActionResult},
            collections::{CollectionQuery, CollectionResponse},
            users::{
                CurrentUser, OtpTokenResponse, UserAttributes, UserProfileResponse, UserResponse, UserSummary,
                UserWithProfile,
            },
        },
        request::{
            ActionRequest, Attributes, Reference, is_blank, keys_in, keys_not_in, string_attr, strip_identity,
            target_id,
        },
    },
    auth::{
        otp::{self, OtpSettings},
        password,
        permissions::{RequiresPermission, operation, resource},
        session,
    },
    config::AuthMode,
    db::{
        handlers::{Groups, Repository, Roles, Tenants, TwoFactors, UserProfiles, Users},
        models::{
            groups::{GroupCreateDBRequest, GroupType},
            tenants::TenantCreateDBRequest,
            two_factors::TwoFactorStatus,
            user_profiles::{UserProfileDBRequest, UserProfileDBResponse},
            users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
        },
    },
    errors::{Error, Result},
    json::deep_merge,
    types::{Collection, GroupId, REVOKE_USER_SESSIONS, UserId},
};

/// Attributes nobody may set on another user.
const INVALID_USER_ATTRS: [&str; 5] = ["id", "href", "current_group_id", "settings", "current_group"];
/// Attributes a user may not set on themselves.
const INVALID_SELF_USER_ATTRS: [&str; 4] = ["id", "href", "current_group_id", "current_group"];
/// All a user without `users_edit` may change about themselves.
const SELF_EDITABLE_ATTRS: [&str; 3] = ["password", "email", "settings"];
const USER_ATTRS: [&str; 9] = [
    "name",
    "userid",
    "email",
    "phone_number",
    "password",
    "settings",
    "group",
    "miq_groups",
    "profile",
];

/// A user action's body: the `{user, user_profile}` pair, a user, an OTP token or an envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UserActionBody {
    WithProfile(UserWithProfile),
    User(UserResponse),
    OtpToken(OtpTokenResponse),
}

fn reject_attrs(attrs: &Attributes, names: &[&str], whom: &str) -> Result<()> {
    let bad = keys_in(attrs, names);
    if bad.is_empty() {
        return Ok(());
    }
    Err(Error::bad_request(format!(
        "Invalid attribute(s) {} specified for {whom}",
        bad.join(", ")
    )))
}

fn reject_unknown_attrs(attrs: &Attributes) -> Result<()> {
    let unknown = keys_not_in(attrs, &USER_ATTRS);
    if unknown.is_empty() {
        return Ok(());
    }
    Err(Error::bad_request(format!("Unknown attribute(s) {} for a user", unknown.join(", "))))
}

fn reject_empty_groups(attrs: &Attributes) -> Result<()> {
    match attrs.get("miq_groups") {
        Some(Value::Array(groups)) if groups.is_empty() => Err(Error::bad_request("Users must be assigned groups")),
        _ => Ok(()),
    }
}

fn parse_attributes(attrs: Attributes) -> Result<UserAttributes> {
    serde_json::from_value(Value::Object(attrs)).map_err(|e| Error::bad_request(format!("Invalid user attributes - {e}")))
}

async fn hash_password(password: Option<String>) -> Result<Option<String>> {
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;
    Ok(Some(hash))
}

/// Memberships named by `group` (one reference) or `miq_groups` (a list). `None` when neither
/// is given.
async fn resolve_memberships(conn: &mut PgConnection, data: &UserAttributes) -> Result<Option<Vec<GroupId>>> {
    if let Some(group) = data.group.as_ref().filter(|g| !g.is_null()) {
        return Ok(Some(vec![resolve_group(conn, group).await?]));
    }
    let Some(groups) = &data.miq_groups else {
        return Ok(None);
    };
    let mut ids = Vec::with_capacity(groups.len());
    for group in groups {
        ids.push(resolve_group(conn, group).await?);
    }
    if ids.is_empty() {
        return Err(Error::bad_request("Users must be assigned groups"));
    }
    Ok(Some(ids))
}

fn with_profile(user: &UserDBResponse, profile: UserProfileDBResponse, api_base: &str) -> UserWithProfile {
    UserWithProfile {
        user: UserSummary::from(user),
        user_profile: UserProfileResponse::new(profile, api_base),
    }
}

async fn create_user(state: &AppState, attrs: Attributes) -> Result<UserWithProfile> {
    forbid_identity_on_create(Collection::Users, &attrs)?;
    reject_attrs(&attrs, &INVALID_USER_ATTRS, "a user")?;
    reject_empty_groups(&attrs)?;
    reject_unknown_attrs(&attrs)?;

    let mut required = vec!["name", "userid"];
    if state.config.authentication.mode == AuthMode::Database {
        required.push("password");
    }
    let missing: Vec<_> = required.into_iter().filter(|name| is_blank(&attrs, name)).collect();
    if !missing.is_empty() {
        return Err(Error::bad_request(format!(
            "Missing attribute(s) {} for creating a user",
            missing.join(", ")
        )));
    }

    let data = parse_attributes(attrs)?;
    match provision_user(state, data).await {
        Ok(created) => {
            info!(userid = %created.user.userid, "Created user");
            Ok(created)
        }
        Err(e) => {
            warn!(error = %e, "User creation rolled back");
            Err(Error::bad_request(format!("Failed to add a new user - {}", e.user_message())))
        }
    }
}

/// Tenant, group, user and profile, all or nothing.
async fn provision_user(state: &AppState, data: UserAttributes) -> Result<UserWithProfile> {
    let userid = data.userid.clone().unwrap_or_default();
    let name = data.name.clone().unwrap_or_default();
    let password_hash = hash_password(data.password.clone()).await?;

    let mut tx = state.db.begin().await?;

    if Users::new(&mut tx).get_by_userid(&userid).await?.is_some() {
        return Err(Error::bad_request("Userid has already been taken"));
    }

    let root = Tenants::new(&mut tx).root().await?;
    let tenant = Tenants::new(&mut tx)
        .create(&TenantCreateDBRequest {
            name: userid.clone(),
            description: Some(userid.clone()),
            divisible: false,
            parent_id: Some(root.id),
        })
        .await?;

    let role = Roles::new(&mut tx)
        .get_by_name(&state.config.default_user_role)
        .await?
        .ok_or_else(|| Error::bad_request(format!("Role {} does not exist", state.config.default_user_role)))?;

    let group = Groups::new(&mut tx)
        .create(&GroupCreateDBRequest {
            description: userid.clone(),
            group_type: GroupType::User,
            tenant_id: tenant.id,
            role_id: Some(role.id),
            filters: None,
            filter_expression: None,
        })
        .await?;
    Tenants::new(&mut tx).set_default_group(tenant.id, group.id).await?;

    let user = Users::new(&mut tx)
        .create(&UserCreateDBRequest {
            userid,
            name,
            email: data.email,
            phone_number: data.phone_number,
            password_hash,
            settings: Value::Object(Default::default()),
            group_ids: vec![group.id],
            status: true,
        })
        .await?;

    let profile: UserProfileDBRequest = data.profile.map(Into::into).unwrap_or_default();
    let profile = UserProfiles::new(&mut tx).upsert(user.id, &profile).await?;

    tx.commit().await?;
    Ok(with_profile(&user, profile, &state.api_base()))
}

/// Callers without `users_edit` may touch only a few of their own attributes.
fn check_edit_scope(current_user: &CurrentUser, id: UserId, attrs: &Attributes) -> Result<()> {
    if current_user.role_allows(&Collection::Users.identifier("edit")) {
        return Ok(());
    }
    if id != current_user.id {
        return current_user.require(Collection::Users, "edit");
    }
    reject_attrs(attrs, &INVALID_SELF_USER_ATTRS, "the current user")?;
    if !keys_not_in(attrs, &SELF_EDITABLE_ATTRS).is_empty() {
        return Err(Error::bad_request(format!(
            "Cannot update attributes other than {} for the authenticated user",
            SELF_EDITABLE_ATTRS.join(", ")
        )));
    }
    Ok(())
}

async fn edit_user(state: &AppState, current_user: &CurrentUser, id: UserId, attrs: Attributes) -> Result<UserWithProfile> {
    if id == current_user.id {
        reject_attrs(&attrs, &INVALID_SELF_USER_ATTRS, "the current user")?;
    } else {
        reject_attrs(&attrs, &INVALID_USER_ATTRS, "a user")?;
    }
    reject_empty_groups(&attrs)?;
    reject_unknown_attrs(&attrs)?;

    let data = parse_attributes(attrs)?;
    let password_hash = hash_password(data.password.clone()).await?;

    let mut tx = state.db.begin().await?;
    let existing = Users::new(&mut tx).get_by_id(id).await?.ok_or_else(|| not_found(Collection::Users, id))?;
    let group_ids = resolve_memberships(&mut tx, &data).await?;

    let settings = data.settings.map(|patch| {
        let mut merged = existing.settings.clone();
        deep_merge(&mut merged, patch);
        merged
    });

    let user = Users::new(&mut tx)
        .update(
            id,
            &UserUpdateDBRequest {
                userid: data.userid,
                name: data.name,
                email: data.email,
                phone_number: data.phone_number,
                password_hash,
                settings,
                group_ids,
            },
        )
        .await?;

    let profile = match data.profile {
        Some(profile) => UserProfiles::new(&mut tx).upsert(id, &profile.into()).await?,
        None => match UserProfiles::new(&mut tx).get_for_user(id).await? {
            Some(profile) => profile,
            None => UserProfiles::new(&mut tx).upsert(id, &UserProfileDBRequest::default()).await?,
        },
    };

    tx.commit().await?;
    info!(user_id = id, "Edited user");
    Ok(with_profile(&user, profile, &state.api_base()))
}

async fn destroy_user(conn: &mut PgConnection, current_user: &CurrentUser, id: UserId) -> Result<()> {
    if id == current_user.id {
        return Err(Error::bad_request("Cannot delete user of current request"));
    }
    if !Users::new(conn).delete(id).await? {
        return Err(not_found(Collection::Users, id));
    }
    info!(user_id = id, "Deleted user");
    Ok(())
}

async fn delete_user_action(conn: &mut PgConnection, current_user: &CurrentUser, id: Option<UserId>, api_base: &str) -> ActionResult {
    let Some(id) = id else {
        return ActionResult::failure("Must specify an id for deleting a user");
    };
    match destroy_user(conn, current_user, id).await {
        Ok(()) => ActionResult::success(format!("Deleting user id: {id}")).with_href(Collection::Users.href(api_base, id)),
        Err(e) => ActionResult::from_error(&e),
    }
}

async fn set_current_group(conn: &mut PgConnection, current_user: &CurrentUser, id: UserId, attrs: &Attributes) -> Result<UserDBResponse> {
    let failed = |reason: &str| Error::bad_request(format!("Cannot set current_group - {reason}"));

    if id != current_user.id {
        return Err(failed("Can only edit authenticated user's current group"));
    }
    let reference = attrs
        .get("current_group")
        .and_then(|value| Reference::parse(value, "description"))
        .ok_or_else(|| failed("Must specify a current_group"))?;

    let user = Users::new(conn).get_by_id(id).await?.ok_or_else(|| not_found(Collection::Users, id))?;
    let group_id = match reference {
        Reference::Id(group_id) => Some(group_id),
        Reference::Key(description) => Groups::new(conn).get_by_description(&description).await?.map(|g| g.id),
    };
    let group_id = group_id
        .filter(|group_id| user.group_ids.contains(group_id))
        .ok_or_else(|| failed("User must belong to group"))?;

    Ok(Users::new(conn).set_current_group(id, group_id).await?)
}

async fn revoke_sessions(conn: &mut PgConnection, current_user: &CurrentUser, id: UserId) -> Result<ActionResult> {
    if id != current_user.id && !current_user.role_allows(REVOKE_USER_SESSIONS) {
        return Err(Error::Forbidden {
            message: "The user is not authorized for this task or item.".to_string(),
        });
    }

    let outcome = async {
        let user = Users::new(&mut *conn).get_by_id(id).await?.ok_or_else(|| not_found(Collection::Users, id))?;
        info!(userid = %user.userid, "Revoking all sessions");
        session::revoke_all(&mut *conn, user.id).await?;
        Ok::<_, Error>(user.userid)
    }
    .await;

    Ok(match outcome {
        Ok(userid) => ActionResult::success(format!("All sessions revoked successfully for user {userid}.")),
        Err(e) => ActionResult::from_error(&e),
    })
}

fn require_self_or_admin(current_user: &CurrentUser, id: UserId) -> Result<()> {
    if id == current_user.id || current_user.is_super_admin() {
        Ok(())
    } else {
        Err(Error::bad_request("User unauthorized."))
    }
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

async fn create_tfa(state: &AppState, current_user: &CurrentUser, id: UserId) -> Result<OtpTokenResponse> {
    require_self_or_admin(current_user, id)?;

    let mut tx = state.db.begin().await?;
    let user = Users::new(&mut tx).get_by_id(id).await?.ok_or_else(|| not_found(Collection::Users, id))?;

    let secret = otp::generate_secret();
    let encrypted = state.cipher.encrypt(&secret)?;
    match TwoFactors::new(&mut tx).lookup_by_user_id(id).await? {
        Some(_) => TwoFactors::new(&mut tx).regenerate(id, &encrypted).await?,
        None => TwoFactors::new(&mut tx).create(id, &encrypted).await?,
    };
    Users::new(&mut tx).set_enable_two_factors(id, true).await?;
    tx.commit().await?;

    let settings = OtpSettings::from(&state.config.otp);
    let otp_token = otp::format_otp_token(&state.config.otp.issuer, &user.userid, &secret, settings)?;
    info!(user_id = id, "Two-factor enrolment pending");
    Ok(OtpTokenResponse { otp_token })
}

/// Check `otp` from the request against the user's stored secret.
async fn check_otp(state: &AppState, conn: &mut PgConnection, id: UserId, attrs: &Attributes) -> Result<()> {
    let record = TwoFactors::new(conn)
        .lookup_by_user_id(id)
        .await?
        .ok_or_else(|| Error::bad_request("User has not enabled TFA"))?;
    let secret = state.cipher.decrypt(&record.secret)?;
    let code = string_attr(attrs, "otp")?.unwrap_or_default();

    if otp::verify(&secret, &code, unix_now(), OtpSettings::from(&state.config.otp)) {
        Ok(())
    } else {
        Err(Error::bad_request("Invalid OTP"))
    }
}

async fn verify_otp(state: &AppState, current_user: &CurrentUser, id: UserId, attrs: &Attributes) -> Result<ActionResult> {
    require_self_or_admin(current_user, id)?;
    let mut conn = state.db.acquire().await?;
    check_otp(state, &mut conn, id, attrs).await?;
    TwoFactors::new(&mut conn).set_status(id, TwoFactorStatus::Enabled).await?;
    Ok(ActionResult::success("OTP verified"))
}

async fn disable_tfa(state: &AppState, current_user: &CurrentUser, id: UserId, attrs: &Attributes) -> Result<ActionResult> {
    require_self_or_admin(current_user, id)?;
    let mut tx = state.db.begin().await?;
    let user = Users::new(&mut tx).get_by_id(id).await?.ok_or_else(|| not_found(Collection::Users, id))?;
    if !user.enable_two_factors {
        return Err(Error::bad_request("User has not enabled TFA"));
    }
    check_otp(state, &mut tx, id, attrs).await?;

    TwoFactors::new(&mut tx).set_status(id, TwoFactorStatus::Disabled).await?;
    Users::new(&mut tx).set_enable_two_factors(id, false).await?;
    tx.commit().await?;
    info!(user_id = id, "Two-factor authentication disabled");
    Ok(ActionResult::success("Two-factor authentication disabled"))
}

/// Callers may always read themselves; anyone else needs `users_read`.
fn require_read(current_user: &CurrentUser, id: UserId) -> Result<()> {
    if id == current_user.id {
        Ok(())
    } else {
        current_user.require(Collection::Users, "read")
    }
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Users collection", body = CollectionResponse<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing users_read"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    _: RequiresPermission<resource::Users, operation::Read>,
) -> Result<Json<CollectionResponse<UserResponse>>> {
    let mut conn = state.db.acquire().await?;
    let mut repo = Users::new(&mut conn);
    let count = repo.count().await?;
    let users = repo.list(&query.page(&state.config.api)).await?;

    let api_base = state.api_base();
    let users = users.into_iter().map(|u| UserResponse::new(u, &api_base)).collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::Users,
        count,
        users,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Show a user",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 403, description = "Missing users_read"),
        (status = 404, description = "User not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>, current_user: CurrentUser) -> Result<Json<UserResponse>> {
    let id = path_id(Collection::Users, &id)?;
    require_read(&current_user, id)?;

    let mut conn = state.db.acquire().await?;
    let user = Users::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(Collection::Users, id))?;
    Ok(Json(UserResponse::new(user, &state.api_base())))
}

#[utoipa::path(
    get,
    path = "/users/{id}/user_profiles",
    tag = "users",
    summary = "A user's profile, as a subcollection",
    params(("id" = String, Path, description = "User id"), CollectionQuery),
    responses(
        (status = 200, description = "Profiles of the user", body = CollectionResponse<UserProfileResponse>),
        (status = 404, description = "User not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_user_profiles(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CollectionQuery>,
    current_user: CurrentUser,
) -> Result<Json<CollectionResponse<UserProfileResponse>>> {
    let id = path_id(Collection::Users, &id)?;
    require_read(&current_user, id)?;

    let mut conn = state.db.acquire().await?;
    if Users::new(&mut conn).get_by_id(id).await?.is_none() {
        return Err(not_found(Collection::Users, id));
    }
    let api_base = state.api_base();
    let profiles: Vec<_> = UserProfiles::new(&mut conn)
        .get_for_user(id)
        .await?
        .into_iter()
        .map(|p| UserProfileResponse::new(p, &api_base))
        .collect();

    Ok(Json(CollectionResponse::for_collection(
        Collection::UserProfiles,
        profiles.len() as i64,
        profiles,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create, edit or delete users",
    description = "A bare body creates a user along with a private tenant and group. Bulk `edit` and \
                   `delete` take `resources`. `revoke_sessions` and `set_current_group` act on the caller.",
    request_body(content = Object, description = "Action request"),
    responses(
        (status = 200, description = "`{user, user_profile}` for create and edit, otherwise action results", body = UserWithProfile),
        (status = 400, description = "Invalid attributes, or the creation failed and was rolled back"),
        (status = 403, description = "Missing feature"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn post_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<ActionResponse<UserActionBody>>> {
    let request = ActionRequest::parse(body)?;
    let bulk = request.is_bulk();
    let action = request.action.clone();
    let api_base = state.api_base();

    let outcomes = match action.as_str() {
        "create" => {
            current_user.require(Collection::Users, "create")?;
            let mut outcomes = Vec::new();
            for attrs in request.into_items() {
                outcomes.push(ActionOutcome::Resource(UserActionBody::WithProfile(create_user(&state, attrs).await?)));
            }
            outcomes
        }
        "edit" => {
            let mut outcomes = Vec::new();
            for mut attrs in request.into_items() {
                let id = target_id(&attrs).ok_or_else(|| Error::bad_request("Must specify an id for editing a user"))?;
                strip_identity(&mut attrs);
                check_edit_scope(&current_user, id, &attrs)?;
                outcomes.push(ActionOutcome::Resource(UserActionBody::WithProfile(
                    edit_user(&state, &current_user, id, attrs).await?,
                )));
            }
            outcomes
        }
        "delete" => {
            current_user.require(Collection::Users, "delete")?;
            let mut conn = state.db.acquire().await?;
            let mut outcomes: Vec<ActionOutcome<UserActionBody>> = Vec::new();
            for attrs in request.into_items() {
                outcomes.push(delete_user_action(&mut conn, &current_user, target_id(&attrs), &api_base).await.into());
            }
            outcomes
        }
        "revoke_sessions" => {
            let mut conn = state.db.acquire().await?;
            vec![ActionOutcome::Result(revoke_sessions(&mut conn, &current_user, current_user.id).await?)]
        }
        "set_current_group" => {
            let mut conn = state.db.acquire().await?;
            let user = set_current_group(&mut conn, &current_user, current_user.id, &request.into_single()).await?;
            vec![ActionOutcome::Resource(UserActionBody::User(UserResponse::new(user, &api_base)))]
        }
        other => return Err(unsupported_action(Collection::Users, other)),
    };

    Ok(Json(ActionResponse::new(bulk, outcomes)))
}

#[utoipa::path(
    post,
    path = "/users/{id}",
    tag = "users",
    summary = "Act on one user",
    description = "Actions: `edit`, `delete`, `set_current_group`, `revoke_sessions`, `create_tfa`, \
                   `verify_otp`, `disable_tfa`.",
    params(("id" = String, Path, description = "User id")),
    request_body(content = Object, description = "`{\"action\": ..., \"resource\": {...}}`"),
    responses(
        (status = 200, description = "The user, an OTP token, or an action result", body = UserWithProfile),
        (status = 400, description = "Invalid attributes or action"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn post_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    current_user: CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<ActionResponse<UserActionBody>>> {
    let id = path_id(Collection::Users, &id)?;
    let request = ActionRequest::parse(body)?;
    let action = request.action.clone();
    let api_base = state.api_base();
    let attrs = request.into_single();

    let response = match action.as_str() {
        "edit" => {
            check_edit_scope(&current_user, id, &attrs)?;
            ActionResponse::resource(UserActionBody::WithProfile(edit_user(&state, &current_user, id, attrs).await?))
        }
        "delete" => {
            current_user.require(Collection::Users, "delete")?;
            let mut conn = state.db.acquire().await?;
            destroy_user(&mut conn, &current_user, id).await?;
            ActionResponse::result(ActionResult::success(format!("Deleting user id: {id}")).with_href(Collection::Users.href(&api_base, id)))
        }
        "set_current_group" => {
            let mut conn = state.db.acquire().await?;
            let user = set_current_group(&mut conn, &current_user, id, &attrs).await?;
            ActionResponse::resource(UserActionBody::User(UserResponse::new(user, &api_base)))
        }
        "revoke_sessions" => {
            let mut conn = state.db.acquire().await?;
            ActionResponse::result(revoke_sessions(&mut conn, &current_user, id).await?)
        }
        "create_tfa" => ActionResponse::resource(UserActionBody::OtpToken(create_tfa(&state, &current_user, id).await?)),
        "verify_otp" => ActionResponse::result(verify_otp(&state, &current_user, id, &attrs).await?),
        "disable_tfa" => ActionResponse::result(disable_tfa(&state, &current_user, id, &attrs).await?),
        other => return Err(unsupported_action(Collection::Users, other)),
    };

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete a user",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot delete the calling user"),
        (status = 403, description = "Missing users_delete"),
        (status = 404, description = "User not found"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>, current_user: CurrentUser) -> Result<StatusCode> {
    current_user.require(Collection::Users, "delete")?;
    let id = path_id(Collection::Users, &id)?;
    let mut conn = state.db.acquire().await?;
    destroy_user(&mut conn, &current_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
