//! HTTP request handlers, one module per collection.
//!
//! Read endpoints take a [`RequiresPermission`](crate::auth::permissions::RequiresPermission)
//! extractor. Action endpoints (`POST` with an action body, bare `DELETE`) authenticate with
//! [`CurrentUser`](crate::api::models::users::CurrentUser) and check `<collection>_<action>`
//! once the action is known.
//!
//! - [`entrypoint`]: `GET /api`, token issue and revoke at `/api/auth`
//! - [`users`]: users, profiles, current group, sessions, two-factor enrolment
//! - [`groups`]: groups and their entitlements
//! - [`tenants`], [`roles`], [`providers`], [`tasks`]: read-only catalogues
//! - [`key_pairs`]: key pairs, queued create/delete and synchronous ssh key generation
//! - [`load_balancers`]: load balancers, pools and their subcollections
//! - [`floating_ips`], [`cloud_volumes`]: network and storage inventory
//! - [`automate_workspaces`]: workspace edit and secret encrypt/decrypt
//! - [`policies`]: events, policy actions and policies
//! - [`metric_rollups`]: windowed, paged metrics

pub mod automate_workspaces;
pub mod cloud_volumes;
pub mod entrypoint;
pub mod floating_ips;
pub mod groups;
pub mod key_pairs;
pub mod load_balancers;
pub mod metric_rollups;
pub mod policies;
pub mod providers;
pub mod roles;
pub mod tasks;
pub mod tenants;
pub mod users;

use crate::errors::{Error, Result};
use crate::types::{Collection, Id, parse_id};

/// Id from a path segment. Non-numeric segments are missing records, not bad requests.
pub(crate) fn path_id(collection: Collection, raw: &str) -> Result<Id> {
    parse_id(raw).ok_or_else(|| not_found(collection, raw))
}

pub(crate) fn not_found(collection: Collection, id: impl ToString) -> Error {
    Error::not_found(collection.model(), id)
}

pub(crate) fn unsupported_action(collection: Collection, action: &str) -> Error {
    Error::bad_request(format!(
        "Unsupported Action {action} for the {} resource specified",
        collection.name()
    ))
}

/// Reject `id`/`href` in a create payload.
pub(crate) fn forbid_identity_on_create(collection: Collection, attrs: &crate::api::request::Attributes) -> Result<()> {
    if crate::api::request::has_identity(attrs) {
        return Err(Error::bad_request(format!(
            "Resource id or href should not be specified for creating a new {}",
            collection.name()
        )));
    }
    Ok(())
}
