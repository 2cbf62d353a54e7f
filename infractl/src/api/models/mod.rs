//! API request and response data models.
//!
//! Models here are the public wire contract and are kept apart from the `*DBResponse` rows in
//! [`crate::db::models`]. Every resource model is built with `new(record, api_base)` (or with an
//! explicit `href` for nested resources), renders its ids as strings, and implements
//! [`collections::Linked`] so it can appear in a collection either in full or as an `{href}` stub.
//!
//! - [`actions`]: the `{success, message, task_id?, ...}` envelope returned by actions
//! - [`collections`]: `{name, count, subcount, resources}` rendering and listing queries
//! - [`users`]: users, profiles and the authenticated [`users::CurrentUser`]
//! - [`entrypoint`]: `GET /api` and issued auth tokens

pub mod actions;
pub mod automate_workspaces;
pub mod cloud_volumes;
pub mod collections;
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
