//! Database record models matching table schemas.
//!
//! Each `*DBResponse` derives `sqlx::FromRow` and mirrors one row (user rows additionally carry
//! their group memberships). `*DBRequest` structs carry what a repository writes. API models in
//! [`crate::api::models`] are built from these with `new(record, api_base)` so every rendered
//! resource gets its `href`.

pub mod automate_workspaces;
pub mod cloud_volumes;
pub mod floating_ips;
pub mod groups;
pub mod key_pairs;
pub mod load_balancers;
pub mod metric_rollups;
pub mod policies;
pub mod providers;
pub mod roles;
pub mod sessions;
pub mod tasks;
pub mod tenants;
pub mod two_factors;
pub mod user_profiles;
pub mod users;
