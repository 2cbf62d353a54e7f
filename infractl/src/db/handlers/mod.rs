//! Repository implementations for database access.
//!
//! Every repository wraps a `&mut PgConnection`, so the same code runs on a pooled connection
//! for reads and inside a transaction for multi-step writes such as user creation:
//!
//! ```ignore
//! use infractl::db::handlers::{Repository, Tenants, Users};
//!
//! let mut tx = pool.begin().await?;
//! let root = Tenants::new(&mut tx).root().await?;
//! let user = Users::new(&mut tx).create(&request).await?;
//! tx.commit().await?;
//! ```
//!
//! Tables the API writes to (users, groups, key pairs) implement [`Repository`]. Read-mostly
//! inventory tables expose inherent `get_by_id`/`list`/`count` methods only.

pub mod automate_workspaces;
pub mod cloud_volumes;
pub mod floating_ips;
pub mod groups;
pub mod key_pairs;
pub mod load_balancers;
pub mod metric_rollups;
pub mod policies;
pub mod providers;
pub mod repository;
pub mod roles;
pub mod sessions;
pub mod tasks;
pub mod tenants;
pub mod two_factors;
pub mod user_profiles;
pub mod users;

pub use automate_workspaces::AutomateWorkspaces;
pub use cloud_volumes::CloudVolumes;
pub use floating_ips::FloatingIps;
pub use groups::Groups;
pub use key_pairs::KeyPairs;
pub use load_balancers::LoadBalancers;
pub use metric_rollups::MetricRollups;
pub use policies::{Events, Policies, PolicyActions};
pub use providers::Providers;
pub use repository::{Page, Repository};
pub use roles::Roles;
pub use sessions::Sessions;
pub use tasks::Tasks;
pub use tenants::Tenants;
pub use two_factors::TwoFactors;
pub use user_profiles::UserProfiles;
pub use users::Users;
