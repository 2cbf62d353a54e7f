//! Common type definitions: entity ids, the collection catalogue and feature identifiers.
//!
//! # ID Types
//!
//! Every table uses a `BIGSERIAL` primary key. The aliases below exist to make signatures read
//! well; on the wire ids are rendered as strings (`"id": "42"`).
//!
//! # Collections
//!
//! [`Collection`] names every REST collection under `/api`. It is the single place where a
//! collection's URL segment, its singular display name and its feature identifiers come from:
//!
//! ```ignore
//! use infractl::types::Collection;
//!
//! assert_eq!(Collection::Groups.identifier("create"), "groups_create");
//! assert_eq!(Collection::Groups.href("http://h/api", 3), "http://h/api/groups/3");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Id = i64;
pub type UserId = Id;
pub type GroupId = Id;
pub type TenantId = Id;
pub type RoleId = Id;
pub type ProviderId = Id;
pub type TaskId = Id;

/// Feature identifier allowing a caller to revoke sessions of users other than themselves.
pub const REVOKE_USER_SESSIONS: &str = "revoke_user_sessions";

/// Name of the built-in role that is allowed every feature.
pub const SUPER_ADMIN_ROLE: &str = "super_administrator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    UserProfiles,
    Groups,
    Tenants,
    Roles,
    Providers,
    AuthKeyPairs,
    LoadBalancers,
    LoadBalancerPools,
    LoadBalancerPoolMembers,
    LoadBalancerListeners,
    LoadBalancerHealthChecks,
    BackupSchedules,
    FloatingIps,
    CloudVolumes,
    AutomateWorkspaces,
    Events,
    PolicyActions,
    Policies,
    MetricRollups,
    Tasks,
}

impl Collection {
    /// Collections listed by the API entrypoint.
    pub const ALL: [Collection; 21] = [
        Collection::Users,
        Collection::UserProfiles,
        Collection::Groups,
        Collection::Tenants,
        Collection::Roles,
        Collection::Providers,
        Collection::AuthKeyPairs,
        Collection::LoadBalancers,
        Collection::LoadBalancerPools,
        Collection::LoadBalancerPoolMembers,
        Collection::LoadBalancerListeners,
        Collection::LoadBalancerHealthChecks,
        Collection::BackupSchedules,
        Collection::FloatingIps,
        Collection::CloudVolumes,
        Collection::AutomateWorkspaces,
        Collection::Events,
        Collection::PolicyActions,
        Collection::Policies,
        Collection::MetricRollups,
        Collection::Tasks,
    ];

    /// URL segment, e.g. `load_balancer_pools`.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::UserProfiles => "user_profiles",
            Collection::Groups => "groups",
            Collection::Tenants => "tenants",
            Collection::Roles => "roles",
            Collection::Providers => "providers",
            Collection::AuthKeyPairs => "auth_key_pairs",
            Collection::LoadBalancers => "load_balancers",
            Collection::LoadBalancerPools => "load_balancer_pools",
            Collection::LoadBalancerPoolMembers => "load_balancer_pool_members",
            Collection::LoadBalancerListeners => "load_balancer_listeners",
            Collection::LoadBalancerHealthChecks => "load_balancer_health_checks",
            Collection::BackupSchedules => "backup_schedules",
            Collection::FloatingIps => "floating_ips",
            Collection::CloudVolumes => "cloud_volumes",
            Collection::AutomateWorkspaces => "automate_workspaces",
            Collection::Events => "events",
            Collection::PolicyActions => "policy_actions",
            Collection::Policies => "policies",
            Collection::MetricRollups => "metric_rollups",
            Collection::Tasks => "tasks",
        }
    }

    /// Human name of one member, used in messages ("Deleting group id: 3").
    pub fn singular(self) -> &'static str {
        match self {
            Collection::Users => "user",
            Collection::UserProfiles => "user profile",
            Collection::Groups => "group",
            Collection::Tenants => "tenant",
            Collection::Roles => "role",
            Collection::Providers => "provider",
            Collection::AuthKeyPairs => "key pair",
            Collection::LoadBalancers => "load balancer",
            Collection::LoadBalancerPools => "load balancer pool",
            Collection::LoadBalancerPoolMembers => "load balancer pool member",
            Collection::LoadBalancerListeners => "load balancer listener",
            Collection::LoadBalancerHealthChecks => "load balancer health check",
            Collection::BackupSchedules => "backup schedule",
            Collection::FloatingIps => "floating ip",
            Collection::CloudVolumes => "cloud volume",
            Collection::AutomateWorkspaces => "automate workspace",
            Collection::Events => "event",
            Collection::PolicyActions => "policy action",
            Collection::Policies => "policy",
            Collection::MetricRollups => "metric rollup",
            Collection::Tasks => "task",
        }
    }

    /// Record type named in "not found" messages ("Couldn't find Group with 'id'=3").
    pub fn model(self) -> &'static str {
        match self {
            Collection::Users => "User",
            Collection::UserProfiles => "UserProfile",
            Collection::Groups => "Group",
            Collection::Tenants => "Tenant",
            Collection::Roles => "Role",
            Collection::Providers => "Provider",
            Collection::AuthKeyPairs => "AuthKeyPair",
            Collection::LoadBalancers => "LoadBalancer",
            Collection::LoadBalancerPools => "LoadBalancerPool",
            Collection::LoadBalancerPoolMembers => "LoadBalancerPoolMember",
            Collection::LoadBalancerListeners => "LoadBalancerListener",
            Collection::LoadBalancerHealthChecks => "LoadBalancerHealthCheck",
            Collection::BackupSchedules => "BackupSchedule",
            Collection::FloatingIps => "FloatingIp",
            Collection::CloudVolumes => "CloudVolume",
            Collection::AutomateWorkspaces => "AutomateWorkspace",
            Collection::Events => "Event",
            Collection::PolicyActions => "PolicyAction",
            Collection::Policies => "Policy",
            Collection::MetricRollups => "MetricRollup",
            Collection::Tasks => "Task",
        }
    }

    /// Feature identifier gating `action` on this collection, e.g. `groups_delete`.
    pub fn identifier(self, action: &str) -> String {
        format!("{}_{}", self.name(), action)
    }

    pub fn collection_href(self, api_base: &str) -> String {
        format!("{}/{}", api_base, self.name())
    }

    pub fn href(self, api_base: &str, id: impl fmt::Display) -> String {
        format!("{}/{}/{}", api_base, self.name(), id)
    }

    /// Href of a member of `self` nested under a parent resource.
    pub fn nested_href(self, parent_href: &str, id: impl fmt::Display) -> String {
        format!("{}/{}/{}", parent_href, self.name(), id)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse an id from a path segment. Anything that is not a positive integer is "not found"
/// rather than a bad request, matching how unknown ids behave.
pub fn parse_id(raw: &str) -> Option<Id> {
    raw.parse::<Id>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_and_hrefs() {
        assert_eq!(Collection::AuthKeyPairs.identifier("create"), "auth_key_pairs_create");
        assert_eq!(Collection::Groups.href("http://localhost:3000/api", 12), "http://localhost:3000/api/groups/12");
        assert_eq!(
            Collection::LoadBalancerPools.nested_href("http://h/api/load_balancers/1", 4),
            "http://h/api/load_balancers/1/load_balancer_pools/4"
        );
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_id("d5d5f9a2-0000-4000-8000-000000000000"), None);
    }

    #[test]
    fn test_all_collections_have_distinct_names() {
        let mut names: Vec<_> = Collection::ALL.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Collection::ALL.len());
    }
}
