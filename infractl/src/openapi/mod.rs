//! OpenAPI document for everything under `/api`, served by Scalar at `/api/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::{self, handlers};

/// The three ways a caller can authenticate.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "BasicAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Basic)
                    .description(Some("Userid and password of a local user."))
                    .build(),
            ),
        );
        components.add_security_scheme(
            "AuthToken",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "X-Auth-Token",
                "Session token issued by `GET /api/auth`.",
            ))),
        );
        components.add_security_scheme(
            "ProxyHeader",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "X-Remote-User",
                "Userid asserted by a trusted authenticating proxy. The header name is configurable.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    servers((url = "/api")),
    paths(
        handlers::entrypoint::get_entrypoint,
        handlers::entrypoint::issue_auth_token,
        handlers::entrypoint::revoke_auth_token,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::list_user_profiles,
        handlers::users::post_users,
        handlers::users::post_user,
        handlers::users::delete_user,
        handlers::groups::list_groups,
        handlers::groups::get_group,
        handlers::groups::post_groups,
        handlers::groups::post_group,
        handlers::groups::delete_group,
        handlers::tenants::list_tenants,
        handlers::tenants::get_tenant,
        handlers::roles::list_roles,
        handlers::roles::get_role,
        handlers::providers::list_providers,
        handlers::providers::get_provider,
        handlers::tasks::list_tasks,
        handlers::tasks::get_task,
        handlers::key_pairs::list_key_pairs,
        handlers::key_pairs::get_key_pair,
        handlers::key_pairs::post_key_pairs,
        handlers::key_pairs::post_key_pair,
        handlers::key_pairs::delete_key_pair,
        handlers::load_balancers::list_load_balancers,
        handlers::load_balancers::get_load_balancer,
        handlers::load_balancers::list_load_balancer_subcollection,
        handlers::load_balancers::list_pools,
        handlers::load_balancers::get_pool,
        handlers::load_balancers::list_pool_subcollection,
        handlers::floating_ips::list_floating_ips,
        handlers::floating_ips::get_floating_ip,
        handlers::floating_ips::post_floating_ips,
        handlers::cloud_volumes::list_cloud_volumes,
        handlers::cloud_volumes::get_cloud_volume,
        handlers::cloud_volumes::list_cloud_volume_subcollection,
        handlers::cloud_volumes::post_cloud_volumes,
        handlers::cloud_volumes::post_cloud_volume,
        handlers::cloud_volumes::delete_cloud_volume,
        handlers::automate_workspaces::list_workspaces,
        handlers::automate_workspaces::get_workspace,
        handlers::automate_workspaces::post_workspace,
        handlers::policies::list_events,
        handlers::policies::get_event,
        handlers::policies::list_policy_actions,
        handlers::policies::get_policy_action,
        handlers::policies::list_policies,
        handlers::policies::get_policy,
        handlers::policies::list_policy_subcollection,
        handlers::metric_rollups::list_metric_rollups,
        handlers::metric_rollups::get_metric_rollup,
    ),
    components(
        schemas(
            api::models::actions::ActionResult,
            api::models::collections::Links,
            api::models::entrypoint::EntrypointResponse,
            api::models::entrypoint::CollectionLink,
            api::models::entrypoint::AuthTokenResponse,
            api::models::users::UserResponse,
            api::models::users::UserSummary,
            api::models::users::UserProfileResponse,
            api::models::users::UserWithProfile,
            api::models::users::OtpTokenResponse,
            api::models::groups::GroupResponse,
            api::models::tenants::TenantResponse,
            api::models::roles::RoleResponse,
            api::models::providers::ProviderResponse,
            api::models::tasks::TaskResponse,
            api::models::key_pairs::KeyPairResponse,
            api::models::key_pairs::SshKeyPair,
            api::models::load_balancers::LoadBalancerResponse,
            api::models::load_balancers::LoadBalancerPoolResponse,
            api::models::load_balancers::LoadBalancerPoolMemberResponse,
            api::models::load_balancers::LoadBalancerListenerResponse,
            api::models::load_balancers::LoadBalancerHealthCheckResponse,
            api::models::floating_ips::FloatingIpResponse,
            api::models::floating_ips::QueryResult,
            api::models::cloud_volumes::CloudVolumeResponse,
            api::models::cloud_volumes::BackupScheduleResponse,
            api::models::automate_workspaces::AutomateWorkspaceResponse,
            api::models::automate_workspaces::DecryptRequest,
            api::models::automate_workspaces::EncryptRequest,
            api::models::automate_workspaces::DecryptedValue,
            api::models::policies::EventResponse,
            api::models::policies::PolicyActionResponse,
            api::models::policies::PolicyResponse,
            api::models::metric_rollups::MetricRollupResponse,
            api::subcollections::NestedResource,
            handlers::policies::PolicyMember,
        )
    ),
    tags(
        (name = "entrypoint", description = "Collection discovery and session tokens."),
        (name = "users", description = "Local users, their profiles, current group and two-factor enrolment."),
        (name = "groups", description = "Groups and the role and tenant they grant."),
        (name = "tenants", description = "Tenants that own groups."),
        (name = "roles", description = "Roles and the feature identifiers they grant."),
        (name = "providers", description = "Cloud providers."),
        (name = "tasks", description = "Queued work and its outcome. Callers without `tasks_read` only see their own tasks."),
        (name = "auth_key_pairs", description = "Key pairs. Create and delete are queued as tasks."),
        (name = "load_balancers", description = "Load balancers, pools and their members, listeners and health checks."),
        (name = "floating_ips", description = "Floating IPs."),
        (name = "cloud_volumes", description = "Cloud volumes and their backup schedules. Delete is queued as a task."),
        (name = "automate_workspaces", description = "Automate workspaces. Addressed by guid only."),
        (name = "policies", description = "Policies, the events that trigger them and the actions they run."),
        (name = "metric_rollups", description = "Hourly and daily performance rollups."),
    ),
    info(
        title = "infractl API",
        version = "1.0.0",
        description = "Resources are exposed as collections. A collection `GET` returns `name`, `count`, `subcount` and the
member hrefs; pass `expand=resources` for full members. Mutations are `POST` bodies naming an action:

```json
{\"action\": \"edit\", \"resource\": {\"description\": \"ops\"}}
{\"action\": \"delete\", \"resources\": [{\"href\": \"/api/groups/3\"}]}
```

Bulk requests answer `{\"results\": [...]}` with one entry per requested resource.

## Errors

```json
{\"error\": {\"kind\": \"bad_request\", \"message\": \"Invalid attribute(s) id specified for a user\"}}
```",
    ),
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_documented_with_security() {
        let doc = ApiDoc::openapi();
        for path in ["/", "/users/{id}", "/auth_key_pairs", "/policies/{id}/{subcollection}", "/metric_rollups"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        for scheme in ["BasicAuth", "AuthToken", "ProxyHeader"] {
            assert!(schemes.contains_key(scheme), "missing {scheme}");
        }
    }
}
