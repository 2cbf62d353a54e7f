//! Test utilities: configuration, app state, and seed rows for integration tests.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    AppState, SUPER_ADMIN_GROUP,
    config::{AuthMode, Config},
    crypto::SecretCipher,
    db::{
        handlers::{Groups, Repository, Roles, Tenants, Users},
        models::{
            automate_workspaces::AutomateWorkspaceDBResponse,
            cloud_volumes::CloudVolumeDBResponse,
            floating_ips::FloatingIpDBResponse,
            groups::{GroupCreateDBRequest, GroupType},
            key_pairs::KeyPairDBResponse,
            load_balancers::{LoadBalancerDBResponse, LoadBalancerPoolDBResponse},
            policies::{EventDBResponse, PolicyActionDBResponse, PolicyDBResponse},
            providers::ProviderDBResponse,
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    tasks::PgTaskQueue,
    types::{GroupId, Id, ProviderId},
};

pub const TEST_SECRET_KEY: &str = "test-secret-key-for-testing-only";

pub async fn create_test_app(pool: PgPool) -> (TestServer, crate::BackgroundServices) {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

/// Database authentication with the proxy header also enabled, so tests can impersonate users
/// with [`add_auth_headers`]. The task worker is off; tests drive it with `process_batch`.
pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some(TEST_SECRET_KEY.to_string()),
        public_url: "http://localhost:3000".to_string(),
        ..Default::default()
    };
    config.authentication.mode = AuthMode::Database;
    config.authentication.proxy_header.enabled = true;
    config.tasks.enabled = false;
    config
}

pub fn create_test_state(pool: PgPool) -> AppState {
    AppState::builder()
        .db(pool.clone())
        .config(create_test_config())
        .task_queue(Arc::new(PgTaskQueue::new(pool)))
        .cipher(SecretCipher::new(TEST_SECRET_KEY))
        .build()
}

/// Header impersonating `user` through the trusted proxy.
pub fn add_auth_headers(user: &UserDBResponse) -> (String, String) {
    let config = create_test_config();
    (config.authentication.proxy_header.header_name, user.userid.clone())
}

/// A group whose role grants exactly `features`.
pub async fn create_test_group(pool: &PgPool, features: &[&str]) -> GroupId {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let suffix = Uuid::new_v4().simple().to_string();

    let features: Vec<String> = features.iter().map(|f| f.to_string()).collect();
    let role = Roles::new(&mut conn)
        .upsert(&format!("test_role_{suffix}"), &features)
        .await
        .expect("Failed to create test role");
    let tenant = Tenants::new(&mut conn).root().await.expect("Root tenant is seeded");

    Groups::new(&mut conn)
        .create(&GroupCreateDBRequest {
            description: format!("test_group_{suffix}"),
            group_type: GroupType::User,
            tenant_id: tenant.id,
            role_id: Some(role.id),
            filters: None,
            filter_expression: None,
        })
        .await
        .expect("Failed to create test group")
        .id
}

async fn create_user_in(pool: &PgPool, group_id: GroupId, prefix: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let userid = format!("{prefix}_{}", Uuid::new_v4().simple());

    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            userid: userid.clone(),
            name: format!("Test {userid}"),
            email: Some(format!("{userid}@example.com")),
            phone_number: None,
            password_hash: None,
            settings: serde_json::json!({}),
            group_ids: vec![group_id],
            status: true,
        })
        .await
        .expect("Failed to create test user")
}

/// A user whose current group's role grants exactly `features`.
pub async fn create_test_user(pool: &PgPool, features: &[&str]) -> UserDBResponse {
    let group_id = create_test_group(pool, features).await;
    create_user_in(pool, group_id, "testuser").await
}

/// A member of the seeded super administrator group.
pub async fn create_test_admin_user(pool: &PgPool) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let group = Groups::new(&mut conn)
        .get_by_description(SUPER_ADMIN_GROUP)
        .await
        .expect("Failed to look up admin group")
        .expect("Admin group is seeded");
    create_user_in(pool, group.id, "testadmin").await
}

pub async fn create_test_provider(pool: &PgPool, kind: &str) -> ProviderDBResponse {
    sqlx::query_as::<_, ProviderDBResponse>("INSERT INTO providers (name, kind) VALUES ($1, $2) RETURNING *")
        .bind(format!("{kind}-{}", Uuid::new_v4().simple()))
        .bind(kind)
        .fetch_one(pool)
        .await
        .expect("Failed to create test provider")
}

pub async fn create_test_key_pair(pool: &PgPool, provider_id: Option<ProviderId>, name: &str) -> KeyPairDBResponse {
    sqlx::query_as::<_, KeyPairDBResponse>("INSERT INTO auth_key_pairs (name, provider_id) VALUES ($1, $2) RETURNING *")
        .bind(name)
        .bind(provider_id)
        .fetch_one(pool)
        .await
        .expect("Failed to create test key pair")
}

pub async fn create_test_cloud_volume(pool: &PgPool, provider_id: ProviderId, name: &str) -> CloudVolumeDBResponse {
    sqlx::query_as::<_, CloudVolumeDBResponse>(
        "INSERT INTO cloud_volumes (name, size, status, provider_id) VALUES ($1, 1073741824, 'available', $2) RETURNING *",
    )
    .bind(name)
    .bind(provider_id)
    .fetch_one(pool)
    .await
    .expect("Failed to create test cloud volume")
}

pub async fn create_test_floating_ip(pool: &PgPool, provider_id: ProviderId, address: &str) -> FloatingIpDBResponse {
    sqlx::query_as::<_, FloatingIpDBResponse>(
        "INSERT INTO floating_ips (address, status, provider_id) VALUES ($1, 'DOWN', $2) RETURNING *",
    )
    .bind(address)
    .bind(provider_id)
    .fetch_one(pool)
    .await
    .expect("Failed to create test floating ip")
}

/// A load balancer with one pool holding one member, one listener and one health check on that
/// pool.
pub async fn create_test_load_balancer(pool: &PgPool, provider_id: ProviderId) -> (LoadBalancerDBResponse, LoadBalancerPoolDBResponse) {
    let load_balancer = sqlx::query_as::<_, LoadBalancerDBResponse>(
        "INSERT INTO load_balancers (name, ems_ref, provider_id) VALUES ('lb-1', 'ref-lb-1', $1) RETURNING *",
    )
    .bind(provider_id)
    .fetch_one(pool)
    .await
    .expect("Failed to create test load balancer");

    let lb_pool = sqlx::query_as::<_, LoadBalancerPoolDBResponse>(
        "INSERT INTO load_balancer_pools (load_balancer_id, name, load_balancer_algorithm, protocol) VALUES ($1, 'pool-1', 'ROUND_ROBIN', 'HTTP') RETURNING *",
    )
    .bind(load_balancer.id)
    .fetch_one(pool)
    .await
    .expect("Failed to create test pool");

    sqlx::query("INSERT INTO load_balancer_pool_members (pool_id, address, port) VALUES ($1, '10.0.0.5', 8080)")
        .bind(lb_pool.id)
        .execute(pool)
        .await
        .expect("Failed to create test pool member");
    sqlx::query(
        "INSERT INTO load_balancer_listeners (load_balancer_id, name, load_balancer_protocol, load_balancer_port, instance_protocol, instance_port) VALUES ($1, 'listener-1', 'HTTP', 80, 'HTTP', 8080)",
    )
    .bind(load_balancer.id)
    .execute(pool)
    .await
    .expect("Failed to create test listener");
    sqlx::query(
        "INSERT INTO load_balancer_health_checks (load_balancer_id, pool_id, name, protocol, port, interval_seconds) VALUES ($1, $2, 'hc-1', 'HTTP', 8080, 10)",
    )
    .bind(load_balancer.id)
    .bind(lb_pool.id)
    .execute(pool)
    .await
    .expect("Failed to create test health check");

    (load_balancer, lb_pool)
}

pub async fn create_test_workspace(pool: &PgPool, input: Value, output: Value) -> AutomateWorkspaceDBResponse {
    sqlx::query_as::<_, AutomateWorkspaceDBResponse>("INSERT INTO automate_workspaces (input, output) VALUES ($1, $2) RETURNING *")
        .bind(input)
        .bind(output)
        .fetch_one(pool)
        .await
        .expect("Failed to create test workspace")
}

/// A policy linked to one new event and one new action.
pub async fn create_test_policy(pool: &PgPool) -> (PolicyDBResponse, EventDBResponse, PolicyActionDBResponse) {
    let policy = sqlx::query_as::<_, PolicyDBResponse>(
        "INSERT INTO policies (name, description, mode) VALUES ('vm-compliance', 'VM compliance', 'compliance') RETURNING *",
    )
    .fetch_one(pool)
    .await
    .expect("Failed to create test policy");
    let event = sqlx::query_as::<_, EventDBResponse>(
        "INSERT INTO events (name, description, event_type) VALUES ('vm_start', 'VM Power On', 'vm') RETURNING *",
    )
    .fetch_one(pool)
    .await
    .expect("Failed to create test event");
    let action = sqlx::query_as::<_, PolicyActionDBResponse>(
        "INSERT INTO policy_actions (name, description, action_type) VALUES ('vm_stop', 'Stop VM', 'default') RETURNING *",
    )
    .fetch_one(pool)
    .await
    .expect("Failed to create test policy action");

    sqlx::query("INSERT INTO policy_events (policy_id, event_id) VALUES ($1, $2)")
        .bind(policy.id)
        .bind(event.id)
        .execute(pool)
        .await
        .expect("Failed to link event");
    sqlx::query("INSERT INTO policy_policy_actions (policy_id, policy_action_id) VALUES ($1, $2)")
        .bind(policy.id)
        .bind(action.id)
        .execute(pool)
        .await
        .expect("Failed to link action");

    (policy, event, action)
}

/// One rollup row; `timestamp` is RFC 3339.
pub async fn create_test_rollup(pool: &PgPool, resource_type: &str, resource_id: Id, interval: &str, timestamp: &str) -> Id {
    let timestamp: chrono::DateTime<chrono::Utc> = timestamp.parse().expect("Valid RFC 3339 timestamp");
    sqlx::query_scalar(
        r#"
        INSERT INTO metric_rollups (resource_type, resource_id, capture_interval_name, timestamp, cpu_usage_rate_average)
        VALUES ($1, $2, $3, $4, 12.5)
        RETURNING id
        "#,
    )
    .bind(resource_type)
    .bind(resource_id)
    .bind(interval)
    .bind(timestamp)
    .fetch_one(pool)
    .await
    .expect("Failed to create test rollup")
}
