//! # infractl: infrastructure management REST API
//!
//! `infractl` exposes the resources of a cloud management platform as JSON collections under
//! `/api`: users and their profiles, groups, tenants and roles, cloud providers, authentication
//! key pairs, load balancers with their pools, members, listeners and health checks, floating IPs,
//! cloud volumes, automate workspaces, policies with their events and actions, metric rollups and
//! the tasks that carry out provider-bound work.
//!
//! ## Request flow
//!
//! Every request is authenticated by the [`CurrentUser`](api::models::users::CurrentUser)
//! extractor (session token, HTTP Basic or a trusted proxy header) which also loads the feature
//! identifiers granted by the caller's current group's role. Reads are gated by
//! `<collection>_read`. Mutations arrive as `POST` bodies naming an action:
//!
//! ```text
//! POST /api/groups              {"description": "ops"}                        create
//! POST /api/groups/3            {"action": "edit", "resource": {...}}         edit one
//! POST /api/groups              {"action": "delete", "resources": [...]}      bulk
//! DELETE /api/groups/3                                                        delete
//! ```
//!
//! and each action is gated by `<collection>_<action>`. Handlers validate the request, resolve the
//! target rows through the repositories in [`db`] and either mutate them, inside one transaction
//! where several rows are involved, or enqueue a task (see [`tasks`]) and return its id.
//!
//! ## Background work
//!
//! Creating and deleting key pairs and deleting cloud volumes are queued in the `tasks` table. A
//! worker started by [`Application::new`] claims queued tasks, carries them out and records the
//! outcome. It stops on the shared cancellation token during graceful shutdown.
//!
//! ## Configuration
//!
//! See [`config`]: a YAML file with `INFRACTL_`-prefixed environment overrides.

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod errors;
mod json;
mod openapi;
pub mod tasks;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Router,
    http::{Method, header},
    routing::get,
};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    api::handlers::{
        automate_workspaces, cloud_volumes, entrypoint, floating_ips, groups, key_pairs, load_balancers, metric_rollups, policies,
        providers, roles, tasks as task_handlers, tenants, users,
    },
    auth::password,
    crypto::SecretCipher,
    db::{
        handlers::{Groups, Repository, Roles, Users},
        models::users::UserCreateDBRequest,
    },
    openapi::ApiDoc,
    tasks::{PgTaskQueue, TaskQueue, worker::run_task_worker},
    types::UserId,
};

pub use config::Config;

/// Description of the group the initial administrator is placed in.
pub const SUPER_ADMIN_GROUP: &str = "EvmGroup-super_administrator";

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool.clone())
///     .config(config)
///     .task_queue(Arc::new(PgTaskQueue::new(pool)))
///     .cipher(cipher)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub task_queue: Arc<dyn TaskQueue>,
    pub cipher: SecretCipher,
}

impl AppState {
    /// Base of every rendered href.
    pub fn api_base(&self) -> String {
        self.config.api_base()
    }
}

pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial administrator if it doesn't exist.
///
/// Idempotent: an existing administrator keeps its memberships and only gets its password
/// refreshed when one is configured. A new one is placed in the seeded super administrator group.
#[instrument(skip_all, fields(userid = %admin.userid))]
pub async fn create_initial_admin_user(admin: &config::AdminConfig, db: &PgPool) -> anyhow::Result<UserId> {
    let password_hash = admin.password.as_deref().map(password::hash_string).transpose()?;

    let mut tx = db.begin().await?;

    if let Some(existing) = Users::new(&mut tx).get_by_userid(&admin.userid).await? {
        if let Some(password_hash) = password_hash {
            Users::new(&mut tx).set_password_hash(existing.id, &password_hash).await?;
        }
        tx.commit().await?;
        return Ok(existing.id);
    }

    let group = Groups::new(&mut tx)
        .get_by_description(SUPER_ADMIN_GROUP)
        .await?
        .ok_or_else(|| anyhow::anyhow!("seeded group {SUPER_ADMIN_GROUP} is missing"))?;

    let created = Users::new(&mut tx)
        .create(&UserCreateDBRequest {
            userid: admin.userid.clone(),
            name: admin.name.clone(),
            email: None,
            phone_number: None,
            password_hash,
            settings: serde_json::json!({}),
            group_ids: vec![group.id],
            status: true,
        })
        .await?;

    tx.commit().await?;
    info!("Created initial administrator {}", created.userid);
    Ok(created.id)
}

/// Make sure the role given to per-user groups exists, for deployments that renamed it.
#[instrument(skip(db))]
async fn ensure_default_user_role(role_name: &str, db: &PgPool) -> anyhow::Result<()> {
    let mut conn = db.acquire().await?;
    if Roles::new(&mut conn).get_by_name(role_name).await?.is_none() {
        Roles::new(&mut conn).upsert(role_name, &[]).await?;
        info!("Created default user role {}", role_name);
    }
    Ok(())
}

/// Connect, migrate and seed.
async fn setup_database(config: &Config, pool: Option<PgPool>) -> anyhow::Result<PgPool> {
    let pool = match pool {
        Some(pool) => pool,
        None => {
            PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(config.database.acquire_timeout)
                .connect(&config.database.url)
                .await?
        }
    };

    migrator().run(&pool).await?;
    ensure_default_user_role(&config.default_user_role, &pool).await?;
    create_initial_admin_user(&config.admin, &pool).await?;

    Ok(pool)
}

fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::HeaderName::from_static("x-auth-token")])
        .expose_headers([header::LOCATION])
}

/// Build the router with every `/api` route, the docs, CORS and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/", get(entrypoint::get_entrypoint))
        .route("/auth", get(entrypoint::issue_auth_token).delete(entrypoint::revoke_auth_token))
        // Users
        .route("/users", get(users::list_users).post(users::post_users))
        .route(
            "/users/{id}",
            get(users::get_user).post(users::post_user).delete(users::delete_user),
        )
        .route("/users/{id}/user_profiles", get(users::list_user_profiles))
        // Groups
        .route("/groups", get(groups::list_groups).post(groups::post_groups))
        .route(
            "/groups/{id}",
            get(groups::get_group).post(groups::post_group).delete(groups::delete_group),
        )
        // Read-only catalogues
        .route("/tenants", get(tenants::list_tenants))
        .route("/tenants/{id}", get(tenants::get_tenant))
        .route("/roles", get(roles::list_roles))
        .route("/roles/{id}", get(roles::get_role))
        .route("/providers", get(providers::list_providers))
        .route("/providers/{id}", get(providers::get_provider))
        .route("/tasks", get(task_handlers::list_tasks))
        .route("/tasks/{id}", get(task_handlers::get_task))
        // Key pairs
        .route("/auth_key_pairs", get(key_pairs::list_key_pairs).post(key_pairs::post_key_pairs))
        .route(
            "/auth_key_pairs/{id}",
            get(key_pairs::get_key_pair)
                .post(key_pairs::post_key_pair)
                .delete(key_pairs::delete_key_pair),
        )
        // Load balancers
        .route("/load_balancers", get(load_balancers::list_load_balancers))
        .route("/load_balancers/{id}", get(load_balancers::get_load_balancer))
        .route("/load_balancers/{id}/{subcollection}", get(load_balancers::list_load_balancer_subcollection))
        .route("/load_balancer_pools", get(load_balancers::list_pools))
        .route("/load_balancer_pools/{id}", get(load_balancers::get_pool))
        .route("/load_balancer_pools/{id}/{subcollection}", get(load_balancers::list_pool_subcollection))
        // Floating IPs
        .route("/floating_ips", get(floating_ips::list_floating_ips).post(floating_ips::post_floating_ips))
        .route("/floating_ips/{id}", get(floating_ips::get_floating_ip))
        // Cloud volumes
        .route("/cloud_volumes", get(cloud_volumes::list_cloud_volumes).post(cloud_volumes::post_cloud_volumes))
        .route(
            "/cloud_volumes/{id}",
            get(cloud_volumes::get_cloud_volume)
                .post(cloud_volumes::post_cloud_volume)
                .delete(cloud_volumes::delete_cloud_volume),
        )
        .route("/cloud_volumes/{id}/{subcollection}", get(cloud_volumes::list_cloud_volume_subcollection))
        // Automate workspaces
        .route("/automate_workspaces", get(automate_workspaces::list_workspaces))
        .route(
            "/automate_workspaces/{guid}",
            get(automate_workspaces::get_workspace).post(automate_workspaces::post_workspace),
        )
        // Policies
        .route("/events", get(policies::list_events))
        .route("/events/{id}", get(policies::get_event))
        .route("/policy_actions", get(policies::list_policy_actions))
        .route("/policy_actions/{id}", get(policies::get_policy_action))
        .route("/policies", get(policies::list_policies))
        .route("/policies/{id}", get(policies::get_policy))
        .route("/policies/{id}/{subcollection}", get(policies::list_policy_subcollection))
        // Metrics
        .route("/metric_rollups", get(metric_rollups::list_metric_rollups))
        .route("/metric_rollups/{id}", get(metric_rollups::get_metric_rollup))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()))
        .layer(create_cors_layer())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Background tasks running alongside the HTTP server.
///
/// Dropping this cancels the shutdown token through `drop_guard`, so test servers don't leak
/// workers.
pub struct BackgroundServices {
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
    shutdown_token: tokio_util::sync::CancellationToken,
    // Pub so that we can disarm it if we want to
    pub drop_guard: Option<tokio_util::sync::DropGuard>,
}

impl BackgroundServices {
    fn start(config: &Config, pool: PgPool) -> Self {
        let shutdown_token = tokio_util::sync::CancellationToken::new();
        let mut background_tasks = Vec::new();

        if config.tasks.enabled {
            let worker = run_task_worker(config.tasks.clone(), pool, shutdown_token.clone());
            background_tasks.push(tokio::spawn(worker));
            info!("Task worker started");
        } else {
            debug!("Task worker disabled");
        }

        Self {
            background_tasks,
            drop_guard: Some(shutdown_token.clone().drop_guard()),
            shutdown_token,
        }
    }

    /// Gracefully shutdown all background tasks
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();

        for handle in self.background_tasks {
            let _ = handle.await;
        }
    }
}

/// The assembled service: router, pool and background tasks.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
    bg_services: BackgroundServices,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Like [`Application::new`], reusing `pool` when given (tests hand in the sqlx test pool).
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting infractl with configuration: {:#?}", config);
        config.validate()?;

        let pool = setup_database(&config, pool).await?;

        let secret_key = config
            .secret_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("secret_key is not configured"))?;
        let cipher = SecretCipher::new(secret_key);

        let bg_services = BackgroundServices::start(&config, pool.clone());

        let app_state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .task_queue(Arc::new(PgTaskQueue::new(pool.clone())))
            .cipher(cipher)
            .build();

        let router = build_router(app_state);

        Ok(Self {
            router,
            config,
            pool,
            bg_services,
        })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, BackgroundServices) {
        let server = axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server");
        (server, self.bg_services)
    }

    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("infractl listening on http://{}, serving {}", bind_addr, self.config.api_base());

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        self.bg_services.shutdown().await;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::create_test_config;

    #[sqlx::test]
    #[test_log::test]
    async fn test_initial_admin_is_idempotent(pool: PgPool) {
        let mut admin = create_test_config().admin;
        admin.password = Some("first-password".to_string());

        let first = create_initial_admin_user(&admin, &pool).await.unwrap();
        admin.password = Some("second-password".to_string());
        let second = create_initial_admin_user(&admin, &pool).await.unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn).get_by_userid(&admin.userid).await.unwrap().unwrap();
        let hash = user.password_hash.unwrap();
        assert!(password::verify_string("second-password", &hash).unwrap());

        let role = Roles::new(&mut conn).get_for_group(user.current_group_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(role.name, crate::types::SUPER_ADMIN_ROLE);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_renamed_default_role_is_created(pool: PgPool) {
        ensure_default_user_role("member", &pool).await.unwrap();
        ensure_default_user_role("member", &pool).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let role = Roles::new(&mut conn).get_by_name("member").await.unwrap();
        assert!(role.is_some_and(|r| r.features.is_empty()));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_docs_are_served(pool: PgPool) {
        let (server, _bg) = crate::test_utils::create_test_app(pool).await;
        server.get("/api/docs").await.assert_status_ok();
    }
}
