use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::{
    AppState,
    api::models::{
        entrypoint::{AuthTokenResponse, CollectionLink, EntrypointResponse},
        users::CurrentUser,
    },
    auth::{current_user::AUTH_TOKEN_HEADER, session},
    errors::{Error, Result},
    types::Collection,
};

fn describe(collection: Collection) -> String {
    let singular = collection.singular();
    let mut chars = singular.chars();
    match chars.next() {
        Some(first) => format!("{}{}s", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "entrypoint",
    summary = "API entrypoint",
    description = "Identity of the caller and the collections the API serves.",
    responses(
        (status = 200, description = "Entrypoint", body = EntrypointResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_entrypoint(State(state): State<AppState>, current_user: CurrentUser) -> Json<EntrypointResponse> {
    let api_base = state.api_base();
    let collections = Collection::ALL
        .iter()
        .map(|c| CollectionLink {
            name: c.name().to_string(),
            href: c.collection_href(&api_base),
            description: describe(*c),
        })
        .collect();

    Json(EntrypointResponse {
        name: "API".to_string(),
        description: "REST API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        identity: current_user,
        collections,
    })
}

#[utoipa::path(
    get,
    path = "/auth",
    tag = "entrypoint",
    summary = "Issue an authentication token",
    description = "Returns a token to send as `X-Auth-Token` on later requests.",
    responses(
        (status = 200, description = "Token issued", body = AuthTokenResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BasicAuth" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn issue_auth_token(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<AuthTokenResponse>> {
    let mut conn = state.db.acquire().await?;
    let issued = session::issue_token(&mut conn, current_user.id, state.config.authentication.token_ttl).await?;

    Ok(Json(AuthTokenResponse {
        auth_token: issued.auth_token,
        token_ttl: issued.token_ttl,
        expires_on: issued.expires_on,
    }))
}

#[utoipa::path(
    delete,
    path = "/auth",
    tag = "entrypoint",
    summary = "Revoke the presented token",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 400, description = "No token on the request"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("AuthToken" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn revoke_auth_token(State(state): State<AppState>, headers: HeaderMap, _current_user: CurrentUser) -> Result<StatusCode> {
    let token = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::bad_request("Must specify an X-Auth-Token to revoke"))?;

    let mut conn = state.db.acquire().await?;
    session::revoke_token(&mut conn, token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_user};
    use sqlx::PgPool;

    #[test]
    fn test_collection_descriptions() {
        assert_eq!(describe(Collection::CloudVolumes), "Cloud volumes");
        assert_eq!(describe(Collection::Users), "Users");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_entrypoint_lists_collections(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &[]).await;
        let (name, value) = add_auth_headers(&user);

        let response = app.get("/api").add_header(name, value).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["identity"]["userid"], user.userid.as_str());
        let names: Vec<_> = body["collections"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect();
        assert!(names.contains(&"auth_key_pairs".to_string()));
        assert!(names.contains(&"metric_rollups".to_string()));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_entrypoint_requires_authentication(pool: PgPool) {
        let (app, _bg) = create_test_app(pool).await;
        app.get("/api").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_token_issue_use_and_revoke(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, &["tenants_read"]).await;
        let (name, value) = add_auth_headers(&user);

        let issued: AuthTokenResponse = app.get("/api/auth").add_header(name, value).await.json();
        assert_eq!(issued.token_ttl, 600);

        app.get("/api/tenants")
            .add_header(AUTH_TOKEN_HEADER, issued.auth_token.as_str())
            .await
            .assert_status_ok();

        app.delete("/api/auth")
            .add_header(AUTH_TOKEN_HEADER, issued.auth_token.as_str())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let response = app.get("/api/tenants").add_header(AUTH_TOKEN_HEADER, issued.auth_token.as_str()).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
