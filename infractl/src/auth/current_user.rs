//! The [`CurrentUser`] extractor.
//!
//! Each request is authenticated by trying, in order, an `X-Auth-Token` session token, HTTP Basic
//! credentials (database mode only) and the trusted proxy header (when enabled). Every method
//! returns:
//!
//! - `None`: its credentials are not present on the request
//! - `Some(Ok(user))`: the caller is authenticated
//! - `Some(Err(error))`: credentials were present but rejected
//!
//! The first success wins. When none succeeds the request is rejected with 401.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose};
use sqlx::PgConnection;
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::password,
    config::AuthMode,
    crypto::hash_token,
    db::{
        errors::DbError,
        handlers::{Repository, Roles, Sessions, Users},
        models::users::UserDBResponse,
    },
    errors::{Error, Result},
};

/// Header carrying a token issued by `GET /api/auth`.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Load the role features of the user's current group.
pub async fn load_principal(conn: &mut PgConnection, user: UserDBResponse) -> Result<CurrentUser> {
    let role = match user.current_group_id {
        Some(group_id) => Roles::new(conn).get_for_group(group_id).await?,
        None => None,
    };
    Ok(CurrentUser::new(user, role))
}

fn unauthenticated(message: &str) -> Error {
    Error::Unauthenticated {
        message: Some(message.to_string()),
    }
}

#[instrument(skip_all)]
async fn try_token_auth(parts: &Parts, state: &AppState) -> Option<Result<CurrentUser>> {
    let token = parts.headers.get(AUTH_TOKEN_HEADER)?;
    let token = match token.to_str() {
        Ok(token) => token,
        Err(_) => return Some(Err(unauthenticated("Invalid Authentication Token"))),
    };

    let mut conn = match state.db.acquire().await {
        Ok(conn) => conn,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };

    let session = match Sessions::new(&mut conn).find_valid(&hash_token(token)).await {
        Ok(Some(session)) => session,
        Ok(None) => return Some(Err(unauthenticated("Invalid Authentication Token"))),
        Err(e) => return Some(Err(e.into())),
    };

    let user = match Users::new(&mut conn).get_by_id(session.user_id).await {
        Ok(Some(user)) if user.status => user,
        Ok(_) => return Some(Err(unauthenticated("Invalid Authentication Token"))),
        Err(e) => return Some(Err(e.into())),
    };

    Some(load_principal(&mut conn, user).await)
}

/// Split an `Authorization: Basic` header into `(userid, password)`.
fn basic_credentials(parts: &Parts) -> Option<Result<(String, String)>> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;

    let decoded = match general_purpose::STANDARD.decode(encoded.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return Some(Err(unauthenticated("Invalid Basic credentials"))),
    };
    let decoded = match String::from_utf8(decoded) {
        Ok(s) => s,
        Err(_) => return Some(Err(unauthenticated("Invalid Basic credentials"))),
    };
    match decoded.split_once(':') {
        Some((userid, password)) => Some(Ok((userid.to_string(), password.to_string()))),
        None => Some(Err(unauthenticated("Invalid Basic credentials"))),
    }
}

/// Argon2 verification on a blocking thread.
async fn verify_password(supplied: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_string(&supplied, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}

#[instrument(skip_all)]
async fn try_basic_auth(parts: &Parts, state: &AppState) -> Option<Result<CurrentUser>> {
    let (userid, supplied) = match basic_credentials(parts)? {
        Ok(credentials) => credentials,
        Err(e) => return Some(Err(e)),
    };

    let mut conn = match state.db.acquire().await {
        Ok(conn) => conn,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };

    let user = match Users::new(&mut conn).get_by_userid(&userid).await {
        Ok(Some(user)) if user.status => user,
        Ok(_) => return Some(Err(unauthenticated("Authentication failed"))),
        Err(e) => return Some(Err(e.into())),
    };

    let Some(hash) = user.password_hash.clone() else {
        return Some(Err(unauthenticated("Authentication failed")));
    };
    match verify_password(supplied, hash).await {
        Ok(true) => {}
        Ok(false) => return Some(Err(unauthenticated("Authentication failed"))),
        Err(e) => return Some(Err(e)),
    }

    Some(load_principal(&mut conn, user).await)
}

#[instrument(skip_all)]
async fn try_proxy_header_auth(parts: &Parts, state: &AppState) -> Option<Result<CurrentUser>> {
    let header_name = &state.config.authentication.proxy_header.header_name;
    let userid = parts.headers.get(header_name.as_str()).and_then(|h| h.to_str().ok())?;

    let mut conn = match state.db.acquire().await {
        Ok(conn) => conn,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };

    let user = match Users::new(&mut conn).get_by_userid(userid).await {
        Ok(Some(user)) if user.status => user,
        Ok(_) => return Some(Err(unauthenticated("Unknown user"))),
        Err(e) => return Some(Err(e.into())),
    };

    Some(load_principal(&mut conn, user).await)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let mut auth_errors = Vec::new();

        match try_token_auth(parts, state).await {
            Some(Ok(user)) => {
                debug!("Authenticated user {} by token", user.userid);
                return Ok(user);
            }
            Some(Err(e)) => auth_errors.push(("token", e)),
            None => trace!("No auth token on request"),
        }

        if state.config.authentication.mode == AuthMode::Database {
            match try_basic_auth(parts, state).await {
                Some(Ok(user)) => {
                    debug!("Authenticated user {} by basic credentials", user.userid);
                    return Ok(user);
                }
                Some(Err(e)) => auth_errors.push(("basic", e)),
                None => trace!("No basic credentials on request"),
            }
        }

        if state.config.authentication.proxy_header.enabled {
            match try_proxy_header_auth(parts, state).await {
                Some(Ok(user)) => {
                    debug!("Authenticated user {} by proxy header", user.userid);
                    return Ok(user);
                }
                Some(Err(e)) => auth_errors.push(("proxy header", e)),
                None => trace!("No proxy header on request"),
            }
        }

        // Infrastructure failures are not the caller's fault
        if let Some(pos) = auth_errors.iter().position(|(_, e)| matches!(e, Error::Database(_) | Error::Internal { .. })) {
            return Err(auth_errors.swap_remove(pos).1);
        }

        trace!("Authentication failed: {:?}", auth_errors);
        match auth_errors.into_iter().next() {
            Some((_, e)) => Err(e),
            None => Err(Error::Unauthenticated { message: None }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session;
    use crate::test_utils::{create_test_state, create_test_user};
    use axum::http::Request;
    use sqlx::PgPool;
    use std::time::Duration;

    fn parts_with(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("http://localhost/api");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_proxy_header_loads_role_features(pool: PgPool) {
        let state = create_test_state(pool.clone());
        let user = create_test_user(&pool, &["groups_read"]).await;

        let mut parts = parts_with(&[("x-remote-user", &user.userid)]);
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();

        assert_eq!(current.id, user.id);
        assert!(current.role_allows("groups_read"));
        assert!(!current.role_allows("groups_create"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_proxy_user_is_unauthenticated(pool: PgPool) {
        let state = create_test_state(pool);
        let mut parts = parts_with(&[("x-remote-user", "nobody")]);

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_credentials_is_unauthenticated(pool: PgPool) {
        let state = create_test_state(pool);
        let mut parts = parts_with(&[]);

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.user_message(), "Authentication required");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_issued_token_authenticates(pool: PgPool) {
        let state = create_test_state(pool.clone());
        let user = create_test_user(&pool, &[]).await;
        let mut conn = pool.acquire().await.unwrap();
        let issued = session::issue_token(&mut conn, user.id, Duration::from_secs(60)).await.unwrap();

        let mut parts = parts_with(&[(AUTH_TOKEN_HEADER, &issued.auth_token)]);
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.userid, user.userid);

        let mut bogus = parts_with(&[(AUTH_TOKEN_HEADER, "not-a-token")]);
        let err = CurrentUser::from_request_parts(&mut bogus, &state).await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid Authentication Token");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_basic_auth_in_database_mode(pool: PgPool) {
        let mut state = create_test_state(pool.clone());
        state.config.authentication.mode = AuthMode::Database;
        state.config.authentication.proxy_header.enabled = false;

        let user = create_test_user(&pool, &[]).await;
        let hash = password::hash_string_with_params(
            "s3cret",
            password::Argon2Params {
                memory_kib: 128,
                iterations: 1,
                parallelism: 1,
            },
        )
        .unwrap();
        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn).set_password_hash(user.id, &hash).await.unwrap();

        let good = general_purpose::STANDARD.encode(format!("{}:s3cret", user.userid));
        let mut parts = parts_with(&[("authorization", &format!("Basic {good}"))]);
        assert!(CurrentUser::from_request_parts(&mut parts, &state).await.is_ok());

        let bad = general_purpose::STANDARD.encode(format!("{}:wrong", user.userid));
        let mut parts = parts_with(&[("authorization", &format!("Basic {bad}"))]);
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_password_verification_yields_to_runtime() {
        use std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        };

        let hash = password::hash_string("s3cret").unwrap();
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = ticks.clone();
            async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        });

        assert!(verify_password("s3cret".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
        ticker.abort();

        // The single-threaded test runtime only polls the ticker if verification awaited
        assert!(ticks.load(Ordering::SeqCst) > 0);
    }
}
