//! Token sessions issued by `GET /api/auth`.
//!
//! Tokens are random and handed to the client once; only their SHA-256 digest is stored.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    crypto::{generate_token, hash_token},
    db::handlers::Sessions,
    errors::{Error, Result},
    types::UserId,
};

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub auth_token: String,
    pub token_ttl: u64,
    pub expires_on: DateTime<Utc>,
}

#[instrument(skip(conn), err)]
pub async fn issue_token(conn: &mut PgConnection, user_id: UserId, ttl: Duration) -> Result<IssuedToken> {
    let auth_token = generate_token();
    let lifetime = chrono::Duration::from_std(ttl).map_err(|e| Error::Internal {
        operation: format!("convert token ttl: {e}"),
    })?;
    let expires_on = Utc::now() + lifetime;

    Sessions::new(conn).create(user_id, &hash_token(&auth_token), expires_on).await?;

    Ok(IssuedToken {
        auth_token,
        token_ttl: ttl.as_secs(),
        expires_on,
    })
}

/// Invalidate one token. Unknown tokens are not an error.
#[instrument(skip_all, err)]
pub async fn revoke_token(conn: &mut PgConnection, token: &str) -> Result<bool> {
    Ok(Sessions::new(conn).delete_by_token_hash(&hash_token(token)).await?)
}

#[instrument(skip(conn), err)]
pub async fn revoke_all(conn: &mut PgConnection, user_id: UserId) -> Result<u64> {
    Ok(Sessions::new(conn).delete_for_user(user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_user;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_issue_and_revoke(pool: PgPool) {
        let user = create_test_user(&pool, &[]).await;
        let mut conn = pool.acquire().await.unwrap();

        let first = issue_token(&mut conn, user.id, Duration::from_secs(600)).await.unwrap();
        let second = issue_token(&mut conn, user.id, Duration::from_secs(600)).await.unwrap();
        assert_ne!(first.auth_token, second.auth_token);
        assert_eq!(first.token_ttl, 600);
        assert!(first.expires_on > Utc::now());

        assert!(revoke_token(&mut conn, &first.auth_token).await.unwrap());
        assert!(!revoke_token(&mut conn, &first.auth_token).await.unwrap());
        assert_eq!(revoke_all(&mut conn, user.id).await.unwrap(), 1);
        assert_eq!(Sessions::new(&mut conn).count_for_user(user.id).await.unwrap(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_expired_sessions_are_not_valid(pool: PgPool) {
        let user = create_test_user(&pool, &[]).await;
        let mut conn = pool.acquire().await.unwrap();

        let issued = issue_token(&mut conn, user.id, Duration::ZERO).await.unwrap();
        let found = Sessions::new(&mut conn).find_valid(&hash_token(&issued.auth_token)).await.unwrap();
        assert!(found.is_none());
    }
}
