use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use cookie::{Cookie, SameSite};
use sqlx::SqlitePool;
use tracing::info;

use crate::database::session_repo;
use crate::error::Result;

pub const SESSION_COOKIE: &str = "better-auth.session_token";
pub const SECURE_SESSION_COOKIE: &str = "__Secure-better-auth.session_token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Resolves the signed-in user of a request.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>>;
    async fn end_session(&self, token: &str) -> Result<()>;
}

/// Session token from the auth cookie. The cookie value is signed as
/// `token.signature`; only the token part is looked up.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|hv| hv.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|c| c.ok())
        .find(|c| c.name() == SESSION_COOKIE || c.name() == SECURE_SESSION_COOKIE)
        .and_then(|c| {
            let token = c.value().split('.').next().unwrap_or_default().trim();
            (!token.is_empty()).then(|| token.to_string())
        })
}

/// `Set-Cookie` values that drop both cookie variants.
pub fn clear_session_cookies() -> Vec<String> {
    [(SESSION_COOKIE, false), (SECURE_SESSION_COOKIE, true)]
        .into_iter()
        .map(|(name, secure)| {
            let mut cookie = Cookie::new(name, "");
            cookie.set_path("/");
            cookie.set_http_only(true);
            cookie.set_secure(secure);
            cookie.set_same_site(SameSite::Lax);
            cookie.make_removal();
            cookie.to_string()
        })
        .collect()
}

#[derive(Clone)]
pub struct DbSessionProvider {
    pool: SqlitePool,
}

impl DbSessionProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionProvider for DbSessionProvider {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>> {
        let Some(token) = session_token_from_headers(headers) else {
            return Ok(None);
        };
        let Some(row) = session_repo::load_session(&self.pool, &token).await? else {
            return Ok(None);
        };
        if row.expires_at <= Utc::now() {
            return Ok(None);
        }
        Ok(Some(Session {
            token: row.token,
            user_id: row.user_id,
            expires_at: row.expires_at,
        }))
    }

    async fn end_session(&self, token: &str) -> Result<()> {
        let removed = session_repo::delete_session(&self.pool, token).await?;
        info!("👋 Session ended (rows={})", removed);
        Ok(())
    }
}
