#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::ServiceExt;

use draconic_id::config::LandingConfig;
use draconic_id::database::schema::ensure_schema;
use draconic_id::database::SqliteProfileRepository;
use draconic_id::error::Result;
use draconic_id::models::ProfilePoint;
use draconic_id::services::cache_service::TtlCache;
use draconic_id::services::avatar_service::{AvatarStore, AvatarUrls};
use draconic_id::services::session_service::DbSessionProvider;
use draconic_id::state::AppState;
use draconic_id::web::build_router;

pub async fn test_pool() -> SqlitePool {
    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    ensure_schema(&pool).await.unwrap();
    pool
}

#[derive(Default)]
pub struct ProfileSeed<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub name: &'a str,
    pub privacy: &'a str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub avatar: Option<&'a str>,
    pub birth_date: Option<&'a str>,
    pub show_age: bool,
}

pub async fn seed_profile(pool: &SqlitePool, seed: ProfileSeed<'_>) {
    sqlx::query("INSERT INTO \"user\" (id, name, email, image) VALUES (?1, ?2, ?3, ?4)")
        .bind(seed.user_id)
        .bind(seed.name)
        .bind(format!("{}@example.com", seed.user_id))
        .bind("https://provider.example/face.png")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO profile (id, user_id, privacy, latitude, longitude, avatar, birth_date, show_age) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(seed.id)
    .bind(seed.user_id)
    .bind(if seed.privacy.is_empty() { "PUBLIC" } else { seed.privacy })
    .bind(seed.latitude)
    .bind(seed.longitude)
    .bind(seed.avatar)
    .bind(seed.birth_date)
    .bind(seed.show_age)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_session(pool: &SqlitePool, token: &str, user_id: &str) {
    sqlx::query("INSERT INTO session (id, token, user_id, expires_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(format!("session-{token}"))
        .bind(token)
        .bind(user_id)
        .bind(Utc::now() + ChronoDuration::days(1))
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_account(pool: &SqlitePool, account_id: &str, provider_id: &str, user_id: &str) {
    sqlx::query("INSERT INTO account (id, account_id, provider_id, user_id) VALUES (?1, ?2, ?3, ?4)")
        .bind(format!("account-{account_id}"))
        .bind(account_id)
        .bind(provider_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Object store double that keeps uploads in memory.
#[derive(Default)]
pub struct RecordingAvatarStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl AvatarStore for RecordingAvatarStore {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

pub struct TestApp {
    pub pool: SqlitePool,
    pub router: Router,
    pub avatars: Arc<RecordingAvatarStore>,
    pub landing_cache: Arc<TtlCache<Vec<ProfilePoint>>>,
}

pub async fn test_app(pool: SqlitePool) -> TestApp {
    test_app_with(pool, |state| state).await
}

/// Like [`test_app`], with a hook to adjust the state before routing.
pub async fn test_app_with(
    pool: SqlitePool,
    configure: impl FnOnce(AppState) -> AppState,
) -> TestApp {
    let avatars = Arc::new(RecordingAvatarStore::default());
    let state = AppState::new(
        Arc::new(SqliteProfileRepository::new(pool.clone())),
        Arc::new(DbSessionProvider::new(pool.clone())),
        avatars.clone(),
        AvatarUrls::new("https://cdn.example", "draconic"),
        LandingConfig {
            required_profile_id: None,
            count: 20,
            sample: 250,
            cache_ttl: Duration::from_secs(60),
        },
    );
    let state = configure(state);
    TestApp {
        pool,
        landing_cache: state.landing_cache.clone(),
        router: build_router(state),
        avatars,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("cookie", session_cookie(token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

pub fn session_cookie(token: &str) -> String {
    format!("better-auth.session_token={token}.signature")
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
