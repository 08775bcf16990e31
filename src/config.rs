use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    /// Base of the URLs handed to browsers; often differs from `endpoint`
    /// behind a proxy.
    pub public_url: String,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone)]
pub struct LandingConfig {
    pub required_profile_id: Option<String>,
    pub count: usize,
    pub sample: usize,
    pub cache_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub object_store: ObjectStoreConfig,
    pub landing: LandingConfig,
    /// Identity provider logout endpoint; sign-out redirects home when unset.
    pub end_session_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Config("DATABASE_URL must be set".into()))?;

        let text = |key: &str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| {
                info!("{key} not set, using default: {default}");
                default.to_string()
            })
        };

        let endpoint = text("OBJECT_STORE_ENDPOINT", "http://127.0.0.1:9000");
        let object_store = ObjectStoreConfig {
            public_url: lookup("OBJECT_STORE_PUBLIC_URL").unwrap_or_else(|| endpoint.clone()),
            endpoint,
            bucket: text("OBJECT_STORE_BUCKET", "draconic"),
            region: text("OBJECT_STORE_REGION", "us-east-1"),
            access_key: text("OBJECT_STORE_ACCESS_KEY", "minioadmin"),
            secret_key: text("OBJECT_STORE_SECRET_KEY", "minioadmin"),
        };

        let landing = LandingConfig {
            required_profile_id: lookup("LANDING_REQUIRED_PROFILE_ID")
                .filter(|v| !v.trim().is_empty()),
            count: parse_or(&lookup, "LANDING_COUNT", 20),
            sample: parse_or(&lookup, "LANDING_SAMPLE", 250),
            cache_ttl: Duration::from_secs(parse_or(&lookup, "LANDING_CACHE_TTL_SECS", 86_400)),
        };

        Ok(Self {
            database_url,
            host: text("HOST", "127.0.0.1"),
            port: parse_or(&lookup, "PORT", 3000),
            object_store,
            landing,
            end_session_url: lookup("AUTH_END_SESSION_URL").filter(|v| !v.trim().is_empty()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?} ({e}), using default: {default}");
        default
    })
}
