use std::sync::Arc;

use crate::config::LandingConfig;
use crate::database::ProfileRepository;
use crate::models::ProfilePoint;
use crate::services::avatar_service::{AvatarStore, AvatarUrls};
use crate::services::cache_service::TtlCache;
use crate::services::session_service::SessionProvider;

/// Shared handles for handlers. Everything is injected at startup.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileRepository>,
    pub sessions: Arc<dyn SessionProvider>,
    pub avatars: Arc<dyn AvatarStore>,
    pub avatar_urls: AvatarUrls,
    pub landing: LandingConfig,
    pub landing_cache: Arc<TtlCache<Vec<ProfilePoint>>>,
    pub end_session_url: Option<String>,
}

impl AppState {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        sessions: Arc<dyn SessionProvider>,
        avatars: Arc<dyn AvatarStore>,
        avatar_urls: AvatarUrls,
        landing: LandingConfig,
    ) -> Self {
        Self {
            profiles,
            sessions,
            avatars,
            avatar_urls,
            landing,
            landing_cache: Arc::new(TtlCache::new()),
            end_session_url: None,
        }
    }

    pub fn with_end_session_url(mut self, url: Option<String>) -> Self {
        self.end_session_url = url;
        self
    }
}
