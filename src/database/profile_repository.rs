use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::profile_repo::{self, ProfileFilter};
use crate::error::Result;
use crate::models::{ProfilePoint, ProfileRecord, ProfileUpdate};

/// Read/write access to stored profiles. Handlers and services only see
/// this trait; the SQLite implementation is wired in at startup.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_many(&self, filter: &ProfileFilter) -> Result<Vec<ProfileRecord>>;
    async fn find_unique(&self, profile_id: &str) -> Result<Option<ProfileRecord>>;
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<ProfileRecord>>;
    async fn find_by_account(
        &self,
        account_id: &str,
        provider_id: &str,
    ) -> Result<Option<ProfileRecord>>;
    async fn sample_mappable_points(&self, sample: usize) -> Result<Vec<ProfilePoint>>;

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate)
        -> Result<Option<String>>;
    async fn update_about(&self, user_id: &str, about: Option<&str>) -> Result<bool>;
    async fn set_avatar(&self, user_id: &str, key: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn find_many(&self, filter: &ProfileFilter) -> Result<Vec<ProfileRecord>> {
        Ok(profile_repo::find_profiles(&self.pool, filter).await?)
    }

    async fn find_unique(&self, profile_id: &str) -> Result<Option<ProfileRecord>> {
        Ok(profile_repo::find_profile_by_id(&self.pool, profile_id).await?)
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<ProfileRecord>> {
        Ok(profile_repo::find_profile_by_user_id(&self.pool, user_id).await?)
    }

    async fn find_by_account(
        &self,
        account_id: &str,
        provider_id: &str,
    ) -> Result<Option<ProfileRecord>> {
        Ok(profile_repo::find_profile_by_account(&self.pool, account_id, provider_id).await?)
    }

    async fn sample_mappable_points(&self, sample: usize) -> Result<Vec<ProfilePoint>> {
        let sample = i64::try_from(sample).unwrap_or(i64::MAX);
        Ok(profile_repo::sample_mappable_points(&self.pool, sample).await?)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<String>> {
        Ok(profile_repo::update_profile(&self.pool, user_id, update).await?)
    }

    async fn update_about(&self, user_id: &str, about: Option<&str>) -> Result<bool> {
        Ok(profile_repo::update_about(&self.pool, user_id, about).await? > 0)
    }

    async fn set_avatar(&self, user_id: &str, key: &str) -> Result<bool> {
        Ok(profile_repo::update_avatar(&self.pool, user_id, key).await? > 0)
    }
}
