use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::database::{ProfileFilter, ProfileRepository};
use crate::error::{AppError, Result};
use crate::models::{Privacy, ProfilePoint, ProfileRecord, ProfileUpdate};

/// Test double for service-level tests.
#[derive(Default)]
pub struct InMemoryProfileRepository {
    pub profiles: Mutex<Vec<ProfileRecord>>,
    /// What `sample_mappable_points` returns (truncated to the sample size).
    pub sample: Mutex<Vec<ProfilePoint>>,
    pub sample_calls: AtomicUsize,
    pub fail: AtomicBool,
    /// Makes `set_avatar` report a missing profile, as when the profile is
    /// deleted mid-upload.
    pub lose_avatar_writes: AtomicBool,
}

impl InMemoryProfileRepository {
    pub fn with_profiles(profiles: Vec<ProfileRecord>) -> Self {
        Self {
            profiles: Mutex::new(profiles),
            ..Default::default()
        }
    }

    pub fn with_sample(sample: Vec<ProfilePoint>) -> Self {
        Self {
            sample: Mutex::new(sample),
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::RepositoryUnavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

pub fn record(id: &str, user_id: &str, privacy: Privacy) -> ProfileRecord {
    let now = Utc::now();
    ProfileRecord {
        id: id.to_string(),
        user_id: user_id.to_string(),
        tagline: None,
        avatar: Some(format!("{id}-avatar")),
        background: None,
        about: None,
        color: None,
        privacy,
        latitude: None,
        longitude: None,
        birth_date: None,
        show_age: false,
        links: None,
        created_at: now,
        updated_at: now,
        user_name: Some(format!("User {id}")),
        user_image: None,
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_many(&self, filter: &ProfileFilter) -> Result<Vec<ProfileRecord>> {
        self.check()?;
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles
            .iter()
            .filter(|p| {
                filter
                    .visibility
                    .as_ref()
                    .map(|scope| scope.allows(p.privacy, &p.user_id))
                    .unwrap_or(true)
            })
            .filter(|p| {
                !filter.require_coordinates || (p.latitude.is_some() && p.longitude.is_some())
            })
            .filter(|p| filter.ids.as_ref().map(|ids| ids.contains(&p.id)).unwrap_or(true))
            .filter(|p| {
                filter
                    .user_ids
                    .as_ref()
                    .map(|ids| ids.contains(&p.user_id))
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn find_unique(&self, profile_id: &str) -> Result<Option<ProfileRecord>> {
        self.check()?;
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.iter().find(|p| p.id == profile_id).cloned())
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<ProfileRecord>> {
        self.check()?;
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn find_by_account(
        &self,
        account_id: &str,
        _provider_id: &str,
    ) -> Result<Option<ProfileRecord>> {
        self.find_by_user_id(account_id).await
    }

    async fn sample_mappable_points(&self, sample: usize) -> Result<Vec<ProfilePoint>> {
        self.check()?;
        self.sample_calls.fetch_add(1, Ordering::SeqCst);
        let points = self.sample.lock().unwrap();
        Ok(points.iter().take(sample).cloned().collect())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<String>> {
        self.check()?;
        let mut profiles = self.profiles.lock().unwrap();
        let Some(p) = profiles.iter_mut().find(|p| p.user_id == user_id) else {
            return Ok(None);
        };
        p.tagline = update.tagline.clone();
        p.background = update.background.clone();
        p.color = update.color.clone();
        p.latitude = update.latitude;
        p.longitude = update.longitude;
        p.privacy = update.privacy.unwrap_or(Privacy::Public);
        p.birth_date = update.birth_date.map(|d| d.format("%Y-%m-%d").to_string());
        p.show_age = update.show_age;
        if let Some(links) = &update.links {
            p.links = links
                .as_ref()
                .map(|l| serde_json::to_string(l).unwrap());
        }
        if let Some(name) = &update.name {
            p.user_name = Some(name.clone());
        }
        Ok(Some(p.id.clone()))
    }

    async fn update_about(&self, user_id: &str, about: Option<&str>) -> Result<bool> {
        self.check()?;
        let mut profiles = self.profiles.lock().unwrap();
        let Some(p) = profiles.iter_mut().find(|p| p.user_id == user_id) else {
            return Ok(false);
        };
        p.about = about.map(str::to_string);
        Ok(true)
    }

    async fn set_avatar(&self, user_id: &str, key: &str) -> Result<bool> {
        self.check()?;
        if self.lose_avatar_writes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut profiles = self.profiles.lock().unwrap();
        let Some(p) = profiles.iter_mut().find(|p| p.user_id == user_id) else {
            return Ok(false);
        };
        p.avatar = Some(key.to_string());
        Ok(true)
    }
}
