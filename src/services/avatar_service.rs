use async_trait::async_trait;
use s3::{creds::Credentials, Bucket, Region};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ObjectStoreConfig;
use crate::database::ProfileRepository;
use crate::error::{AppError, Result};

pub const MAX_AVATAR_BYTES: usize = 1024 * 1024;
const AVATAR_PREFIX: &str = "avatars";

/// Builds public URLs for stored image keys.
#[derive(Debug, Clone)]
pub struct AvatarUrls {
    public_base: String,
    bucket: String,
}

impl AvatarUrls {
    pub fn new(public_base: &str, bucket: &str) -> Self {
        Self {
            public_base: public_base.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        }
    }

    /// Absolute URLs (provider images) pass through unchanged.
    pub fn url_for(&self, key: Option<&str>) -> Option<String> {
        let key = key.map(str::trim).filter(|k| !k.is_empty())?;
        if key.starts_with("http://") || key.starts_with("https://") {
            return Some(key.to_string());
        }
        Some(format!(
            "{}/{}/{}/{}",
            self.public_base, self.bucket, AVATAR_PREFIX, key
        ))
    }
}

fn object_path(key: &str) -> String {
    format!("{}/{}", AVATAR_PREFIX, key)
}

#[async_trait]
pub trait AvatarStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Avatar objects in an S3-compatible bucket (MinIO in deployments).
pub struct S3AvatarStore {
    bucket: Bucket,
}

impl S3AvatarStore {
    pub fn connect(settings: &ObjectStoreConfig) -> Result<Self> {
        let region = Region::Custom {
            region: settings.region.clone(),
            endpoint: settings.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(settings.access_key.as_str()),
            Some(settings.secret_key.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Config(format!("object store credentials: {}", e)))?;

        let bucket = Bucket::new(&settings.bucket, region, credentials)
            .map_err(|e| AppError::ObjectStore(e.to_string()))?
            .with_path_style();

        info!(
            "🪣 Avatar bucket {} at {}",
            settings.bucket, settings.endpoint
        );
        Ok(Self { bucket })
    }
}

#[async_trait]
impl AvatarStore for S3AvatarStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let response = self
            .bucket
            .put_object_with_content_type(object_path(key), bytes, content_type)
            .await
            .map_err(|e| AppError::ObjectStore(e.to_string()))?;
        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(AppError::ObjectStore(format!(
                "put {} returned {}",
                key, status
            )));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.bucket
            .delete_object(object_path(key))
            .await
            .map_err(|e| AppError::ObjectStore(e.to_string()))?;
        Ok(())
    }
}

/// Stores a new avatar for `user_id` and returns its key. The previous
/// object is removed afterwards; a failed removal is only logged.
pub async fn upload_avatar(
    repo: &dyn ProfileRepository,
    store: &dyn AvatarStore,
    user_id: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<String> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Avatar file is empty".into()));
    }
    if body.len() > MAX_AVATAR_BYTES {
        return Err(AppError::PayloadTooLarge(
            "avatar file size must be under 1 MB".into(),
        ));
    }
    let content_type = content_type
        .map(str::trim)
        .filter(|ct| ct.starts_with("image/"))
        .ok_or_else(|| AppError::BadRequest("Avatar must be an image".into()))?;

    let profile = repo
        .find_by_user_id(user_id)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;

    let key = Uuid::new_v4().to_string();
    store.put(&key, body, content_type).await?;
    match repo.set_avatar(user_id, &key).await {
        Ok(true) => {}
        outcome => {
            // Nothing references the new object.
            if let Err(e) = store.delete(&key).await {
                warn!("Failed to delete unreferenced avatar {}: {}", key, e);
            }
            outcome?;
            return Err(AppError::NotFound("Profile"));
        }
    }
    info!("🖼️ Avatar {} stored for {}", key, user_id);

    if let Some(old) = profile.avatar.as_deref().filter(|k| !k.is_empty()) {
        if let Err(e) = store.delete(old).await {
            warn!("Failed to delete old avatar {}: {}", old, e);
        }
    }

    Ok(key)
}
