use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::database::{ProfileFilter, ProfileRepository};
use crate::error::Result;
use crate::models::{Privacy, ProfileRecord};
use crate::services::avatar_service::AvatarUrls;
use crate::services::privacy_service::VisibilityScope;

/// One pin on the world map.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub tagline: Option<String>,
    pub color: Option<String>,
    pub avatar: Option<String>,
    pub privacy: Privacy,
    pub latitude: f64,
    pub longitude: f64,
}

impl MapMarker {
    fn from_record(record: &ProfileRecord, avatars: &AvatarUrls) -> Option<Self> {
        let coords = record.coordinates()?;
        Some(Self {
            id: record.id.clone(),
            user_id: record.user_id.clone(),
            name: record.display_name(),
            tagline: record.tagline.clone(),
            color: record.color.clone(),
            avatar: avatars.url_for(record.avatar_or_user_image()),
            privacy: record.privacy,
            latitude: coords.latitude,
            longitude: coords.longitude,
        })
    }
}

pub fn build_markers<R: Rng + ?Sized>(
    records: &[ProfileRecord],
    avatars: &AvatarUrls,
    rng: &mut R,
) -> Vec<MapMarker> {
    let mut markers: Vec<MapMarker> = records
        .iter()
        .filter_map(|r| MapMarker::from_record(r, avatars))
        .collect();
    // Overlapping pins otherwise always stack in the same order.
    markers.shuffle(rng);
    markers
}

/// Every located profile the viewer may see, in random order.
pub async fn load_map_markers(
    repo: &dyn ProfileRepository,
    viewer_id: Option<&str>,
    avatars: &AvatarUrls,
) -> Result<Vec<MapMarker>> {
    let scope = VisibilityScope::for_viewer(viewer_id);
    let filter = ProfileFilter {
        visibility: Some(scope.clone()),
        require_coordinates: true,
        ..Default::default()
    };
    let records: Vec<ProfileRecord> = repo
        .find_many(&filter)
        .await?
        .into_iter()
        .filter(|r| scope.allows(r.privacy, &r.user_id))
        .collect();

    let markers = build_markers(&records, avatars, &mut rand::thread_rng());
    info!("🗺️ Map markers: {}", markers.len());
    Ok(markers)
}
