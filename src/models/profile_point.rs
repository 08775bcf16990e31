use serde::Serialize;

use crate::services::geo_service::Coordinates;

// Geolocation projection of a profile, used by the landing globe.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ProfilePoint {
    pub id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub avatar: Option<String>,
}

impl ProfilePoint {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    /// Valid coordinates plus a non-empty avatar key.
    pub fn is_mappable(&self) -> bool {
        self.coordinates().is_some()
            && self
                .avatar
                .as_deref()
                .map(|a| !a.trim().is_empty())
                .unwrap_or(false)
    }
}
