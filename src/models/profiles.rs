use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Privacy;
use crate::services::birthday_service;
use crate::services::geo_service::Coordinates;

/// Stored profile joined with the owning user's display fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRecord {
    pub id: String,
    pub user_id: String,
    pub tagline: Option<String>,
    pub avatar: Option<String>,
    pub background: Option<String>,
    pub about: Option<String>,
    pub color: Option<String>,
    #[sqlx(try_from = "String")]
    pub privacy: Privacy,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub birth_date: Option<String>,
    pub show_age: bool,
    pub links: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
}

impl From<String> for Privacy {
    fn from(raw: String) -> Self {
        Privacy::from_stored(&raw)
    }
}

impl ProfileRecord {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    /// Malformed stored dates read as "no birthday".
    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
            .as_deref()
            .and_then(birthday_service::parse_birth_date)
    }

    pub fn links(&self) -> Vec<ProfileLink> {
        self.links
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|raw| serde_json::from_str::<Vec<ProfileLink>>(raw).ok())
            .unwrap_or_default()
    }

    pub fn display_name(&self) -> String {
        self.user_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
            .to_string()
    }

    /// Profile avatar key, falling back to the provider image of the user.
    pub fn avatar_or_user_image(&self) -> Option<&str> {
        self.avatar
            .as_deref()
            .or(self.user_image.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLink {
    pub name: String,
    pub url: String,
}

/// Validated write model for the profile form. `None` on a nullable
/// column clears it; `links: None` leaves the stored links untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub background: Option<String>,
    pub color: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub privacy: Option<Privacy>,
    pub birth_date: Option<NaiveDate>,
    pub show_age: bool,
    pub links: Option<Option<Vec<ProfileLink>>>,
}
