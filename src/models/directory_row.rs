use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Privacy;

// Flattened, enriched profile for the directory table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRow {
    pub profile_id: String,
    pub user_id: String,
    pub name: String,
    pub tagline: String,
    pub color: String,
    pub avatar: Option<String>,
    pub privacy: Privacy,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// `YYYY-MM-DD` with `show_age`, `MM-DD` without.
    pub birth_date: Option<String>,
    pub birthday_label: Option<String>,
    pub show_age: bool,
    pub age: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub distance_km: Option<f64>,
    pub days_to_next_birthday: Option<i64>,
}
