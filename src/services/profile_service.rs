use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::database::{ProfileFilter, ProfileRepository};
use crate::error::{AppError, Result};
use crate::models::{Privacy, ProfileLink, ProfileRecord, ProfileUpdate};
use crate::services::avatar_service::AvatarUrls;
use crate::services::birthday_service;
use crate::services::privacy_service::VisibilityScope;

pub const PROFILE_FIELDS: [&str; 16] = [
    "id",
    "tagline",
    "avatar",
    "background",
    "about",
    "color",
    "privacy",
    "longitude",
    "latitude",
    "birthDate",
    "showAge",
    "links",
    "createdAt",
    "updatedAt",
    "userId",
    "user",
];

/// `?fields=` projection. An empty or absent selection means every field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    fields: Option<HashSet<&'static str>>,
}

impl FieldSelection {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        let fields: HashSet<&'static str> = raw
            .split(',')
            .map(str::trim)
            .filter_map(|f| PROFILE_FIELDS.iter().copied().find(|known| *known == f))
            .collect();
        Self {
            fields: (!fields.is_empty()).then_some(fields),
        }
    }

    pub fn includes(&self, field: &str) -> bool {
        self.fields
            .as_ref()
            .map(|set| set.contains(field))
            .unwrap_or(true)
    }
}

/// JSON shape of the profile API. The user's e-mail and provider image are
/// never part of it, and the birth year is dropped unless `showAge` is set.
pub fn format_profile(
    record: &ProfileRecord,
    fields: &FieldSelection,
    avatars: &AvatarUrls,
) -> Value {
    let mut out = Map::new();
    let mut put = |name: &str, value: Value| {
        if fields.includes(name) {
            out.insert(name.to_string(), value);
        }
    };

    put("id", json!(record.id));
    put("tagline", json!(record.tagline));
    put("avatar", json!(avatars.url_for(record.avatar.as_deref())));
    put("background", json!(avatars.url_for(record.background.as_deref())));
    put("about", json!(record.about));
    put("color", json!(record.color));
    put("privacy", json!(record.privacy));
    put("longitude", json!(record.longitude));
    put("latitude", json!(record.latitude));
    put("links", json!(record.links()));
    put("createdAt", json!(record.created_at));
    put("updatedAt", json!(record.updated_at));
    put("showAge", json!(record.show_age));
    put(
        "birthDate",
        json!(record
            .birth_date()
            .map(|b| birthday_service::format_birth_date(b, record.show_age))),
    );
    put("userId", json!(record.user_id));
    put(
        "user",
        json!({ "id": record.user_id, "name": record.user_name }),
    );

    Value::Object(out)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileView {
    pub id: String,
    pub name: String,
    pub tagline: Option<String>,
    pub avatar: Option<String>,
    pub about: Option<String>,
    pub privacy: Privacy,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PublicProfileView {
    pub fn from_record(record: &ProfileRecord, avatars: &AvatarUrls) -> Self {
        Self {
            id: record.id.clone(),
            name: record.display_name(),
            tagline: record.tagline.clone(),
            avatar: avatars.url_for(record.avatar.as_deref()),
            about: record.about.clone(),
            privacy: record.privacy,
            latitude: record.latitude,
            longitude: record.longitude,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

fn visible(record: Option<ProfileRecord>, scope: &VisibilityScope) -> Option<ProfileRecord> {
    record.filter(|r| scope.allows(r.privacy, &r.user_id))
}

/// `None` both when the profile does not exist and when the viewer may not
/// see it.
pub async fn load_visible_profile(
    repo: &dyn ProfileRepository,
    scope: &VisibilityScope,
    profile_id: &str,
) -> Result<Option<ProfileRecord>> {
    Ok(visible(repo.find_unique(profile_id).await?, scope))
}

pub async fn load_visible_profile_by_user(
    repo: &dyn ProfileRepository,
    scope: &VisibilityScope,
    user_id: &str,
) -> Result<Option<ProfileRecord>> {
    Ok(visible(repo.find_by_user_id(user_id).await?, scope))
}

pub async fn load_visible_profile_by_account(
    repo: &dyn ProfileRepository,
    scope: &VisibilityScope,
    account_id: &str,
    provider_id: &str,
) -> Result<Option<ProfileRecord>> {
    Ok(visible(
        repo.find_by_account(account_id, provider_id).await?,
        scope,
    ))
}

pub async fn load_visible_profiles(
    repo: &dyn ProfileRepository,
    scope: &VisibilityScope,
    ids: Option<Vec<String>>,
    user_ids: Option<Vec<String>>,
) -> Result<Vec<ProfileRecord>> {
    let filter = ProfileFilter {
        visibility: Some(scope.clone()),
        ids,
        user_ids,
        ..Default::default()
    };
    let records = repo.find_many(&filter).await?;
    Ok(records
        .into_iter()
        .filter(|r| scope.allows(r.privacy, &r.user_id))
        .collect())
}

pub fn split_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize, Default)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub background: Option<String>,
    pub color: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub privacy: Option<String>,
    #[serde(rename = "birthDate")]
    pub birth_date: Option<String>,
    #[serde(rename = "showAge")]
    pub show_age: Option<String>,
    pub links: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AboutForm {
    pub about: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_degrees(raw: &Option<String>, limit: f64, label: &str) -> Result<Option<f64>> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && (-limit..=limit).contains(&v) => Ok(Some(v)),
        _ => Err(AppError::BadRequest(format!(
            "{} must be between -{} and {} degrees",
            label, limit, limit
        ))),
    }
}

/// Keeps `http(s)://` and `mailto:` URLs, turns bare e-mail addresses into
/// `mailto:` links and assumes `https://` for anything host-like.
pub fn normalize_url(raw: &str) -> Option<String> {
    let v = raw.trim();
    if v.is_empty() || v.chars().any(char::is_whitespace) {
        return None;
    }

    let lower = v.to_ascii_lowercase();
    if lower.starts_with("mailto:") || lower.starts_with("http://") || lower.starts_with("https://")
    {
        return Some(v.to_string());
    }

    if let Some((local, domain)) = v.split_once('@') {
        let domain_ok = domain
            .split_once('.')
            .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
            .unwrap_or(false);
        if !local.is_empty() && !domain.contains('@') && domain_ok {
            return Some(format!("mailto:{}", v));
        }
        return None;
    }

    if v.contains(['/', '?', '#']) {
        Some(format!("https://{}", v))
    } else {
        Some(format!("https://{}/", v))
    }
}

/// `None` means "leave links alone" (bad shape or unparsable input),
/// `Some(None)` clears them.
pub fn parse_links_field(raw: &str) -> Option<Option<Vec<ProfileLink>>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" || raw == "[]" {
        return Some(None);
    }

    let parsed: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse links: {}", e);
            return None;
        }
    };
    let items = parsed.as_array()?;

    let cleaned: Vec<ProfileLink> = items
        .iter()
        .filter_map(|item| {
            let field = |key: &str| {
                item.get(key)
                    .map(|v| match v {
                        Value::String(s) => s.trim().to_string(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .unwrap_or_default()
            };
            let name = field("name");
            let url = field("url");
            if name.is_empty() || url.is_empty() {
                return None;
            }
            normalize_url(&url).map(|url| ProfileLink { name, url })
        })
        .collect();

    Some((!cleaned.is_empty()).then_some(cleaned))
}

pub fn parse_profile_form(form: &ProfileForm) -> Result<ProfileUpdate> {
    let latitude = parse_degrees(&form.latitude, 90.0, "Latitude")?;
    let longitude = parse_degrees(&form.longitude, 180.0, "Longitude")?;

    let privacy = match non_empty(&form.privacy) {
        Some(raw) => raw
            .parse::<Privacy>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => Privacy::Public,
    };

    let birth_date = match non_empty(&form.birth_date) {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest("Birth date must be YYYY-MM-DD".into()))?,
        ),
        None => None,
    };

    Ok(ProfileUpdate {
        name: non_empty(&form.name),
        tagline: non_empty(&form.tagline),
        background: non_empty(&form.background),
        color: non_empty(&form.color),
        latitude,
        longitude,
        privacy: Some(privacy),
        birth_date,
        show_age: form.show_age.as_deref() == Some("true"),
        links: form.links.as_deref().and_then(parse_links_field),
    })
}

/// Applies the profile form for the signed-in user; returns the profile id.
pub async fn update_profile(
    repo: &dyn ProfileRepository,
    user_id: &str,
    form: &ProfileForm,
) -> Result<String> {
    let update = parse_profile_form(form)?;
    let profile_id = repo
        .update_profile(user_id, &update)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;
    info!("✏️ Profile {} updated by {}", profile_id, user_id);
    Ok(profile_id)
}

pub async fn update_about(
    repo: &dyn ProfileRepository,
    user_id: &str,
    form: &AboutForm,
) -> Result<String> {
    let about = form.about.as_deref().filter(|s| !s.trim().is_empty());
    if !repo.update_about(user_id, about).await? {
        return Err(AppError::NotFound("Profile"));
    }
    let profile = repo
        .find_by_user_id(user_id)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;
    Ok(profile.id)
}
