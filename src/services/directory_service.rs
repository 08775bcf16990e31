use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::database::{ProfileFilter, ProfileRepository};
use crate::error::Result;
use crate::models::{DirectoryRow, ProfileRecord};
use crate::services::birthday_service;
use crate::services::geo_service::Coordinates;
use crate::services::privacy_service::VisibilityScope;

#[derive(Debug, Deserialize, Default)]
pub struct DirectoryQuery {
    pub q: Option<String>,
    pub sort: Option<String>, // name|birthday|distance|createdAt|updatedAt
    pub desc: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Birthday,
    Distance,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn parse(input: Option<&str>) -> SortField {
        match input.unwrap_or("name").trim() {
            "birthday" => SortField::Birthday,
            "distance" => SortField::Distance,
            "createdAt" | "created_at" | "joined" => SortField::CreatedAt,
            "updatedAt" | "updated_at" | "updated" => SortField::UpdatedAt,
            _ => SortField::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectorySort {
    pub field: SortField,
    pub descending: bool,
}

impl Default for DirectorySort {
    fn default() -> Self {
        Self {
            field: SortField::Name,
            descending: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryPage {
    pub rows: Vec<DirectoryRow>,
    pub viewer_coords: Option<Coordinates>,
    /// The distance column only makes sense with viewer coordinates.
    pub show_distance: bool,
    pub sort: DirectorySort,
    pub query: String,
    pub total: usize,
}

pub fn enrich_row(record: &ProfileRecord, viewer_coords: Option<Coordinates>) -> DirectoryRow {
    enrich_row_on(record, viewer_coords, birthday_service::today_utc())
}

pub fn enrich_row_on(
    record: &ProfileRecord,
    viewer_coords: Option<Coordinates>,
    today: NaiveDate,
) -> DirectoryRow {
    let coords = record.coordinates();
    let distance_km = viewer_coords
        .zip(coords)
        .map(|(viewer, row)| viewer.distance_km(&row));

    let birth = record.birth_date();
    let show_age = record.show_age;

    DirectoryRow {
        profile_id: record.id.clone(),
        user_id: record.user_id.clone(),
        name: record.display_name(),
        tagline: record.tagline.clone().unwrap_or_default(),
        color: record.color.clone().unwrap_or_default(),
        avatar: record.avatar_or_user_image().map(str::to_string),
        privacy: record.privacy,
        latitude: coords.map(|c| c.latitude),
        longitude: coords.map(|c| c.longitude),
        birth_date: birth.map(|b| birthday_service::format_birth_date(b, show_age)),
        birthday_label: birth.map(|b| birthday_service::birthday_label(b, show_age)),
        show_age,
        age: birth
            .filter(|_| show_age)
            .and_then(|b| birthday_service::age_on(b, today)),
        created_at: record.created_at,
        updated_at: record.updated_at,
        distance_km,
        days_to_next_birthday: birth
            .and_then(|b| birthday_service::days_to_next_birthday_on(b, today)),
    }
}

pub fn build_directory_rows(
    records: &[ProfileRecord],
    viewer_coords: Option<Coordinates>,
) -> Vec<DirectoryRow> {
    let today = birthday_service::today_utc();
    records
        .iter()
        .map(|r| enrich_row_on(r, viewer_coords, today))
        .collect()
}

/// Lowercased, with combining marks stripped after canonical decomposition.
fn fold_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

// Digit runs compare by numeric value, everything else per character.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let mut run_a = String::new();
                while let Some(c) = a_chars.peek().copied().filter(char::is_ascii_digit) {
                    run_a.push(c);
                    a_chars.next();
                }
                let mut run_b = String::new();
                while let Some(c) = b_chars.peek().copied().filter(char::is_ascii_digit) {
                    run_b.push(c);
                    b_chars.next();
                }
                let run_a = run_a.trim_start_matches('0');
                let run_b = run_b.trim_start_matches('0');
                let ord = run_a.len().cmp(&run_b.len()).then_with(|| run_a.cmp(run_b));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(ca), Some(cb)) => {
                if ca != cb {
                    return ca.cmp(&cb);
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

/// Diacritic- and case-insensitive, numeric-aware name ordering.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    natural_cmp(&fold_name(a), &fold_name(b))
}

// Missing values sort last in either direction.
fn cmp_missing_last<T: PartialOrd>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort of directory rows.
pub fn sort_rows(rows: &mut [DirectoryRow], sort: DirectorySort) {
    let directed = |ord: Ordering| if sort.descending { ord.reverse() } else { ord };
    match sort.field {
        SortField::Name => rows.sort_by(|a, b| directed(compare_names(&a.name, &b.name))),
        SortField::Birthday => rows.sort_by(|a, b| {
            cmp_missing_last(a.days_to_next_birthday, b.days_to_next_birthday, sort.descending)
        }),
        SortField::Distance => rows.sort_by(|a, b| {
            cmp_missing_last(a.distance_km, b.distance_km, sort.descending)
        }),
        SortField::CreatedAt => rows.sort_by(|a, b| directed(a.created_at.cmp(&b.created_at))),
        SortField::UpdatedAt => rows.sort_by(|a, b| directed(a.updated_at.cmp(&b.updated_at))),
    }
}

/// Free-text filtering looks at the name only.
pub fn filter_by_name(rows: Vec<DirectoryRow>, query: &str) -> Vec<DirectoryRow> {
    let needle = fold_name(query.trim());
    if needle.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|r| fold_name(&r.name).contains(&needle))
        .collect()
}

/// Loads every profile the viewer may see and shapes it for the table.
pub async fn build_directory_page(
    repo: &dyn ProfileRepository,
    viewer_id: Option<&str>,
    query: &DirectoryQuery,
) -> Result<DirectoryPage> {
    let scope = VisibilityScope::for_viewer(viewer_id);
    let records = repo
        .find_many(&ProfileFilter::visible_to(scope.clone()))
        .await?;

    // Distances are measured from the viewer's own profile, never from
    // request geolocation.
    let viewer_coords = match viewer_id {
        Some(id) => repo
            .find_by_user_id(id)
            .await?
            .and_then(|p| p.coordinates()),
        None => None,
    };

    let visible: Vec<ProfileRecord> = records
        .into_iter()
        .filter(|r| scope.allows(r.privacy, &r.user_id))
        .collect();
    let total = visible.len();

    let search = query.q.clone().unwrap_or_default();
    let mut rows = filter_by_name(build_directory_rows(&visible, viewer_coords), &search);
    let sort = DirectorySort {
        field: SortField::parse(query.sort.as_deref()),
        descending: query.desc.unwrap_or(false),
    };
    sort_rows(&mut rows, sort);

    info!(
        "📇 Directory page: visible={}, shown={}, viewer_coords={}",
        total,
        rows.len(),
        viewer_coords.is_some()
    );

    Ok(DirectoryPage {
        rows,
        viewer_coords,
        show_distance: viewer_coords.is_some(),
        sort,
        query: search,
        total,
    })
}
