use chrono::Utc;
use sqlx::{sqlite::SqliteArguments, Arguments, SqlitePool};

use crate::models::{Privacy, ProfilePoint, ProfileRecord, ProfileUpdate};
use crate::services::privacy_service::VisibilityScope;

pub const SQL_PROFILE_BASE: &str = r#"
SELECT
    p.id, p.user_id, p.tagline, p.avatar, p.background, p.about, p.color,
    p.privacy, p.latitude, p.longitude, p.birth_date, p.show_age, p.links,
    p.created_at, p.updated_at,
    u.name AS user_name, u.image AS user_image
FROM profile p
JOIN "user" u ON u.id = p.user_id
WHERE 1 = 1
"#;

pub const SQL_SAMPLE_MAPPABLE_POINTS: &str = r#"
SELECT id, latitude, longitude, avatar
FROM profile
WHERE latitude IS NOT NULL
  AND longitude IS NOT NULL
  AND avatar IS NOT NULL
  AND avatar != ''
  AND privacy IN ('PUBLIC', 'UNLISTED')
ORDER BY RANDOM()
LIMIT ?1
"#;

pub const SQL_UPDATE_ABOUT: &str = r#"
UPDATE profile
SET about = ?1, updated_at = ?2
WHERE user_id = ?3
"#;

pub const SQL_UPDATE_AVATAR: &str = r#"
UPDATE profile
SET avatar = ?1, updated_at = ?2
WHERE user_id = ?3
"#;

pub const SQL_UPDATE_USER_NAME: &str = r#"
UPDATE "user"
SET name = ?1, updated_at = ?2
WHERE id = ?3
"#;

/// Query shape for profile listings.
#[derive(Debug, Clone, Default)]
pub struct ProfileFilter {
    /// `None` skips privacy filtering; callers then check access per row.
    pub visibility: Option<VisibilityScope>,
    pub require_coordinates: bool,
    pub ids: Option<Vec<String>>,
    pub user_ids: Option<Vec<String>>,
}

impl ProfileFilter {
    pub fn visible_to(scope: VisibilityScope) -> Self {
        Self {
            visibility: Some(scope),
            ..Default::default()
        }
    }
}

fn push_in_list(sql: &mut String, args: &mut SqliteArguments<'_>, column: &str, values: &[String]) {
    let placeholders = vec!["?"; values.len()].join(", ");
    sql.push_str(&format!(" AND {} IN ({})", column, placeholders));
    for v in values {
        args.add(v.clone());
    }
}

pub async fn find_profiles(
    pool: &SqlitePool,
    filter: &ProfileFilter,
) -> sqlx::Result<Vec<ProfileRecord>> {
    let mut sql = String::from(SQL_PROFILE_BASE);
    let mut args = SqliteArguments::default();

    match &filter.visibility {
        Some(VisibilityScope::Anonymous) => {
            sql.push_str(" AND p.privacy IN ('PUBLIC', 'UNLISTED')");
        }
        Some(VisibilityScope::Authenticated { viewer_id }) => {
            sql.push_str(
                " AND (p.privacy IN ('PUBLIC', 'UNLISTED', 'HIDDEN') \
                 OR (p.privacy = 'PRIVATE' AND p.user_id = ?))",
            );
            args.add(viewer_id.clone());
        }
        None => {}
    }

    if filter.require_coordinates {
        sql.push_str(" AND p.latitude IS NOT NULL AND p.longitude IS NOT NULL");
    }

    if let Some(ids) = &filter.ids {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        push_in_list(&mut sql, &mut args, "p.id", ids);
    }

    if let Some(user_ids) = &filter.user_ids {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        push_in_list(&mut sql, &mut args, "p.user_id", user_ids);
    }

    sql.push_str(" ORDER BY p.id DESC");

    sqlx::query_as_with::<_, ProfileRecord, _>(&sql, args)
        .fetch_all(pool)
        .await
}

pub async fn find_profile_by_id(
    pool: &SqlitePool,
    profile_id: &str,
) -> sqlx::Result<Option<ProfileRecord>> {
    let sql = format!("{} AND p.id = ?1 LIMIT 1", SQL_PROFILE_BASE);
    sqlx::query_as::<_, ProfileRecord>(&sql)
        .bind(profile_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_profile_by_user_id(
    pool: &SqlitePool,
    user_id: &str,
) -> sqlx::Result<Option<ProfileRecord>> {
    let sql = format!("{} AND p.user_id = ?1 LIMIT 1", SQL_PROFILE_BASE);
    sqlx::query_as::<_, ProfileRecord>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_profile_by_account(
    pool: &SqlitePool,
    account_id: &str,
    provider_id: &str,
) -> sqlx::Result<Option<ProfileRecord>> {
    let sql = format!(
        "{} AND p.user_id IN (SELECT a.user_id FROM account a WHERE a.account_id = ?1 AND a.provider_id = ?2) LIMIT 1",
        SQL_PROFILE_BASE
    );
    sqlx::query_as::<_, ProfileRecord>(&sql)
        .bind(account_id)
        .bind(provider_id)
        .fetch_optional(pool)
        .await
}

/// Uniform random sample of mappable, anonymously visible points.
pub async fn sample_mappable_points(
    pool: &SqlitePool,
    sample: i64,
) -> sqlx::Result<Vec<ProfilePoint>> {
    sqlx::query_as::<_, ProfilePoint>(SQL_SAMPLE_MAPPABLE_POINTS)
        .bind(sample)
        .fetch_all(pool)
        .await
}

/// Applies a validated form update to the profile owned by `user_id`.
/// Returns the profile id, or `None` when the user has no profile.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    update: &ProfileUpdate,
) -> sqlx::Result<Option<String>> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let mut sql = String::from(
        "UPDATE profile SET tagline = ?, background = ?, color = ?, latitude = ?, \
         longitude = ?, privacy = ?, birth_date = ?, show_age = ?, updated_at = ?",
    );
    let mut args = SqliteArguments::default();
    args.add(update.tagline.clone());
    args.add(update.background.clone());
    args.add(update.color.clone());
    args.add(update.latitude);
    args.add(update.longitude);
    args.add(update.privacy.unwrap_or(Privacy::Public).as_str());
    args.add(update.birth_date.map(|d| d.format("%Y-%m-%d").to_string()));
    args.add(update.show_age);
    args.add(now);

    if let Some(links) = &update.links {
        sql.push_str(", links = ?");
        let encoded = links
            .as_ref()
            .map(|list| serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string()));
        args.add(encoded);
    }

    sql.push_str(" WHERE user_id = ?");
    args.add(user_id.to_string());

    let updated = sqlx::query_with(&sql, args)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if updated == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    if let Some(name) = update.name.as_deref() {
        sqlx::query(SQL_UPDATE_USER_NAME)
            .bind(name)
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    let profile_id: (String,) = sqlx::query_as("SELECT id FROM profile WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(profile_id.0))
}

pub async fn update_about(
    pool: &SqlitePool,
    user_id: &str,
    about: Option<&str>,
) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_UPDATE_ABOUT)
        .bind(about)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn update_avatar(pool: &SqlitePool, user_id: &str, key: &str) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_UPDATE_AVATAR)
        .bind(key)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
