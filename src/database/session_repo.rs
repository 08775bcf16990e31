use sqlx::SqlitePool;

use crate::models::SessionRow;

pub const SQL_LOAD_SESSION: &str = r#"
SELECT token, user_id, expires_at
FROM session
WHERE token = ?1
LIMIT 1
"#;

pub const SQL_DELETE_SESSION: &str = r#"
DELETE FROM session
WHERE token = ?1
"#;

pub async fn load_session(pool: &SqlitePool, token: &str) -> sqlx::Result<Option<SessionRow>> {
    sqlx::query_as::<_, SessionRow>(SQL_LOAD_SESSION)
        .bind(token)
        .fetch_optional(pool)
        .await
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_DELETE_SESSION)
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
