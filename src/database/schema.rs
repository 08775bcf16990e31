use sqlx::SqlitePool;
use tracing::info;

pub const SQL_SCHEMA: &str = include_str!("../../schema/0001_profiles.sql");

/// Creates the tables the service reads if they do not exist yet. The
/// OAuth layer owns `user`, `account` and `session`; they are created here
/// so a fresh database (or a test pool) is usable on its own.
pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    let statements = SQL_SCHEMA
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut applied = 0;
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
        applied += 1;
    }
    info!("🗄️ Schema ready ({} statements)", applied);
    Ok(())
}
