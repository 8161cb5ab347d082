use crate::error::DbError;
use crate::queries;
use core_types::Settings;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const SCHEMA: &str = include_str!("../sql/schema.sql");

/// Opens a connection pool on the SQLite file at `path`.
///
/// The parent directory and the file itself are created if missing, and
/// foreign keys are enforced on every connection.
pub async fn connect(path: &Path) -> Result<SqlitePool, DbError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    tracing::debug!(path = %path.display(), "Opened SQLite pool");
    Ok(pool)
}

/// Opens a private in-memory database.
///
/// The pool is pinned to a single connection that is never recycled, since an
/// in-memory database lives and dies with its connection.
pub async fn connect_in_memory() -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Creates any missing tables and indexes, then seeds the settings row with
/// `defaults` if it does not exist yet. Existing data is never touched.
pub async fn init_schema(pool: &SqlitePool, defaults: &Settings) -> Result<(), DbError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;

    let mut conn = pool.acquire().await?;
    queries::seed_settings(&mut conn, defaults).await?;

    tracing::info!("Database tables and indexes are in place");
    Ok(())
}
