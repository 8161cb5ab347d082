use crate::error::DbError;
use chrono::Local;
use sqlx::sqlite::SqlitePool;
use std::path::{Path, PathBuf};

const BACKUP_PREFIX: &str = "backup_";
const BACKUP_EXTENSION: &str = "db";

/// Writes a copy of the live database to `backup_dir/backup_YYYYMMDD_HHMMSS.db`.
///
/// Uses `VACUUM INTO`, which produces a consistent snapshot even while the
/// pool is open. A numeric suffix is appended if a backup with the same
/// timestamp already exists.
pub async fn backup_database(pool: &SqlitePool, backup_dir: &Path) -> Result<PathBuf, DbError> {
    tokio::fs::create_dir_all(backup_dir).await?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut target = backup_dir.join(format!("{}{}.{}", BACKUP_PREFIX, stamp, BACKUP_EXTENSION));
    let mut attempt = 1;
    while tokio::fs::try_exists(&target).await? {
        target = backup_dir.join(format!("{}{}_{}.{}", BACKUP_PREFIX, stamp, attempt, BACKUP_EXTENSION));
        attempt += 1;
    }

    sqlx::query("VACUUM INTO ?")
        .bind(target.to_string_lossy().into_owned())
        .execute(pool)
        .await?;

    tracing::info!(path = %target.display(), "Database backup created");
    Ok(target)
}

/// Lists the backup files in `backup_dir`, newest first.
pub async fn list_backups(backup_dir: &Path) -> Result<Vec<PathBuf>, DbError> {
    if !tokio::fs::try_exists(backup_dir).await? {
        return Ok(Vec::new());
    }

    let mut backups = Vec::new();
    let mut entries = tokio::fs::read_dir(backup_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_backup = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(BACKUP_PREFIX))
            && path.extension().is_some_and(|ext| ext == BACKUP_EXTENSION);
        if is_backup {
            backups.push(path);
        }
    }

    // The timestamp in the name sorts chronologically.
    backups.sort();
    backups.reverse();
    Ok(backups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{connect, init_schema};
    use crate::queries;
    use core_types::Settings;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn backup_is_a_readable_copy() {
        let dir = tempfile::tempdir().unwrap();
        let pool = connect(&dir.path().join("betting.db")).await.unwrap();
        init_schema(&pool, &Settings::default()).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        queries::insert_account(&mut conn, "Account 1", dec!(750.25), "").await.unwrap();
        drop(conn);

        let backup_dir = dir.path().join("backups");
        let first = backup_database(&pool, &backup_dir).await.unwrap();
        let second = backup_database(&pool, &backup_dir).await.unwrap();
        assert_ne!(first, second);

        let listed = list_backups(&backup_dir).await.unwrap();
        assert_eq!(listed.len(), 2);

        let copy = connect(&first).await.unwrap();
        let mut conn = copy.acquire().await.unwrap();
        let accounts = queries::fetch_accounts(&mut conn).await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, dec!(750.25));
    }

    #[tokio::test]
    async fn listing_a_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_backups(&dir.path().join("nope")).await.unwrap().is_empty());
    }
}
