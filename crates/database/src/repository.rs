use crate::backup;
use crate::queries::{self, BetFilter};
use crate::DbError;
use core_types::{Account, AccountId, BetDetails, BetId, HistoryEntry, Settings};
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::Transaction;
use std::path::{Path, PathBuf};

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. Reads and single-statement writes live here; the ledger
/// opens a transaction with [`DbRepository::begin`] and composes the
/// statement-level functions in [`crate::queries`] for anything that moves money.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
    defaults: Settings,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, defaults: Settings::default() }
    }

    /// Replaces the settings used when the settings row is missing or after a reset.
    pub fn with_settings_defaults(mut self, defaults: Settings) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Starts a transaction. Dropping it without `commit` rolls everything back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, DbError> {
        Ok(self.pool.begin().await?)
    }

    /// Fetches all accounts ordered by id.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, DbError> {
        let mut conn = self.pool.acquire().await?;
        queries::fetch_accounts(&mut conn).await
    }

    pub async fn get_account(&self, account_id: AccountId) -> Result<Account, DbError> {
        let mut conn = self.pool.acquire().await?;
        queries::fetch_account(&mut conn, account_id).await?.ok_or(DbError::NotFound)
    }

    /// Renames an account and replaces its remarks. The balance is not touched.
    pub async fn update_account_details(
        &self,
        account_id: AccountId,
        name: &str,
        remarks: &str,
    ) -> Result<Account, DbError> {
        let mut conn = self.pool.acquire().await?;
        if !queries::update_account_details(&mut conn, account_id, name.trim(), remarks).await? {
            return Err(DbError::NotFound);
        }
        tracing::info!(account_id, "Account details updated");
        queries::fetch_account(&mut conn, account_id).await?.ok_or(DbError::NotFound)
    }

    /// Fetches all unresolved bets with their allocations, soonest match first.
    pub async fn list_active_bets(&self) -> Result<Vec<BetDetails>, DbError> {
        let mut conn = self.pool.acquire().await?;
        let bets = queries::fetch_bets(&mut conn, BetFilter::Active).await?;

        let mut details = Vec::with_capacity(bets.len());
        for bet in bets {
            if let Some(d) = queries::fetch_bet_details(&mut conn, bet.bet_id).await? {
                details.push(d);
            }
        }
        Ok(details)
    }

    pub async fn get_bet_details(&self, bet_id: BetId) -> Result<BetDetails, DbError> {
        let mut conn = self.pool.acquire().await?;
        queries::fetch_bet_details(&mut conn, bet_id).await?.ok_or(DbError::NotFound)
    }

    /// Fetches every resolved bet with its result and allocations, most recent match first.
    pub async fn get_bet_history(&self) -> Result<Vec<HistoryEntry>, DbError> {
        let mut conn = self.pool.acquire().await?;
        let bets = queries::fetch_bets(&mut conn, BetFilter::Resolved).await?;

        let mut history = Vec::with_capacity(bets.len());
        for bet in bets {
            let Some(details) = queries::fetch_bet_details(&mut conn, bet.bet_id).await? else {
                continue;
            };
            let result = queries::fetch_result(&mut conn, bet.bet_id).await?;
            history.push(HistoryEntry { details, result });
        }
        Ok(history)
    }

    /// Returns the stored settings, or the configured defaults if the row is missing.
    pub async fn get_settings(&self) -> Result<Settings, DbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(queries::fetch_settings(&mut conn)
            .await?
            .unwrap_or_else(|| self.defaults.clone()))
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<Settings, DbError> {
        let mut conn = self.pool.acquire().await?;
        let saved = queries::save_settings(&mut conn, settings).await?;
        tracing::info!(
            min_transfer = %saved.min_transfer,
            default_betting_value = %saved.default_betting_value,
            "Settings updated"
        );
        Ok(saved)
    }

    /// Wipes all accounts, bets, results and settings in one transaction and
    /// re-seeds the settings row from the defaults.
    pub async fn reset_all(&self) -> Result<(), DbError> {
        let mut tx = self.begin().await?;
        queries::clear_all(&mut tx).await?;
        queries::seed_settings(&mut tx, &self.defaults).await?;
        tx.commit().await?;
        tracing::warn!("All ledger data has been reset");
        Ok(())
    }

    /// Writes a consistent, timestamped copy of the database into `backup_dir`.
    pub async fn backup_to(&self, backup_dir: &Path) -> Result<PathBuf, DbError> {
        backup::backup_database(&self.pool, backup_dir).await
    }
}
