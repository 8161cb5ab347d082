//! Statement-level data access.
//!
//! Every function takes a bare `SqliteConnection`, so the same code serves a
//! pooled connection for reads and an open `Transaction` for the ledger's
//! multi-statement writes (`&mut *tx`).

use crate::error::DbError;
use crate::rows;
use chrono::Utc;
use core_types::{
    Account, AccountId, AllocationDetail, AllocationRequest, Bet, BetDetails, BetId, BetResult,
    BetStatus, Match, MatchId, NewMatch, ResultType, Settings, Team,
};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use std::collections::BTreeMap;

const ACCOUNT_COLUMNS: &str = "account_id, name, balance, remarks, created_at, updated_at";

const BET_SELECT: &str = r#"
    SELECT
        b.bet_id, b.match_id, m.team1 || ' vs ' || m.team2 AS match_label,
        b.team1_odds, b.team2_odds, b.betting_value, b.total_amount, b.status,
        b.created_at, b.updated_at
    FROM bets b
    JOIN matches m ON b.match_id = m.match_id
"#;

/// Which slice of the bets table to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetFilter {
    /// Unresolved bets, soonest match first.
    Active,
    /// Won, lost and cashed-out bets, most recent match first.
    Resolved,
}

// ------------------------------------------------------------------------------
// Accounts
// ------------------------------------------------------------------------------

pub async fn insert_account(
    conn: &mut SqliteConnection,
    name: &str,
    balance: Decimal,
    remarks: &str,
) -> Result<Account, DbError> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO accounts (name, balance, remarks, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(balance.to_string())
    .bind(remarks)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    fetch_account(conn, result.last_insert_rowid())
        .await?
        .ok_or(DbError::NotFound)
}

pub async fn fetch_account(
    conn: &mut SqliteConnection,
    account_id: AccountId,
) -> Result<Option<Account>, DbError> {
    let sql = format!("SELECT {} FROM accounts WHERE account_id = ?", ACCOUNT_COLUMNS);
    sqlx::query(&sql)
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(|row| rows::account(&row))
        .transpose()
}

pub async fn fetch_accounts(conn: &mut SqliteConnection) -> Result<Vec<Account>, DbError> {
    let sql = format!("SELECT {} FROM accounts ORDER BY account_id", ACCOUNT_COLUMNS);
    sqlx::query(&sql)
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(rows::account)
        .collect()
}

/// Updates an account's name and remarks. Returns `false` if no such account exists.
pub async fn update_account_details(
    conn: &mut SqliteConnection,
    account_id: AccountId,
    name: &str,
    remarks: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query("UPDATE accounts SET name = ?, remarks = ?, updated_at = ? WHERE account_id = ?")
        .bind(name)
        .bind(remarks)
        .bind(Utc::now())
        .bind(account_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Overwrites an account's balance. Only the ledger calls this, inside its transactions.
pub async fn set_account_balance(
    conn: &mut SqliteConnection,
    account_id: AccountId,
    balance: Decimal,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE accounts SET balance = ?, updated_at = ? WHERE account_id = ?")
        .bind(balance.to_string())
        .bind(Utc::now())
        .bind(account_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

// ------------------------------------------------------------------------------
// Matches
// ------------------------------------------------------------------------------

pub async fn insert_match(conn: &mut SqliteConnection, fixture: &NewMatch) -> Result<Match, DbError> {
    let result = sqlx::query(
        "INSERT INTO matches (team1, team2, match_date, match_time, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(fixture.team1.trim())
    .bind(fixture.team2.trim())
    .bind(fixture.match_date)
    .bind(fixture.match_time.trim())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    fetch_match(conn, result.last_insert_rowid())
        .await?
        .ok_or(DbError::NotFound)
}

pub async fn fetch_match(conn: &mut SqliteConnection, match_id: MatchId) -> Result<Option<Match>, DbError> {
    sqlx::query("SELECT match_id, team1, team2, match_date, match_time FROM matches WHERE match_id = ?")
        .bind(match_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(|row| rows::fixture(&row))
        .transpose()
}

// ------------------------------------------------------------------------------
// Bets
// ------------------------------------------------------------------------------

pub async fn insert_bet(
    conn: &mut SqliteConnection,
    match_id: MatchId,
    team1_odds: Decimal,
    team2_odds: Decimal,
    betting_value: Option<Decimal>,
    total_amount: Decimal,
) -> Result<BetId, DbError> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO bets (match_id, team1_odds, team2_odds, betting_value, total_amount, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(match_id)
    .bind(team1_odds.to_string())
    .bind(team2_odds.to_string())
    .bind(betting_value.map(|v| v.to_string()))
    .bind(total_amount.to_string())
    .bind(BetStatus::Active.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn fetch_bet(conn: &mut SqliteConnection, bet_id: BetId) -> Result<Option<Bet>, DbError> {
    let sql = format!("{} WHERE b.bet_id = ?", BET_SELECT);
    sqlx::query(&sql)
        .bind(bet_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(|row| rows::bet(&row))
        .transpose()
}

pub async fn fetch_bets(conn: &mut SqliteConnection, filter: BetFilter) -> Result<Vec<Bet>, DbError> {
    let clause = match filter {
        BetFilter::Active => "WHERE b.status = 'active' ORDER BY m.match_date, m.match_time, b.bet_id",
        BetFilter::Resolved => {
            "WHERE b.status <> 'active' ORDER BY m.match_date DESC, m.match_time DESC, b.bet_id DESC"
        }
    };
    let sql = format!("{} {}", BET_SELECT, clause);
    sqlx::query(&sql)
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(rows::bet)
        .collect()
}

/// Moves an active bet into `status`.
///
/// Returns `false` when the bet is no longer active, so a bet can only ever
/// be resolved once even if two callers race.
pub async fn mark_bet_resolved(
    conn: &mut SqliteConnection,
    bet_id: BetId,
    status: BetStatus,
) -> Result<bool, DbError> {
    let result = sqlx::query("UPDATE bets SET status = ?, updated_at = ? WHERE bet_id = ? AND status = 'active'")
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(bet_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// A bet with its match and allocations, or `None` if the bet does not exist.
pub async fn fetch_bet_details(
    conn: &mut SqliteConnection,
    bet_id: BetId,
) -> Result<Option<BetDetails>, DbError> {
    let Some(bet) = fetch_bet(conn, bet_id).await? else {
        return Ok(None);
    };
    let fixture = fetch_match(conn, bet.match_id).await?.ok_or(DbError::NotFound)?;
    let allocations = fetch_allocations(conn, bet_id).await?;
    Ok(Some(BetDetails { bet, fixture, allocations }))
}

// ------------------------------------------------------------------------------
// Allocations
// ------------------------------------------------------------------------------

pub async fn insert_allocation(
    conn: &mut SqliteConnection,
    bet_id: BetId,
    allocation: &AllocationRequest,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO bet_accounts (bet_id, account_id, team_number, bet_amount, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(bet_id)
    .bind(allocation.account_id)
    .bind(allocation.team.number())
    .bind(allocation.amount.to_string())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn fetch_allocations(
    conn: &mut SqliteConnection,
    bet_id: BetId,
) -> Result<Vec<AllocationDetail>, DbError> {
    sqlx::query(
        r#"
        SELECT ba.bet_id, ba.account_id, ba.team_number, ba.bet_amount, ba.payout, a.name AS account_name
        FROM bet_accounts ba
        JOIN accounts a ON ba.account_id = a.account_id
        WHERE ba.bet_id = ?
        ORDER BY ba.team_number, ba.account_id
        "#,
    )
    .bind(bet_id)
    .fetch_all(&mut *conn)
    .await?
    .iter()
    .map(rows::allocation_detail)
    .collect()
}

pub async fn set_allocation_payout(
    conn: &mut SqliteConnection,
    bet_id: BetId,
    account_id: AccountId,
    payout: Decimal,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE bet_accounts SET payout = ? WHERE bet_id = ? AND account_id = ?")
        .bind(payout.to_string())
        .bind(bet_id)
        .bind(account_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

// ------------------------------------------------------------------------------
// Results
// ------------------------------------------------------------------------------

/// The settlement record to write for a bet.
#[derive(Debug, Clone)]
pub struct NewResult<'a> {
    pub bet_id: BetId,
    pub result_type: ResultType,
    pub winning_team: Option<Team>,
    pub total_payout: Decimal,
    pub net_profit: Decimal,
    pub cashout_amounts: &'a BTreeMap<AccountId, Decimal>,
}

pub async fn insert_result(conn: &mut SqliteConnection, result: &NewResult<'_>) -> Result<BetResult, DbError> {
    let details = serde_json::to_string(result.cashout_amounts)?;
    sqlx::query(
        r#"
        INSERT INTO results (bet_id, result_type, winning_team, total_payout, net_profit, cashout_details, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(result.bet_id)
    .bind(result.result_type.as_str())
    .bind(result.winning_team.map(|t| t.number()))
    .bind(result.total_payout.to_string())
    .bind(result.net_profit.to_string())
    .bind(details)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    fetch_result(conn, result.bet_id).await?.ok_or(DbError::NotFound)
}

pub async fn fetch_result(conn: &mut SqliteConnection, bet_id: BetId) -> Result<Option<BetResult>, DbError> {
    sqlx::query(
        r#"
        SELECT result_id, bet_id, result_type, winning_team, total_payout, net_profit, cashout_details, created_at
        FROM results
        WHERE bet_id = ?
        "#,
    )
    .bind(bet_id)
    .fetch_optional(&mut *conn)
    .await?
    .map(|row| rows::bet_result(&row))
    .transpose()
}

// ------------------------------------------------------------------------------
// Settings
// ------------------------------------------------------------------------------

/// Inserts the settings row if it is missing; an existing row is left alone.
pub async fn seed_settings(conn: &mut SqliteConnection, defaults: &Settings) -> Result<(), DbError> {
    sqlx::query(
        "INSERT OR IGNORE INTO settings (setting_id, min_transfer, default_betting_value, updated_at) VALUES (1, ?, ?, NULL)",
    )
    .bind(defaults.min_transfer.to_string())
    .bind(defaults.default_betting_value.to_string())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn fetch_settings(conn: &mut SqliteConnection) -> Result<Option<Settings>, DbError> {
    sqlx::query("SELECT min_transfer, default_betting_value, updated_at FROM settings WHERE setting_id = 1")
        .fetch_optional(&mut *conn)
        .await?
        .map(|row| rows::settings(&row))
        .transpose()
}

pub async fn save_settings(conn: &mut SqliteConnection, settings: &Settings) -> Result<Settings, DbError> {
    sqlx::query(
        r#"
        INSERT INTO settings (setting_id, min_transfer, default_betting_value, updated_at)
        VALUES (1, ?, ?, ?)
        ON CONFLICT (setting_id) DO UPDATE SET
            min_transfer = excluded.min_transfer,
            default_betting_value = excluded.default_betting_value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(settings.min_transfer.to_string())
    .bind(settings.default_betting_value.to_string())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    fetch_settings(conn).await?.ok_or(DbError::NotFound)
}

// ------------------------------------------------------------------------------
// Reset
// ------------------------------------------------------------------------------

/// Deletes every row from every table and restarts the id sequences.
pub async fn clear_all(conn: &mut SqliteConnection) -> Result<(), DbError> {
    sqlx::Executor::execute(
        &mut *conn,
        sqlx::raw_sql(
        r#"
        DELETE FROM results;
        DELETE FROM bet_accounts;
        DELETE FROM bets;
        DELETE FROM matches;
        DELETE FROM accounts;
        DELETE FROM settings;
        DELETE FROM sqlite_sequence;
        "#,
        ),
    )
    .await?;
    Ok(())
}
