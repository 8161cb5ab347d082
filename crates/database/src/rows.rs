//! Row → domain conversions.
//!
//! Money columns are TEXT, so they are decoded as strings and parsed here
//! rather than through `FromRow`.

use crate::error::DbError;
use core_types::{
    Account, Allocation, AllocationDetail, Bet, BetResult, BetStatus, Match, ResultType, Settings,
    Team,
};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::BTreeMap;
use std::str::FromStr;

fn corrupt(column: &str, reason: impl ToString) -> DbError {
    DbError::CorruptValue { column: column.to_string(), reason: reason.to_string() }
}

pub(crate) fn decimal(row: &SqliteRow, column: &str) -> Result<Decimal, DbError> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| corrupt(column, format!("'{}' is not a decimal: {}", raw, e)))
}

pub(crate) fn opt_decimal(row: &SqliteRow, column: &str) -> Result<Option<Decimal>, DbError> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| {
        Decimal::from_str(&raw).map_err(|e| corrupt(column, format!("'{}' is not a decimal: {}", raw, e)))
    })
    .transpose()
}

fn team(row: &SqliteRow, column: &str) -> Result<Team, DbError> {
    let number: i64 = row.try_get(column)?;
    Team::from_number(number).map_err(|e| corrupt(column, e))
}

pub(crate) fn account(row: &SqliteRow) -> Result<Account, DbError> {
    Ok(Account {
        account_id: row.try_get("account_id")?,
        name: row.try_get("name")?,
        balance: decimal(row, "balance")?,
        remarks: row.try_get("remarks")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn fixture(row: &SqliteRow) -> Result<Match, DbError> {
    Ok(Match {
        match_id: row.try_get("match_id")?,
        team1: row.try_get("team1")?,
        team2: row.try_get("team2")?,
        match_date: row.try_get("match_date")?,
        match_time: row.try_get("match_time")?,
    })
}

pub(crate) fn bet(row: &SqliteRow) -> Result<Bet, DbError> {
    let status: String = row.try_get("status")?;
    Ok(Bet {
        bet_id: row.try_get("bet_id")?,
        match_id: row.try_get("match_id")?,
        match_label: row.try_get("match_label")?,
        team1_odds: decimal(row, "team1_odds")?,
        team2_odds: decimal(row, "team2_odds")?,
        betting_value: opt_decimal(row, "betting_value")?,
        total_amount: decimal(row, "total_amount")?,
        status: BetStatus::from_str(&status).map_err(|e| corrupt("status", e))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn allocation_detail(row: &SqliteRow) -> Result<AllocationDetail, DbError> {
    Ok(AllocationDetail {
        allocation: Allocation {
            bet_id: row.try_get("bet_id")?,
            account_id: row.try_get("account_id")?,
            team: team(row, "team_number")?,
            amount: decimal(row, "bet_amount")?,
            payout: opt_decimal(row, "payout")?,
        },
        account_name: row.try_get("account_name")?,
    })
}

pub(crate) fn bet_result(row: &SqliteRow) -> Result<BetResult, DbError> {
    let result_type: String = row.try_get("result_type")?;
    let winning_team: Option<i64> = row.try_get("winning_team")?;
    let details: String = row.try_get("cashout_details")?;
    let cashout_amounts: BTreeMap<i64, Decimal> = serde_json::from_str(&details)?;

    Ok(BetResult {
        result_id: row.try_get("result_id")?,
        bet_id: row.try_get("bet_id")?,
        result_type: ResultType::from_str(&result_type).map_err(|e| corrupt("result_type", e))?,
        winning_team: winning_team
            .map(Team::from_number)
            .transpose()
            .map_err(|e| corrupt("winning_team", e))?,
        total_payout: decimal(row, "total_payout")?,
        net_profit: decimal(row, "net_profit")?,
        cashout_amounts,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn settings(row: &SqliteRow) -> Result<Settings, DbError> {
    Ok(Settings {
        min_transfer: decimal(row, "min_transfer")?,
        default_betting_value: decimal(row, "default_betting_value")?,
        updated_at: row.try_get("updated_at")?,
    })
}
