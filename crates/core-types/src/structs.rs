use crate::enums::{BetStatus, ResultType, Team};
use crate::{AccountId, BetId, MatchId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user-defined betting account and its current balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub name: String,
    pub balance: Decimal,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fixture between two teams that bets are placed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub match_id: MatchId,
    pub team1: String,
    pub team2: String,
    pub match_date: NaiveDate,
    pub match_time: String,
}

impl Match {
    /// Human-readable label, e.g. "Mumbai Indians vs Delhi Capitals".
    pub fn label(&self) -> String {
        format!("{} vs {}", self.team1, self.team2)
    }

    pub fn team_name(&self, team: Team) -> &str {
        match team {
            Team::Team1 => &self.team1,
            Team::Team2 => &self.team2,
        }
    }
}

/// A bet on one match, shared by one or more accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub bet_id: BetId,
    pub match_id: MatchId,
    pub match_label: String,
    pub team1_odds: Decimal,
    pub team2_odds: Decimal,
    /// Target return the stakes were sized against, when the hedge calculator was used.
    pub betting_value: Option<Decimal>,
    /// Always equal to the sum of the bet's allocation stakes.
    pub total_amount: Decimal,
    pub status: BetStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bet {
    pub fn odds_for(&self, team: Team) -> Decimal {
        match team {
            Team::Team1 => self.team1_odds,
            Team::Team2 => self.team2_odds,
        }
    }
}

/// One account's participation in a bet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub bet_id: BetId,
    pub account_id: AccountId,
    pub team: Team,
    pub amount: Decimal,
    /// `None` until the bet is resolved.
    pub payout: Option<Decimal>,
}

/// An allocation joined with the owning account's name, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDetail {
    #[serde(flatten)]
    pub allocation: Allocation,
    pub account_name: String,
}

/// Everything needed to render or settle a single bet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetDetails {
    pub bet: Bet,
    pub fixture: Match,
    pub allocations: Vec<AllocationDetail>,
}

impl BetDetails {
    pub fn total_staked(&self) -> Decimal {
        self.allocations.iter().map(|a| a.allocation.amount).sum()
    }

    pub fn allocations_on(&self, team: Team) -> impl Iterator<Item = &AllocationDetail> {
        self.allocations.iter().filter(move |a| a.allocation.team == team)
    }
}

/// The settlement record written when a bet leaves the active state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetResult {
    pub result_id: i64,
    pub bet_id: BetId,
    pub result_type: ResultType,
    pub winning_team: Option<Team>,
    pub total_payout: Decimal,
    /// Total payout minus total stake. Negative for a losing bet.
    pub net_profit: Decimal,
    /// Per-account amounts for cashouts; empty otherwise.
    pub cashout_amounts: BTreeMap<AccountId, Decimal>,
    pub created_at: DateTime<Utc>,
}

/// A resolved bet with its result, as shown in the bet history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub details: BetDetails,
    pub result: Option<BetResult>,
}

/// User-tunable application settings (a single row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Smallest amount that may be moved between two accounts.
    pub min_transfer: Decimal,
    /// Betting value pre-filled in the hedge calculator.
    pub default_betting_value: Decimal,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_transfer: dec!(250.00),
            default_betting_value: dec!(2100.00),
            updated_at: None,
        }
    }
}
