use crate::enums::Team;
use crate::error::CoreError;
use crate::stake::add_money;
use crate::{AccountId, MatchId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MIN_ODDS: Decimal = dec!(1.00);
pub const MAX_ODDS: Decimal = dec!(100.00);

/// A fixture that does not exist yet and is created together with the bet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
    pub team1: String,
    pub team2: String,
    pub match_date: NaiveDate,
    pub match_time: String,
}

/// The match a new bet is placed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureRef {
    Existing(MatchId),
    New(NewMatch),
}

/// One account's stake in a bet that is about to be placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub account_id: AccountId,
    pub team: Team,
    pub amount: Decimal,
}

/// Everything the ledger needs to place a bet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceBetRequest {
    pub fixture: FixtureRef,
    pub team1_odds: Decimal,
    pub team2_odds: Decimal,
    #[serde(default)]
    pub betting_value: Option<Decimal>,
    pub allocations: Vec<AllocationRequest>,
}

impl PlaceBetRequest {
    /// The bet's total amount: the sum of every allocation stake.
    pub fn total_amount(&self) -> Result<Decimal, CoreError> {
        self.allocations
            .iter()
            .try_fold(Decimal::ZERO, |total, a| add_money(total, a.amount))
    }

    /// Checks the request for missing or nonsensical fields. Balances are not
    /// checked here; that needs the database.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let FixtureRef::New(fixture) = &self.fixture {
            fixture.validate()?;
        }
        validate_odds("team1_odds", self.team1_odds)?;
        validate_odds("team2_odds", self.team2_odds)?;

        if let Some(value) = self.betting_value {
            if value <= Decimal::ZERO {
                return Err(invalid("betting_value", "must be greater than zero"));
            }
        }

        if self.allocations.is_empty() {
            return Err(invalid("allocations", "select at least one account"));
        }

        let mut seen = HashSet::new();
        for allocation in &self.allocations {
            if allocation.amount <= Decimal::ZERO {
                return Err(invalid(
                    "amount",
                    &format!("stake for account {} must be greater than zero", allocation.account_id),
                ));
            }
            if allocation.amount.normalize().scale() > 2 {
                return Err(invalid(
                    "amount",
                    &format!("stake for account {} has more than 2 decimal places", allocation.account_id),
                ));
            }
            if !seen.insert(allocation.account_id) {
                return Err(invalid(
                    "allocations",
                    &format!("account {} is selected more than once", allocation.account_id),
                ));
            }
        }
        self.total_amount()?;
        Ok(())
    }
}

impl NewMatch {
    pub fn validate(&self) -> Result<(), CoreError> {
        let team1 = self.team1.trim();
        let team2 = self.team2.trim();
        if team1.is_empty() {
            return Err(invalid("team1", "team name is required"));
        }
        if team2.is_empty() {
            return Err(invalid("team2", "team name is required"));
        }
        if team1.eq_ignore_ascii_case(team2) {
            return Err(invalid("team2", "a team cannot play itself"));
        }
        if self.match_time.trim().is_empty() {
            return Err(invalid("match_time", "match time is required"));
        }
        Ok(())
    }
}

fn validate_odds(field: &str, odds: Decimal) -> Result<(), CoreError> {
    if odds < MIN_ODDS || odds > MAX_ODDS {
        return Err(invalid(
            field,
            &format!("odds must be between {} and {}, got {}", MIN_ODDS, MAX_ODDS, odds),
        ));
    }
    Ok(())
}

fn invalid(field: &str, message: &str) -> CoreError {
    CoreError::InvalidInput(field.to_string(), message.to_string())
}
