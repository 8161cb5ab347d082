use crate::{error::CoreError, AccountId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a bet. `Active` is the only non-terminal state and a bet
/// leaves it exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetStatus {
    Active,
    Won,
    Lost,
    CashedOut,
}

impl BetStatus {
    /// The value stored in the `bets.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Active => "active",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
            BetStatus::CashedOut => "cashed_out",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BetStatus::Active)
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BetStatus::Active),
            "won" => Ok(BetStatus::Won),
            "lost" => Ok(BetStatus::Lost),
            "cashed_out" => Ok(BetStatus::CashedOut),
            other => Err(CoreError::InvalidInput(
                "status".to_string(),
                format!("unknown bet status '{}'", other),
            )),
        }
    }
}

/// The side of a two-team fixture an allocation backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Team1,
    Team2,
}

impl Team {
    /// The value stored in the `team_number` columns (1 or 2).
    pub fn number(&self) -> i64 {
        match self {
            Team::Team1 => 1,
            Team::Team2 => 2,
        }
    }

    pub fn from_number(number: i64) -> Result<Self, CoreError> {
        match number {
            1 => Ok(Team::Team1),
            2 => Ok(Team::Team2),
            other => Err(CoreError::InvalidInput(
                "team".to_string(),
                format!("team number must be 1 or 2, got {}", other),
            )),
        }
    }
}

impl FromStr for Team {
    type Err = CoreError;

    /// Accepts `1`, `2`, `team1` and `team2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "team1" => Ok(Team::Team1),
            "2" | "team2" => Ok(Team::Team2),
            other => Err(CoreError::InvalidInput(
                "team".to_string(),
                format!("expected 1, 2, team1 or team2, got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team{}", self.number())
    }
}

/// The kind of result recorded in the `results` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Win,
    Loss,
    Cashout,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Win => "win",
            ResultType::Loss => "loss",
            ResultType::Cashout => "cashout",
        }
    }
}

impl FromStr for ResultType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(ResultType::Win),
            "loss" => Ok(ResultType::Loss),
            "cashout" => Ok(ResultType::Cashout),
            other => Err(CoreError::InvalidInput(
                "result_type".to_string(),
                format!("unknown result type '{}'", other),
            )),
        }
    }
}

/// How a bet is settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    /// Allocations on `winning_team` are paid stake × that team's odds; the rest get nothing.
    Win { winning_team: Team },
    /// Every allocation is paid nothing.
    Loss,
    /// Each listed account is paid the amount entered by the user. Unlisted
    /// participants are paid nothing.
    Cashout {
        #[serde(default, deserialize_with = "account_amounts")]
        amounts: BTreeMap<AccountId, Decimal>,
    },
}

// JSON object keys are strings, and an internally tagged enum cannot coerce
// them to integers on its own.
fn account_amounts<'de, D>(deserializer: D) -> Result<BTreeMap<AccountId, Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, Decimal>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, amount)| {
            key.trim()
                .parse::<AccountId>()
                .map(|id| (id, amount))
                .map_err(|_| serde::de::Error::custom(format!("'{}' is not an account id", key)))
        })
        .collect()
}

impl Outcome {
    /// The bet status this outcome moves a bet into.
    pub fn terminal_status(&self) -> BetStatus {
        match self {
            Outcome::Win { .. } => BetStatus::Won,
            Outcome::Loss => BetStatus::Lost,
            Outcome::Cashout { .. } => BetStatus::CashedOut,
        }
    }

    pub fn result_type(&self) -> ResultType {
        match self {
            Outcome::Win { .. } => ResultType::Win,
            Outcome::Loss => ResultType::Loss,
            Outcome::Cashout { .. } => ResultType::Cashout,
        }
    }

    pub fn winning_team(&self) -> Option<Team> {
        match self {
            Outcome::Win { winning_team } => Some(*winning_team),
            _ => None,
        }
    }
}
