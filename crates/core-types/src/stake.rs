use crate::enums::Team;
use crate::error::CoreError;
use crate::requests::{AllocationRequest, FixtureRef, PlaceBetRequest};
use crate::AccountId;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Rounds a money amount to cents, midpoint away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `a + b`, or a calculation error if the sum leaves `Decimal`'s range.
pub fn add_money(a: Decimal, b: Decimal) -> Result<Decimal, CoreError> {
    a.checked_add(b)
        .ok_or_else(|| CoreError::Calculation(format!("{} + {} overflows", a, b)))
}

pub fn sub_money(a: Decimal, b: Decimal) -> Result<Decimal, CoreError> {
    a.checked_sub(b)
        .ok_or_else(|| CoreError::Calculation(format!("{} - {} overflows", a, b)))
}

/// `stake × odds` rounded to cents.
pub fn payout_at(stake: Decimal, odds: Decimal) -> Result<Decimal, CoreError> {
    stake
        .checked_mul(odds)
        .map(round_money)
        .ok_or_else(|| CoreError::Calculation(format!("{} × {} overflows", stake, odds)))
}

/// Stake required on one side so that a win returns `betting_value`.
///
/// The exact figure is `betting_value / odds`. Unless `accurate` is set the
/// stake is rounded up to a whole unit, which is how the amount is usually
/// keyed into a bookmaker.
pub fn calculate_bet_amount(
    betting_value: Decimal,
    odds: Decimal,
    accurate: bool,
) -> Result<Decimal, CoreError> {
    if odds <= Decimal::ZERO {
        return Err(CoreError::Calculation(format!("odds must be positive, got {}", odds)));
    }
    let amount = betting_value
        .checked_div(odds)
        .ok_or_else(|| CoreError::Calculation("stake overflowed".to_string()))?;
    Ok(if accurate { round_money(amount) } else { amount.ceil() })
}

/// A two-sided placement where equally sized groups of accounts back each team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeSlip {
    pub fixture: FixtureRef,
    pub team1_odds: Decimal,
    pub team2_odds: Decimal,
    pub betting_value: Decimal,
    pub team1_accounts: Vec<AccountId>,
    pub team2_accounts: Vec<AccountId>,
    /// Use exact (cent-rounded) stakes instead of whole units.
    #[serde(default)]
    pub accurate: bool,
}

impl HedgeSlip {
    /// Sizes both sides and turns the slip into a regular placement request.
    pub fn into_request(self) -> Result<PlaceBetRequest, CoreError> {
        match (self.team1_accounts.is_empty(), self.team2_accounts.is_empty()) {
            (true, true) => return Err(invalid("Please select accounts for both teams.")),
            (true, false) => return Err(invalid("Please select accounts for Team 1.")),
            (false, true) => return Err(invalid("Please select accounts for Team 2.")),
            (false, false) => {}
        }
        if self.team1_accounts.len() != self.team2_accounts.len() {
            return Err(invalid(&format!(
                "Unequal number of accounts selected: Team 1 ({}) vs Team 2 ({})",
                self.team1_accounts.len(),
                self.team2_accounts.len()
            )));
        }
        let team1: HashSet<_> = self.team1_accounts.iter().collect();
        if let Some(clash) = self.team2_accounts.iter().find(|id| team1.contains(id)) {
            return Err(invalid(&format!("Account {} cannot back both teams.", clash)));
        }

        let stake1 = calculate_bet_amount(self.betting_value, self.team1_odds, self.accurate)?;
        let stake2 = calculate_bet_amount(self.betting_value, self.team2_odds, self.accurate)?;

        let allocations = self
            .team1_accounts
            .iter()
            .map(|&account_id| AllocationRequest { account_id, team: Team::Team1, amount: stake1 })
            .chain(
                self.team2_accounts
                    .iter()
                    .map(|&account_id| AllocationRequest { account_id, team: Team::Team2, amount: stake2 }),
            )
            .collect();

        Ok(PlaceBetRequest {
            fixture: self.fixture,
            team1_odds: self.team1_odds,
            team2_odds: self.team2_odds,
            betting_value: Some(self.betting_value),
            allocations,
        })
    }
}

fn invalid(message: &str) -> CoreError {
    CoreError::InvalidInput("accounts".to_string(), message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::NewMatch;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn slip(team1_accounts: Vec<AccountId>, team2_accounts: Vec<AccountId>) -> HedgeSlip {
        HedgeSlip {
            fixture: FixtureRef::New(NewMatch {
                team1: "Gujarat Titans".to_string(),
                team2: "Rajasthan Royals".to_string(),
                match_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                match_time: "3:30 PM".to_string(),
            }),
            team1_odds: dec!(1.90),
            team2_odds: dec!(2.10),
            betting_value: dec!(2100),
            team1_accounts,
            team2_accounts,
            accurate: false,
        }
    }

    #[test]
    fn rounds_up_unless_accurate() {
        assert_eq!(calculate_bet_amount(dec!(2100), dec!(1.9), false).unwrap(), dec!(1106));
        assert_eq!(calculate_bet_amount(dec!(2100), dec!(1.9), true).unwrap(), dec!(1105.26));
        assert_eq!(calculate_bet_amount(dec!(2100), dec!(2.0), false).unwrap(), dec!(1050));
        assert!(calculate_bet_amount(dec!(2100), Decimal::ZERO, false).is_err());
    }

    #[test]
    fn money_helpers_report_overflow_instead_of_panicking() {
        assert_eq!(add_money(dec!(10.25), dec!(0.75)).unwrap(), dec!(11));
        assert_eq!(payout_at(dec!(100.05), dec!(1.333)).unwrap(), dec!(133.37));
        assert!(matches!(add_money(Decimal::MAX, dec!(1)), Err(CoreError::Calculation(_))));
        assert!(matches!(sub_money(Decimal::MIN, dec!(1)), Err(CoreError::Calculation(_))));
        assert!(matches!(payout_at(Decimal::MAX, dec!(100)), Err(CoreError::Calculation(_))));
    }

    #[test]
    fn hedge_slip_sizes_each_side() {
        let request = slip(vec![1, 2], vec![3, 4]).into_request().unwrap();
        assert_eq!(request.allocations.len(), 4);
        assert_eq!(request.allocations[0].amount, dec!(1106));
        assert_eq!(request.allocations[2].team, Team::Team2);
        assert_eq!(request.allocations[2].amount, dec!(1000));
        assert_eq!(request.total_amount().unwrap(), dec!(4212));
        assert_eq!(request.betting_value, Some(dec!(2100)));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn hedge_slip_rejects_unbalanced_or_overlapping_sides() {
        assert!(slip(vec![], vec![]).into_request().is_err());
        assert!(slip(vec![1], vec![]).into_request().is_err());
        assert!(slip(vec![1, 2], vec![3]).into_request().is_err());
        assert!(slip(vec![1, 2], vec![2, 3]).into_request().is_err());
    }
}
