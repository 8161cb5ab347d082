use crate::error::LedgerError;
use core_types::{payout_at, AccountId, BetDetails, CoreError, Outcome, Team};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

/// What a single allocation is paid when its bet is resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payout {
    pub account_id: AccountId,
    pub team: Team,
    pub stake: Decimal,
    pub payout: Decimal,
}

/// Computes the payout of every allocation in `details` under `outcome`.
///
/// - win: stake × the chosen side's odds for the winning side, zero for the other side
/// - loss: zero for everyone
/// - cashout: the entered amount per account, zero for accounts not listed
///
/// Pure function; the caller applies the credits.
pub fn compute_payouts(details: &BetDetails, outcome: &Outcome) -> Result<Vec<Payout>, LedgerError> {
    if let Outcome::Cashout { amounts } = outcome {
        validate_cashout(details, amounts)?;
    }

    details
        .allocations
        .iter()
        .map(|detail| {
            let allocation = &detail.allocation;
            let payout = match outcome {
                Outcome::Win { winning_team } if allocation.team == *winning_team => {
                    payout_at(allocation.amount, details.bet.odds_for(allocation.team))?
                }
                Outcome::Win { .. } | Outcome::Loss => Decimal::ZERO,
                Outcome::Cashout { amounts } => amounts
                    .get(&allocation.account_id)
                    .copied()
                    .unwrap_or(Decimal::ZERO),
            };
            Ok(Payout {
                account_id: allocation.account_id,
                team: allocation.team,
                stake: allocation.amount,
                payout,
            })
        })
        .collect()
}

fn validate_cashout(
    details: &BetDetails,
    amounts: &std::collections::BTreeMap<AccountId, Decimal>,
) -> Result<(), LedgerError> {
    let participants: HashSet<AccountId> =
        details.allocations.iter().map(|a| a.allocation.account_id).collect();

    for (account_id, amount) in amounts {
        if !participants.contains(account_id) {
            return Err(CoreError::InvalidInput(
                "amounts".to_string(),
                format!("account {} is not part of bet {}", account_id, details.bet.bet_id),
            )
            .into());
        }
        if amount.is_sign_negative() {
            return Err(CoreError::InvalidInput(
                "amounts".to_string(),
                format!("cashout for account {} cannot be negative", account_id),
            )
            .into());
        }
        if amount.normalize().scale() > 2 {
            return Err(CoreError::InvalidInput(
                "amounts".to_string(),
                format!("cashout for account {} has more than 2 decimal places", account_id),
            )
            .into());
        }
    }
    Ok(())
}
