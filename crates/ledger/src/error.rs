use core_types::{AccountId, BetId, BetStatus, CoreError};
use database::DbError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One account that cannot cover the amount it was asked to pay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shortfall {
    pub account_id: AccountId,
    pub required: Decimal,
    pub available: Decimal,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account {}: Current: {:.2}, Required: {:.2}",
            self.account_id, self.available, self.required
        )
    }
}

fn describe(shortfalls: &[Shortfall]) -> String {
    shortfalls.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Insufficient balance in some accounts: {}", describe(.shortfalls))]
    InsufficientBalance { shortfalls: Vec<Shortfall> },

    #[error("Bet {bet_id} has already been resolved (status: {status})")]
    AlreadyResolved { bet_id: BetId, status: BetStatus },

    #[error("Bet {0} not found")]
    BetNotFound(BetId),

    #[error("Account {0} not found")]
    AccountNotFound(AccountId),

    #[error("Transfer amount {amount} is below the minimum transfer of {minimum}")]
    BelowMinimumTransfer { amount: Decimal, minimum: Decimal },

    #[error("{0}")]
    Validation(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}
