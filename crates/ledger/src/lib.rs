//! # Stakebook Ledger
//!
//! The only crate that changes account balances. It places bets against one
//! or more accounts, resolves them as a win, loss or cashout, and handles
//! deposits, withdrawals and transfers between accounts.
//!
//! Every operation runs inside one SQLite transaction obtained from the
//! [`database::DbRepository`]; balances are checked before any write, and an
//! error anywhere rolls the whole operation back.

pub mod error;
pub mod operations;
pub mod payout;

pub use error::{LedgerError, Shortfall};
pub use operations::{Ledger, SettledAllocation, Settlement};
pub use payout::{compute_payouts, Payout};
