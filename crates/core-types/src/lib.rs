//! # Stakebook Core Types
//!
//! The shared vocabulary of the betting ledger: accounts, matches, bets,
//! per-account allocations and their results. As the Layer 0 crate it performs
//! no I/O; every other crate in the workspace depends on it.

pub mod enums;
pub mod error;
pub mod requests;
pub mod stake;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{BetStatus, Outcome, ResultType, Team};
pub use error::CoreError;
pub use requests::{AllocationRequest, FixtureRef, NewMatch, PlaceBetRequest};
pub use stake::{add_money, calculate_bet_amount, payout_at, round_money, sub_money, HedgeSlip};
pub use structs::{
    Account, Allocation, AllocationDetail, Bet, BetDetails, BetResult, HistoryEntry, Match,
    Settings,
};

/// Primary key of the `accounts` table.
pub type AccountId = i64;
/// Primary key of the `bets` table.
pub type BetId = i64;
/// Primary key of the `matches` table.
pub type MatchId = i64;
