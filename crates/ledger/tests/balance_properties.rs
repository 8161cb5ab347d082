//! Property-based tests for the balance invariants of the ledger.
//!
//! Each case replays a random sequence of placements and resolutions against
//! a fresh in-memory store.

use chrono::NaiveDate;
use core_types::{AllocationRequest, FixtureRef, NewMatch, Outcome, PlaceBetRequest, Settings, Team};
use database::{connect_in_memory, init_schema, DbRepository};
use ledger::{Ledger, LedgerError};
use proptest::prelude::*;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
struct Placement {
    stakes: Vec<(usize, bool, i64)>,
    odds_cents: i64,
    resolution: u8,
}

fn placement() -> impl Strategy<Value = Placement> {
    (
        prop::collection::vec((0usize..3, any::<bool>(), 1i64..150_000), 1..4),
        100i64..1_000,
        0u8..4,
    )
        .prop_map(|(stakes, odds_cents, resolution)| Placement { stakes, odds_cents, resolution })
}

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

fn request(accounts: &[i64], placement: &Placement) -> PlaceBetRequest {
    let mut allocations: Vec<AllocationRequest> = Vec::new();
    for &(idx, team1, amount) in &placement.stakes {
        let account_id = accounts[idx];
        if allocations.iter().any(|a| a.account_id == account_id) {
            continue;
        }
        allocations.push(AllocationRequest {
            account_id,
            team: if team1 { Team::Team1 } else { Team::Team2 },
            amount: cents(amount),
        });
    }
    PlaceBetRequest {
        fixture: FixtureRef::New(NewMatch {
            team1: "Rajasthan Royals".to_string(),
            team2: "Gujarat Titans".to_string(),
            match_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            match_time: "7:30 PM".to_string(),
        }),
        team1_odds: cents(placement.odds_cents),
        team2_odds: cents(placement.odds_cents),
        betting_value: None,
        allocations,
    }
}

async fn balances(ledger: &Ledger) -> Vec<Decimal> {
    ledger
        .repository()
        .list_accounts()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.balance)
        .collect()
}

async fn replay(opening: Vec<i64>, placements: Vec<Placement>) {
    let pool = connect_in_memory().await.unwrap();
    init_schema(&pool, &Settings::default()).await.unwrap();
    let ledger = Ledger::new(DbRepository::new(pool));

    let mut accounts = Vec::new();
    for (i, balance) in opening.into_iter().enumerate() {
        let account = ledger.open_account(&format!("Account {i}"), cents(balance), "").await.unwrap();
        accounts.push(account.account_id);
    }

    for p in &placements {
        let before = balances(&ledger).await;
        match ledger.place_bet(&request(&accounts, p)).await {
            Ok(details) => {
                assert_eq!(details.total_staked(), details.bet.total_amount);
                let outcome = match p.resolution {
                    0 => Some(Outcome::Win { winning_team: Team::Team1 }),
                    1 => Some(Outcome::Win { winning_team: Team::Team2 }),
                    2 => Some(Outcome::Loss),
                    _ => None,
                };
                if let Some(outcome) = outcome {
                    ledger.resolve_bet(details.bet.bet_id, &outcome).await.unwrap();
                }
            }
            Err(LedgerError::InsufficientBalance { .. }) => {
                assert_eq!(balances(&ledger).await, before, "failed placement moved money");
            }
            Err(other) => panic!("unexpected error: {other}"),
        }

        for balance in balances(&ledger).await {
            assert!(balance >= Decimal::ZERO, "negative balance {balance}");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// No sequence of placements and resolutions can drive a balance below zero.
    #[test]
    fn balances_never_go_negative(
        opening in prop::collection::vec(0i64..300_000, 3),
        placements in prop::collection::vec(placement(), 1..8),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(replay(opening, placements));
    }
}
