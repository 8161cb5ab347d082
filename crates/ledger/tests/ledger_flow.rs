use chrono::NaiveDate;
use core_types::{
    AllocationRequest, BetStatus, CoreError, FixtureRef, HedgeSlip, NewMatch, Outcome,
    PlaceBetRequest, ResultType, Settings, Team,
};
use database::{connect_in_memory, init_schema, DbRepository};
use ledger::{Ledger, LedgerError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

async fn ledger() -> Ledger {
    let pool = connect_in_memory().await.unwrap();
    init_schema(&pool, &Settings::default()).await.unwrap();
    Ledger::new(DbRepository::new(pool))
}

fn fixture() -> FixtureRef {
    FixtureRef::New(NewMatch {
        team1: "Mumbai Indians".to_string(),
        team2: "Chennai Super Kings".to_string(),
        match_date: NaiveDate::from_ymd_opt(2025, 4, 13).unwrap(),
        match_time: "3:30 PM".to_string(),
    })
}

fn single_stake(account_id: i64, team: Team, amount: Decimal) -> PlaceBetRequest {
    PlaceBetRequest {
        fixture: fixture(),
        team1_odds: dec!(2.0),
        team2_odds: dec!(1.8),
        betting_value: None,
        allocations: vec![AllocationRequest { account_id, team, amount }],
    }
}

async fn balance(ledger: &Ledger, account_id: i64) -> Decimal {
    ledger.repository().get_account(account_id).await.unwrap().balance
}

#[tokio::test]
async fn winning_bet_pays_stake_times_odds() {
    let ledger = ledger().await;
    let a = ledger.open_account("Account A", dec!(1000), "").await.unwrap();

    let details = ledger.place_bet(&single_stake(a.account_id, Team::Team1, dec!(200))).await.unwrap();
    assert_eq!(balance(&ledger, a.account_id).await, dec!(800));
    assert_eq!(details.bet.status, BetStatus::Active);

    let settlement = ledger
        .resolve_bet(details.bet.bet_id, &Outcome::Win { winning_team: Team::Team1 })
        .await
        .unwrap();
    assert_eq!(settlement.allocations[0].payout, dec!(400));
    assert_eq!(settlement.allocations[0].balance_after, dec!(1200));
    assert_eq!(settlement.result.total_payout, dec!(400));
    assert_eq!(settlement.result.net_profit, dec!(200));
    assert_eq!(balance(&ledger, a.account_id).await, dec!(1200));

    let stored = ledger.repository().get_bet_details(details.bet.bet_id).await.unwrap();
    assert_eq!(stored.bet.status, BetStatus::Won);
    assert_eq!(stored.allocations[0].allocation.payout, Some(dec!(400)));
}

#[tokio::test]
async fn losing_bet_keeps_the_stake() {
    let ledger = ledger().await;
    let a = ledger.open_account("Account A", dec!(1000), "").await.unwrap();
    let details = ledger.place_bet(&single_stake(a.account_id, Team::Team1, dec!(200))).await.unwrap();

    let settlement = ledger.resolve_bet(details.bet.bet_id, &Outcome::Loss).await.unwrap();
    assert_eq!(settlement.result.result_type, ResultType::Loss);
    assert_eq!(settlement.result.net_profit, dec!(-200));
    assert_eq!(balance(&ledger, a.account_id).await, dec!(800));

    let history = ledger.repository().get_bet_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].details.bet.status, BetStatus::Lost);
}

#[tokio::test]
async fn resolving_twice_is_rejected_and_balances_do_not_move() {
    let ledger = ledger().await;
    let a = ledger.open_account("Account A", dec!(1000), "").await.unwrap();
    let details = ledger.place_bet(&single_stake(a.account_id, Team::Team1, dec!(200))).await.unwrap();
    let bet_id = details.bet.bet_id;

    ledger.resolve_bet(bet_id, &Outcome::Win { winning_team: Team::Team1 }).await.unwrap();
    let after_first = balance(&ledger, a.account_id).await;

    let second = ledger.resolve_bet(bet_id, &Outcome::Win { winning_team: Team::Team1 }).await;
    assert!(matches!(
        second,
        Err(LedgerError::AlreadyResolved { status: BetStatus::Won, .. })
    ));
    let third = ledger.resolve_bet(bet_id, &Outcome::Loss).await;
    assert!(matches!(third, Err(LedgerError::AlreadyResolved { .. })));

    assert_eq!(balance(&ledger, a.account_id).await, after_first);
}

#[tokio::test]
async fn failed_placement_debits_nobody() {
    let ledger = ledger().await;
    let rich = ledger.open_account("Rich", dec!(5000), "").await.unwrap();
    let poor = ledger.open_account("Poor", dec!(100), "").await.unwrap();

    let request = PlaceBetRequest {
        fixture: fixture(),
        team1_odds: dec!(1.9),
        team2_odds: dec!(1.9),
        betting_value: None,
        allocations: vec![
            AllocationRequest { account_id: rich.account_id, team: Team::Team1, amount: dec!(1000) },
            AllocationRequest { account_id: poor.account_id, team: Team::Team2, amount: dec!(1000) },
        ],
    };

    let err = ledger.place_bet(&request).await.unwrap_err();
    match &err {
        LedgerError::InsufficientBalance { shortfalls } => {
            assert_eq!(shortfalls.len(), 1);
            assert_eq!(shortfalls[0].account_id, poor.account_id);
            assert_eq!(shortfalls[0].available, dec!(100));
            assert_eq!(shortfalls[0].required, dec!(1000));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("Current: 100.00, Required: 1000.00"));

    assert_eq!(balance(&ledger, rich.account_id).await, dec!(5000));
    assert_eq!(balance(&ledger, poor.account_id).await, dec!(100));
    assert!(ledger.repository().list_active_bets().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_ids_are_reported() {
    let ledger = ledger().await;

    let err = ledger.place_bet(&single_stake(42, Team::Team1, dec!(10))).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(42)));

    let err = ledger.resolve_bet(42, &Outcome::Loss).await.unwrap_err();
    assert!(matches!(err, LedgerError::BetNotFound(42)));

    let err = ledger.deposit(42, dec!(10)).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(42)));
}

#[tokio::test]
async fn hedge_slip_stakes_sum_to_bet_total() {
    let ledger = ledger().await;
    let mut team1 = Vec::new();
    let mut team2 = Vec::new();
    for i in 0..2 {
        team1.push(ledger.open_account(&format!("T1-{i}"), dec!(5000), "").await.unwrap().account_id);
        team2.push(ledger.open_account(&format!("T2-{i}"), dec!(5000), "").await.unwrap().account_id);
    }

    let slip = HedgeSlip {
        fixture: fixture(),
        team1_odds: dec!(1.9),
        team2_odds: dec!(2.1),
        betting_value: dec!(2100),
        team1_accounts: team1.clone(),
        team2_accounts: team2.clone(),
        accurate: false,
    };
    let details = ledger.place_bet(&slip.into_request().unwrap()).await.unwrap();

    assert_eq!(details.allocations.len(), 4);
    assert_eq!(details.total_staked(), details.bet.total_amount);
    assert_eq!(details.bet.total_amount, dec!(1106) * dec!(2) + dec!(1000) * dec!(2));
    assert_eq!(details.bet.betting_value, Some(dec!(2100)));
    assert_eq!(balance(&ledger, team1[0]).await, dec!(3894));
    assert_eq!(balance(&ledger, team2[1]).await, dec!(4000));
}

#[tokio::test]
async fn cashout_credits_the_entered_amounts() {
    let ledger = ledger().await;
    let a = ledger.open_account("A", dec!(1000), "").await.unwrap();
    let b = ledger.open_account("B", dec!(1000), "").await.unwrap();
    let request = PlaceBetRequest {
        fixture: fixture(),
        team1_odds: dec!(2.0),
        team2_odds: dec!(2.0),
        betting_value: None,
        allocations: vec![
            AllocationRequest { account_id: a.account_id, team: Team::Team1, amount: dec!(300) },
            AllocationRequest { account_id: b.account_id, team: Team::Team2, amount: dec!(300) },
        ],
    };
    let details = ledger.place_bet(&request).await.unwrap();

    let amounts = BTreeMap::from([(a.account_id, dec!(450.75))]);
    let settlement = ledger
        .resolve_bet(details.bet.bet_id, &Outcome::Cashout { amounts: amounts.clone() })
        .await
        .unwrap();

    assert_eq!(settlement.result.result_type, ResultType::Cashout);
    assert_eq!(settlement.result.cashout_amounts, amounts);
    assert_eq!(settlement.result.total_payout, dec!(450.75));
    assert_eq!(settlement.result.net_profit, dec!(-149.25));
    assert_eq!(balance(&ledger, a.account_id).await, dec!(1150.75));
    assert_eq!(balance(&ledger, b.account_id).await, dec!(700));

    let stored = ledger.repository().get_bet_details(details.bet.bet_id).await.unwrap();
    assert_eq!(stored.bet.status, BetStatus::CashedOut);
}

#[tokio::test]
async fn invalid_cashout_leaves_the_bet_active() {
    let ledger = ledger().await;
    let a = ledger.open_account("A", dec!(1000), "").await.unwrap();
    let details = ledger.place_bet(&single_stake(a.account_id, Team::Team2, dec!(100))).await.unwrap();

    let amounts = BTreeMap::from([(a.account_id + 1, dec!(50))]);
    let err = ledger
        .resolve_bet(details.bet.bet_id, &Outcome::Cashout { amounts })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let active = ledger.repository().list_active_bets().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(balance(&ledger, a.account_id).await, dec!(900));
}

#[tokio::test]
async fn deposit_beyond_decimal_range_is_rejected() {
    let ledger = ledger().await;
    let huge = Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0);
    let a = ledger.open_account("A", huge, "").await.unwrap();

    let err = ledger.deposit(a.account_id, huge).await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(CoreError::Calculation(_))));
    assert_eq!(balance(&ledger, a.account_id).await, huge);
}

#[tokio::test]
async fn win_payout_beyond_decimal_range_leaves_the_bet_active() {
    let ledger = ledger().await;
    let huge = Decimal::from_i128_with_scale(10_i128.pow(28), 0);
    let a = ledger.open_account("A", huge, "").await.unwrap();

    let mut request = single_stake(a.account_id, Team::Team1, huge);
    request.team1_odds = dec!(100);
    let details = ledger.place_bet(&request).await.unwrap();
    assert_eq!(balance(&ledger, a.account_id).await, Decimal::ZERO);

    let err = ledger
        .resolve_bet(details.bet.bet_id, &Outcome::Win { winning_team: Team::Team1 })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(ledger.repository().list_active_bets().await.unwrap().len(), 1);
    assert_eq!(balance(&ledger, a.account_id).await, Decimal::ZERO);

    let settlement = ledger.resolve_bet(details.bet.bet_id, &Outcome::Loss).await.unwrap();
    assert_eq!(settlement.result.net_profit, -huge);
}

#[tokio::test]
async fn bets_can_reuse_an_existing_match() {
    let ledger = ledger().await;
    let a = ledger.open_account("A", dec!(1000), "").await.unwrap();
    let first = ledger.place_bet(&single_stake(a.account_id, Team::Team1, dec!(100))).await.unwrap();

    let mut again = single_stake(a.account_id, Team::Team2, dec!(100));
    again.fixture = FixtureRef::Existing(first.fixture.match_id);
    let second = ledger.place_bet(&again).await.unwrap();
    assert_eq!(second.fixture, first.fixture);

    again.fixture = FixtureRef::Existing(999);
    assert!(matches!(ledger.place_bet(&again).await, Err(LedgerError::Validation(_))));
    assert_eq!(balance(&ledger, a.account_id).await, dec!(800));
}

#[tokio::test]
async fn deposits_withdrawals_and_transfers() {
    let ledger = ledger().await;
    let a = ledger.open_account("A", dec!(1000), "").await.unwrap();
    let b = ledger.open_account("B", dec!(0), "spare").await.unwrap();

    assert_eq!(ledger.deposit(a.account_id, dec!(250.50)).await.unwrap().balance, dec!(1250.50));
    assert_eq!(ledger.withdraw(a.account_id, dec!(50.50)).await.unwrap().balance, dec!(1200));

    let err = ledger.withdraw(b.account_id, dec!(1)).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

    let err = ledger.transfer(a.account_id, b.account_id, dec!(100)).await.unwrap_err();
    assert!(matches!(err, LedgerError::BelowMinimumTransfer { minimum, .. } if minimum == dec!(250)));

    let err = ledger.transfer(a.account_id, a.account_id, dec!(300)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let err = ledger.transfer(b.account_id, a.account_id, dec!(300)).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

    let (from, to) = ledger.transfer(a.account_id, b.account_id, dec!(300)).await.unwrap();
    assert_eq!(from.balance, dec!(900));
    assert_eq!(to.balance, dec!(300));

    assert!(matches!(ledger.deposit(a.account_id, dec!(0)).await, Err(LedgerError::Validation(_))));
    assert!(matches!(ledger.deposit(a.account_id, dec!(1.005)).await, Err(LedgerError::Validation(_))));
}

#[tokio::test]
async fn transfer_minimum_follows_saved_settings() {
    let ledger = ledger().await;
    let a = ledger.open_account("A", dec!(1000), "").await.unwrap();
    let b = ledger.open_account("B", dec!(0), "").await.unwrap();
    ledger
        .repository()
        .save_settings(&Settings { min_transfer: dec!(50), default_betting_value: dec!(2100), updated_at: None })
        .await
        .unwrap();

    let (_, to) = ledger.transfer(a.account_id, b.account_id, dec!(75)).await.unwrap();
    assert_eq!(to.balance, dec!(75));
}
