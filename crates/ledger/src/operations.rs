use crate::error::{LedgerError, Shortfall};
use crate::payout::{compute_payouts, Payout};
use core_types::{
    add_money, sub_money, Account, AccountId, BetDetails, BetId, BetResult, CoreError,
    FixtureRef, Outcome, PlaceBetRequest, Team,
};
use database::{queries, DbError, DbRepository, SqliteConnection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One allocation after its bet has been resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettledAllocation {
    pub account_id: AccountId,
    pub account_name: String,
    pub team: Team,
    pub stake: Decimal,
    pub payout: Decimal,
    pub balance_after: Decimal,
}

/// The outcome of `resolve_bet`: the stored result plus what each account received.
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub result: BetResult,
    pub allocations: Vec<SettledAllocation>,
}

/// Every operation that moves money between accounts and bets.
///
/// Each method runs in a single transaction. An error at any point drops the
/// transaction, so either every balance change of the operation is committed
/// or none is.
#[derive(Debug, Clone)]
pub struct Ledger {
    repo: DbRepository,
}

impl Ledger {
    pub fn new(repo: DbRepository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &DbRepository {
        &self.repo
    }

    // --------------------------------------------------------------------------
    // Accounts
    // --------------------------------------------------------------------------

    /// Creates an account with an opening balance (which may be zero).
    pub async fn open_account(
        &self,
        name: &str,
        opening_balance: Decimal,
        remarks: &str,
    ) -> Result<Account, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("name", "account name is required"));
        }
        if opening_balance.is_sign_negative() {
            return Err(invalid("balance", "opening balance cannot be negative"));
        }
        check_cents("balance", opening_balance)?;

        let mut tx = self.repo.begin().await?;
        let account = queries::insert_account(&mut tx, name, opening_balance, remarks.trim()).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(account_id = account.account_id, name = %account.name, balance = %account.balance, "Account opened");
        Ok(account)
    }

    pub async fn deposit(&self, account_id: AccountId, amount: Decimal) -> Result<Account, LedgerError> {
        check_amount(amount)?;

        let mut tx = self.repo.begin().await?;
        let account = load_account(&mut tx, account_id).await?;
        let updated = apply_balance(&mut tx, &account, add_money(account.balance, amount)?).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(account_id, %amount, balance = %updated.balance, "Deposit recorded");
        Ok(updated)
    }

    pub async fn withdraw(&self, account_id: AccountId, amount: Decimal) -> Result<Account, LedgerError> {
        check_amount(amount)?;

        let mut tx = self.repo.begin().await?;
        let account = load_account(&mut tx, account_id).await?;
        if account.balance < amount {
            warn!(account_id, %amount, balance = %account.balance, "Withdrawal rejected");
            return Err(LedgerError::InsufficientBalance {
                shortfalls: vec![Shortfall { account_id, required: amount, available: account.balance }],
            });
        }
        let updated = apply_balance(&mut tx, &account, sub_money(account.balance, amount)?).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(account_id, %amount, balance = %updated.balance, "Withdrawal recorded");
        Ok(updated)
    }

    /// Moves `amount` from one account to another. The amount must reach the
    /// `min_transfer` setting. Returns both accounts after the move.
    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<(Account, Account), LedgerError> {
        check_amount(amount)?;
        if from == to {
            return Err(invalid("to_account", "cannot transfer to the same account"));
        }
        let minimum = self.repo.get_settings().await?.min_transfer;
        if amount < minimum {
            warn!(from, to, %amount, %minimum, "Transfer below minimum rejected");
            return Err(LedgerError::BelowMinimumTransfer { amount, minimum });
        }

        let mut tx = self.repo.begin().await?;
        let source = load_account(&mut tx, from).await?;
        let target = load_account(&mut tx, to).await?;
        if source.balance < amount {
            warn!(from, to, %amount, balance = %source.balance, "Transfer rejected");
            return Err(LedgerError::InsufficientBalance {
                shortfalls: vec![Shortfall { account_id: from, required: amount, available: source.balance }],
            });
        }
        let source = apply_balance(&mut tx, &source, sub_money(source.balance, amount)?).await?;
        let target = apply_balance(&mut tx, &target, add_money(target.balance, amount)?).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(from, to, %amount, "Transfer completed");
        Ok((source, target))
    }

    // --------------------------------------------------------------------------
    // Bets
    // --------------------------------------------------------------------------

    /// Places a bet, debiting every participating account by its stake.
    ///
    /// All balances are checked before anything is written; if any account is
    /// short the whole placement is rejected with every shortfall listed.
    pub async fn place_bet(&self, request: &PlaceBetRequest) -> Result<BetDetails, LedgerError> {
        request.validate()?;

        let mut tx = self.repo.begin().await?;

        let mut accounts = Vec::with_capacity(request.allocations.len());
        let mut shortfalls = Vec::new();
        for allocation in &request.allocations {
            let account = load_account(&mut tx, allocation.account_id).await?;
            if account.balance < allocation.amount {
                shortfalls.push(Shortfall {
                    account_id: account.account_id,
                    required: allocation.amount,
                    available: account.balance,
                });
            }
            accounts.push((account, allocation.amount));
        }
        if !shortfalls.is_empty() {
            warn!(short_accounts = shortfalls.len(), "Bet placement rejected for insufficient balance");
            return Err(LedgerError::InsufficientBalance { shortfalls });
        }

        for (account, stake) in &accounts {
            apply_balance(&mut tx, account, sub_money(account.balance, *stake)?).await?;
        }

        let fixture = match &request.fixture {
            FixtureRef::Existing(match_id) => queries::fetch_match(&mut tx, *match_id)
                .await?
                .ok_or_else(|| invalid("match_id", &format!("match {} does not exist", match_id)))?,
            FixtureRef::New(new_match) => queries::insert_match(&mut tx, new_match).await?,
        };

        let total_amount = request.total_amount()?;
        let bet_id = queries::insert_bet(
            &mut tx,
            fixture.match_id,
            request.team1_odds,
            request.team2_odds,
            request.betting_value,
            total_amount,
        )
        .await?;
        for allocation in &request.allocations {
            queries::insert_allocation(&mut tx, bet_id, allocation).await?;
        }

        let details = queries::fetch_bet_details(&mut tx, bet_id)
            .await?
            .ok_or(LedgerError::BetNotFound(bet_id))?;
        debug_assert_eq!(details.total_staked(), details.bet.total_amount);
        tx.commit().await.map_err(DbError::from)?;

        info!(
            bet_id,
            fixture = %details.bet.match_label,
            accounts = details.allocations.len(),
            total = %total_amount,
            "Bet placed"
        );
        Ok(details)
    }

    /// Settles an active bet, credits every participating account with its
    /// payout and records the result.
    pub async fn resolve_bet(&self, bet_id: BetId, outcome: &Outcome) -> Result<Settlement, LedgerError> {
        let mut tx = self.repo.begin().await?;

        let details = queries::fetch_bet_details(&mut tx, bet_id)
            .await?
            .ok_or(LedgerError::BetNotFound(bet_id))?;
        if details.bet.status.is_terminal() {
            warn!(bet_id, status = %details.bet.status, "Bet already resolved");
            return Err(LedgerError::AlreadyResolved { bet_id, status: details.bet.status });
        }

        let payouts = compute_payouts(&details, outcome)?;

        let status = outcome.terminal_status();
        if !queries::mark_bet_resolved(&mut tx, bet_id, status).await? {
            let current = queries::fetch_bet(&mut tx, bet_id)
                .await?
                .map(|bet| bet.status)
                .unwrap_or(status);
            return Err(LedgerError::AlreadyResolved { bet_id, status: current });
        }

        let mut settled = Vec::with_capacity(payouts.len());
        for (payout, detail) in payouts.iter().zip(&details.allocations) {
            let account = credit(&mut tx, payout).await?;
            queries::set_allocation_payout(&mut tx, bet_id, payout.account_id, payout.payout).await?;
            settled.push(SettledAllocation {
                account_id: payout.account_id,
                account_name: detail.account_name.clone(),
                team: payout.team,
                stake: payout.stake,
                payout: payout.payout,
                balance_after: account.balance,
            });
        }

        let total_payout = payouts
            .iter()
            .try_fold(Decimal::ZERO, |total, p| add_money(total, p.payout))?;
        let net_profit = sub_money(total_payout, details.bet.total_amount)?;
        let empty = BTreeMap::new();
        let cashout_amounts = match outcome {
            Outcome::Cashout { amounts } => amounts,
            _ => &empty,
        };
        let result = queries::insert_result(
            &mut tx,
            &queries::NewResult {
                bet_id,
                result_type: outcome.result_type(),
                winning_team: outcome.winning_team(),
                total_payout,
                net_profit,
                cashout_amounts,
            },
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(bet_id, %status, %total_payout, %net_profit, "Bet resolved");
        Ok(Settlement { result, allocations: settled })
    }
}

async fn load_account(conn: &mut SqliteConnection, account_id: AccountId) -> Result<Account, LedgerError> {
    queries::fetch_account(conn, account_id)
        .await?
        .ok_or(LedgerError::AccountNotFound(account_id))
}

async fn apply_balance(
    conn: &mut SqliteConnection,
    account: &Account,
    balance: Decimal,
) -> Result<Account, LedgerError> {
    if balance.is_sign_negative() {
        return Err(LedgerError::InsufficientBalance {
            shortfalls: vec![Shortfall {
                account_id: account.account_id,
                required: sub_money(account.balance, balance)?,
                available: account.balance,
            }],
        });
    }
    queries::set_account_balance(conn, account.account_id, balance).await?;
    Ok(Account { balance, ..account.clone() })
}

async fn credit(conn: &mut SqliteConnection, payout: &Payout) -> Result<Account, LedgerError> {
    let account = load_account(conn, payout.account_id).await?;
    if payout.payout.is_zero() {
        return Ok(account);
    }
    apply_balance(conn, &account, add_money(account.balance, payout.payout)?).await
}

fn check_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(invalid("amount", "amount must be greater than zero"));
    }
    check_cents("amount", amount)
}

fn check_cents(field: &str, amount: Decimal) -> Result<(), LedgerError> {
    if amount.normalize().scale() > 2 {
        return Err(invalid(field, "amount has more than 2 decimal places"));
    }
    Ok(())
}

fn invalid(field: &str, message: &str) -> LedgerError {
    CoreError::InvalidInput(field.to_string(), message.to_string()).into()
}
