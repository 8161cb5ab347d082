use crate::{error::AppError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use core_types::{
    calculate_bet_amount, Account, AccountId, BetDetails, BetId, CoreError, HedgeSlip,
    HistoryEntry, Outcome, PlaceBetRequest, Settings,
};
use ledger::Settlement;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type ApiResult<T> = Result<Json<T>, AppError>;

// ------------------------------------------------------------------------------
// Accounts
// ------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateAccount {
    pub name: String,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccount {
    pub name: String,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Deserialize)]
pub struct AmountBody {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TransferBody {
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransferReceipt {
    pub from: Account,
    pub to: Account,
}

/// # GET /api/accounts
pub async fn list_accounts(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Account>> {
    Ok(Json(state.repo().list_accounts().await?))
}

/// # POST /api/accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAccount>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let account = state.ledger.open_account(&body.name, body.balance, &body.remarks).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// # GET /api/accounts/:id
pub async fn get_account(
    Path(id): Path<AccountId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Account> {
    Ok(Json(state.repo().get_account(id).await?))
}

/// # PATCH /api/accounts/:id
/// Edits name and remarks only; balances change through the ledger endpoints.
pub async fn update_account(
    Path(id): Path<AccountId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateAccount>,
) -> ApiResult<Account> {
    if body.name.trim().is_empty() {
        return Err(CoreError::InvalidInput("name".into(), "account name is required".into()).into());
    }
    Ok(Json(state.repo().update_account_details(id, &body.name, &body.remarks).await?))
}

/// # POST /api/accounts/:id/deposit
pub async fn deposit(
    Path(id): Path<AccountId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<AmountBody>,
) -> ApiResult<Account> {
    Ok(Json(state.ledger.deposit(id, body.amount).await?))
}

/// # POST /api/accounts/:id/withdraw
pub async fn withdraw(
    Path(id): Path<AccountId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<AmountBody>,
) -> ApiResult<Account> {
    Ok(Json(state.ledger.withdraw(id, body.amount).await?))
}

/// # POST /api/transfers
pub async fn transfer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TransferBody>,
) -> ApiResult<TransferReceipt> {
    let (from, to) = state
        .ledger
        .transfer(body.from_account, body.to_account, body.amount)
        .await?;
    Ok(Json(TransferReceipt { from, to }))
}

// ------------------------------------------------------------------------------
// Bets
// ------------------------------------------------------------------------------

/// # GET /api/bets
/// Active bets only; resolved bets are served by `/api/history`.
pub async fn list_active_bets(State(state): State<Arc<AppState>>) -> ApiResult<Vec<BetDetails>> {
    Ok(Json(state.repo().list_active_bets().await?))
}

/// # POST /api/bets
pub async fn place_bet(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlaceBetRequest>,
) -> Result<(StatusCode, Json<BetDetails>), AppError> {
    let details = state.ledger.place_bet(&request).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// # POST /api/bets/hedge
pub async fn place_hedge(
    State(state): State<Arc<AppState>>,
    Json(slip): Json<HedgeSlip>,
) -> Result<(StatusCode, Json<BetDetails>), AppError> {
    let request = slip.into_request()?;
    let details = state.ledger.place_bet(&request).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// # GET /api/bets/:id
pub async fn get_bet(Path(id): Path<BetId>, State(state): State<Arc<AppState>>) -> ApiResult<BetDetails> {
    match state.repo().get_bet_details(id).await {
        Ok(details) => Ok(Json(details)),
        Err(database::DbError::NotFound) => Err(AppError::NotFound(format!("bet {}", id))),
        Err(e) => Err(e.into()),
    }
}

/// # POST /api/bets/:id/resolve
pub async fn resolve_bet(
    Path(id): Path<BetId>,
    State(state): State<Arc<AppState>>,
    Json(outcome): Json<Outcome>,
) -> ApiResult<Settlement> {
    Ok(Json(state.ledger.resolve_bet(id, &outcome).await?))
}

/// # GET /api/history
pub async fn get_history(State(state): State<Arc<AppState>>) -> ApiResult<Vec<HistoryEntry>> {
    Ok(Json(state.repo().get_bet_history().await?))
}

// ------------------------------------------------------------------------------
// Settings and tools
// ------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub min_transfer: Decimal,
    pub default_betting_value: Decimal,
}

/// # GET /api/settings
pub async fn get_settings(State(state): State<Arc<AppState>>) -> ApiResult<Settings> {
    Ok(Json(state.repo().get_settings().await?))
}

/// # PUT /api/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SettingsUpdate>,
) -> ApiResult<Settings> {
    if body.min_transfer <= Decimal::ZERO {
        return Err(CoreError::InvalidInput("min_transfer".into(), "must be greater than zero".into()).into());
    }
    if body.default_betting_value <= Decimal::ZERO {
        return Err(
            CoreError::InvalidInput("default_betting_value".into(), "must be greater than zero".into()).into(),
        );
    }
    let settings = Settings {
        min_transfer: body.min_transfer,
        default_betting_value: body.default_betting_value,
        updated_at: None,
    };
    Ok(Json(state.repo().save_settings(&settings).await?))
}

#[derive(Debug, Deserialize)]
pub struct StakeQuery {
    pub odds: Decimal,
    /// Falls back to the `default_betting_value` setting.
    pub betting_value: Option<Decimal>,
    #[serde(default)]
    pub accurate: bool,
}

#[derive(Debug, Serialize)]
pub struct StakeQuote {
    pub betting_value: Decimal,
    pub odds: Decimal,
    pub amount: Decimal,
}

/// # GET /api/stake-calculator?odds=1.9&betting_value=2100&accurate=false
pub async fn calculate_stake(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StakeQuery>,
) -> ApiResult<StakeQuote> {
    let betting_value = match query.betting_value {
        Some(value) => value,
        None => state.repo().get_settings().await?.default_betting_value,
    };
    if betting_value <= Decimal::ZERO {
        return Err(CoreError::InvalidInput("betting_value".into(), "must be greater than zero".into()).into());
    }
    let amount = calculate_bet_amount(betting_value, query.odds, query.accurate)?;
    Ok(Json(StakeQuote { betting_value, odds: query.odds, amount }))
}

#[derive(Debug, Serialize)]
pub struct BackupFile {
    pub path: String,
}

/// # GET /api/backups
pub async fn list_backups(State(state): State<Arc<AppState>>) -> ApiResult<Vec<BackupFile>> {
    let backups = database::list_backups(&state.backup_dir).await?;
    Ok(Json(
        backups
            .into_iter()
            .map(|p| BackupFile { path: p.display().to_string() })
            .collect(),
    ))
}

/// # POST /api/backups
pub async fn create_backup(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<BackupFile>), AppError> {
    let path = state.repo().backup_to(&state.backup_dir).await?;
    Ok((StatusCode::CREATED, Json(BackupFile { path: path.display().to_string() })))
}

#[derive(Debug, Deserialize)]
pub struct ResetBody {
    #[serde(default)]
    pub confirm: bool,
}

/// # POST /api/reset
/// Deletes every account, bet and result. Requires `{"confirm": true}`.
pub async fn reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetBody>,
) -> Result<StatusCode, AppError> {
    if !body.confirm {
        return Err(AppError::BadRequest(
            "Reset deletes all data; send {\"confirm\": true} to proceed".to_string(),
        ));
    }
    state.repo().reset_all().await?;
    Ok(StatusCode::NO_CONTENT)
}
