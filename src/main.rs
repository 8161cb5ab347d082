use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use configuration::{Config, LogFormat};
use core_types::{
    AccountId, AllocationRequest, BetId, FixtureRef, HedgeSlip, MatchId, NewMatch, Outcome,
    PlaceBetRequest, Settings, Team,
};
use database::DbRepository;
use ledger::Ledger;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

mod output;

/// The main entry point for the Stakebook betting ledger.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = configuration::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _guard = configuration::init_tracing(&config.logging).context("Failed to initialise logging")?;

    let ledger = open_ledger(&config).await?;
    let out = Printer { json: cli.json };

    match cli.command {
        Commands::Serve(args) => serve(args, &config, ledger).await,
        Commands::Account(cmd) => handle_account(cmd, &ledger, &out).await,
        Commands::Bet(cmd) => handle_bet(cmd, &ledger, &out).await,
        Commands::History => {
            let history = ledger.repository().get_bet_history().await?;
            out.emit(&history, || output::history_table(&history))
        }
        Commands::Settings(cmd) => handle_settings(cmd, ledger.repository(), &out).await,
        Commands::Backup(args) => handle_backup(args, &config, ledger.repository(), &out).await,
        Commands::Reset(args) => {
            if !args.yes {
                bail!("Reset deletes every account, bet and result. Re-run with --yes to proceed.");
            }
            ledger.repository().reset_all().await?;
            println!("All data has been reset.");
            Ok(())
        }
    }
}

async fn open_ledger(config: &Config) -> anyhow::Result<Ledger> {
    let pool = database::connect(&config.database.path)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path.display()))?;
    let defaults = config.betting.as_settings();
    database::init_schema(&pool, &defaults).await.context("Failed to create the schema")?;
    tracing::debug!(path = %config.database.path.display(), "Ledger database ready");
    Ok(Ledger::new(DbRepository::new(pool).with_settings_defaults(defaults)))
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Track bets across several betting accounts in a local SQLite ledger.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a config file (defaults to ./stakebook.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Console log format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Print results as JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the JSON API server.
    Serve(ServeArgs),
    /// Create, edit and fund accounts.
    #[command(subcommand)]
    Account(AccountCommand),
    /// Place, list and resolve bets.
    #[command(subcommand)]
    Bet(BetCommand),
    /// Show resolved bets, most recent match first.
    History,
    /// Show or change the ledger settings.
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Write a timestamped copy of the database.
    Backup(BackupArgs),
    /// Delete all accounts, bets and results.
    Reset(ResetArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Overrides `server.host`.
    #[arg(long)]
    host: Option<String>,
    /// Overrides `server.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Open a new account.
    Add {
        name: String,
        #[arg(long, default_value = "0")]
        balance: Decimal,
        #[arg(long, default_value = "")]
        remarks: String,
    },
    /// List every account with its balance.
    List,
    /// Rename an account or change its remarks.
    Edit {
        id: AccountId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        remarks: Option<String>,
    },
    Deposit { id: AccountId, amount: Decimal },
    Withdraw { id: AccountId, amount: Decimal },
    /// Move money between two accounts.
    Transfer { from: AccountId, to: AccountId, amount: Decimal },
}

#[derive(Args)]
struct FixtureArgs {
    /// Bet on a match that already exists.
    #[arg(long, conflicts_with_all = ["team1", "team2", "date", "time"])]
    match_id: Option<MatchId>,
    #[arg(long)]
    team1: Option<String>,
    #[arg(long)]
    team2: Option<String>,
    /// Match date (YYYY-MM-DD).
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Match time, e.g. "7:30 PM".
    #[arg(long)]
    time: Option<String>,
    #[arg(long)]
    team1_odds: Decimal,
    #[arg(long)]
    team2_odds: Decimal,
}

impl FixtureArgs {
    fn fixture(&self) -> anyhow::Result<FixtureRef> {
        if let Some(match_id) = self.match_id {
            return Ok(FixtureRef::Existing(match_id));
        }
        match (&self.team1, &self.team2, self.date, &self.time) {
            (Some(team1), Some(team2), Some(match_date), Some(match_time)) => Ok(FixtureRef::New(NewMatch {
                team1: team1.clone(),
                team2: team2.clone(),
                match_date,
                match_time: match_time.clone(),
            })),
            _ => bail!("Give either --match-id or all of --team1, --team2, --date and --time"),
        }
    }
}

/// One `ACCOUNT:TEAM:AMOUNT` stake, e.g. `3:1:500` or `3:team2:250.50`.
#[derive(Debug, Clone)]
struct StakeArg(AllocationRequest);

impl FromStr for StakeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [account, team, amount] = parts.as_slice() else {
            return Err(format!("expected ACCOUNT:TEAM:AMOUNT, got '{}'", s));
        };
        Ok(StakeArg(AllocationRequest {
            account_id: account.trim().parse().map_err(|e| format!("bad account id '{}': {}", account, e))?,
            team: team.parse().map_err(|e| format!("{}", e))?,
            amount: amount.trim().parse().map_err(|e| format!("bad amount '{}': {}", amount, e))?,
        }))
    }
}

/// One `ACCOUNT=AMOUNT` cashout entry.
#[derive(Debug, Clone)]
struct CashoutArg(AccountId, Decimal);

impl FromStr for CashoutArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (account, amount) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ACCOUNT=AMOUNT, got '{}'", s))?;
        Ok(CashoutArg(
            account.trim().parse().map_err(|e| format!("bad account id '{}': {}", account, e))?,
            amount.trim().parse().map_err(|e| format!("bad amount '{}': {}", amount, e))?,
        ))
    }
}

#[derive(Subcommand)]
enum BetCommand {
    /// Place a bet with explicit per-account stakes.
    Place {
        #[command(flatten)]
        fixture: FixtureArgs,
        /// Repeatable: ACCOUNT:TEAM:AMOUNT.
        #[arg(long = "stake", required = true)]
        stakes: Vec<StakeArg>,
    },
    /// Place a hedge: equal groups of accounts back each side, stakes sized to the betting value.
    Hedge {
        #[command(flatten)]
        fixture: FixtureArgs,
        /// Defaults to the `default_betting_value` setting.
        #[arg(long)]
        betting_value: Option<Decimal>,
        #[arg(long, value_delimiter = ',', required = true)]
        team1_accounts: Vec<AccountId>,
        #[arg(long, value_delimiter = ',', required = true)]
        team2_accounts: Vec<AccountId>,
        /// Use exact stakes instead of rounding up to whole units.
        #[arg(long)]
        accurate: bool,
    },
    /// List active bets.
    List,
    /// Show one bet with its allocations.
    Show { id: BetId },
    /// Resolve a bet as won by TEAM (1, 2, team1 or team2).
    Win { id: BetId, team: Team },
    /// Resolve a bet as lost.
    Lose { id: BetId },
    /// Resolve a bet by cashing out. Accounts not listed receive nothing.
    Cashout {
        id: BetId,
        /// Repeatable: ACCOUNT=AMOUNT.
        #[arg(long = "amount")]
        amounts: Vec<CashoutArg>,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        min_transfer: Option<Decimal>,
        #[arg(long)]
        default_betting_value: Option<Decimal>,
    },
}

#[derive(Args)]
struct BackupArgs {
    /// List existing backups instead of creating one.
    #[arg(long)]
    list: bool,
}

#[derive(Args)]
struct ResetArgs {
    /// Confirm that all data should be deleted.
    #[arg(long)]
    yes: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

struct Printer {
    json: bool,
}

impl Printer {
    fn emit<T: Serialize>(&self, value: &T, table: impl FnOnce() -> comfy_table::Table) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", table());
        }
        Ok(())
    }
}

async fn serve(args: ServeArgs, config: &Config, ledger: Ledger) -> anyhow::Result<()> {
    let mut server = config.server.clone();
    if let Some(host) = args.host {
        server.host = host;
    }
    if let Some(port) = args.port {
        server.port = port;
    }
    let addr = server.socket_addr().context("Invalid server address")?;
    let state = web_server::AppState::new(ledger, config.database.backup_dir.clone());
    web_server::run_server(addr, state).await
}

async fn handle_account(cmd: AccountCommand, ledger: &Ledger, out: &Printer) -> anyhow::Result<()> {
    let account = match cmd {
        AccountCommand::Add { name, balance, remarks } => ledger.open_account(&name, balance, &remarks).await?,
        AccountCommand::List => {
            let accounts = ledger.repository().list_accounts().await?;
            return out.emit(&accounts, || output::accounts_table(&accounts));
        }
        AccountCommand::Edit { id, name, remarks } => {
            let current = ledger.repository().get_account(id).await.context(format!("Account {} not found", id))?;
            let name = name.unwrap_or(current.name);
            let remarks = remarks.unwrap_or(current.remarks);
            ledger.repository().update_account_details(id, &name, &remarks).await?
        }
        AccountCommand::Deposit { id, amount } => ledger.deposit(id, amount).await?,
        AccountCommand::Withdraw { id, amount } => ledger.withdraw(id, amount).await?,
        AccountCommand::Transfer { from, to, amount } => {
            let (source, target) = ledger.transfer(from, to, amount).await?;
            let accounts = vec![source, target];
            return out.emit(&accounts, || output::accounts_table(&accounts));
        }
    };
    let accounts = vec![account];
    out.emit(&accounts, || output::accounts_table(&accounts))
}

async fn handle_bet(cmd: BetCommand, ledger: &Ledger, out: &Printer) -> anyhow::Result<()> {
    let (bet_id, outcome) = match cmd {
        BetCommand::Place { fixture, stakes } => {
            let request = PlaceBetRequest {
                fixture: fixture.fixture()?,
                team1_odds: fixture.team1_odds,
                team2_odds: fixture.team2_odds,
                betting_value: None,
                allocations: stakes.into_iter().map(|s| s.0).collect(),
            };
            let details = ledger.place_bet(&request).await?;
            return out.emit(&details, || output::bet_table(&details));
        }
        BetCommand::Hedge { fixture, betting_value, team1_accounts, team2_accounts, accurate } => {
            let betting_value = match betting_value {
                Some(value) => value,
                None => ledger.repository().get_settings().await?.default_betting_value,
            };
            let slip = HedgeSlip {
                fixture: fixture.fixture()?,
                team1_odds: fixture.team1_odds,
                team2_odds: fixture.team2_odds,
                betting_value,
                team1_accounts,
                team2_accounts,
                accurate,
            };
            let details = ledger.place_bet(&slip.into_request()?).await?;
            return out.emit(&details, || output::bet_table(&details));
        }
        BetCommand::List => {
            let bets = ledger.repository().list_active_bets().await?;
            return out.emit(&bets, || output::active_bets_table(&bets));
        }
        BetCommand::Show { id } => {
            let details = ledger.repository().get_bet_details(id).await.context(format!("Bet {} not found", id))?;
            return out.emit(&details, || output::bet_table(&details));
        }
        BetCommand::Win { id, team } => (id, Outcome::Win { winning_team: team }),
        BetCommand::Lose { id } => (id, Outcome::Loss),
        BetCommand::Cashout { id, amounts } => {
            let amounts: BTreeMap<AccountId, Decimal> = amounts.into_iter().map(|c| (c.0, c.1)).collect();
            (id, Outcome::Cashout { amounts })
        }
    };

    let settlement = ledger.resolve_bet(bet_id, &outcome).await?;
    out.emit(&settlement, || output::settlement_table(&settlement))
}

async fn handle_settings(cmd: SettingsCommand, repo: &DbRepository, out: &Printer) -> anyhow::Result<()> {
    let settings = match cmd {
        SettingsCommand::Show => repo.get_settings().await?,
        SettingsCommand::Set { min_transfer, default_betting_value } => {
            let current = repo.get_settings().await?;
            let updated = Settings {
                min_transfer: min_transfer.unwrap_or(current.min_transfer),
                default_betting_value: default_betting_value.unwrap_or(current.default_betting_value),
                updated_at: None,
            };
            if updated.min_transfer <= Decimal::ZERO || updated.default_betting_value <= Decimal::ZERO {
                bail!("Settings values must be greater than zero");
            }
            repo.save_settings(&updated).await?
        }
    };
    out.emit(&settings, || output::settings_table(&settings))
}

async fn handle_backup(args: BackupArgs, config: &Config, repo: &DbRepository, out: &Printer) -> anyhow::Result<()> {
    let backup_dir = &config.database.backup_dir;
    let paths = if args.list {
        database::list_backups(backup_dir).await?
    } else {
        vec![repo.backup_to(backup_dir).await.context("Backup failed")?]
    };
    let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    out.emit(&names, || output::backups_table(&names))
}
