use axum::{
    routing::{get, post},
    Router,
};
use configuration::Config;
use database::DbRepository;
use ledger::Ledger;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Ledger,
    pub backup_dir: PathBuf,
}

impl AppState {
    pub fn new(ledger: Ledger, backup_dir: PathBuf) -> Self {
        Self { ledger, backup_dir }
    }

    /// Opens the configured database, creates any missing tables and wires
    /// up the ledger.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let pool = database::connect(&config.database.path).await?;
        let defaults = config.betting.as_settings();
        database::init_schema(&pool, &defaults).await?;
        let repo = DbRepository::new(pool).with_settings_defaults(defaults);
        Ok(Self::new(Ledger::new(repo), config.database.backup_dir.clone()))
    }

    pub fn repo(&self) -> &DbRepository {
        self.ledger.repository()
    }
}

/// Builds the API router over `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/accounts", get(handlers::list_accounts).post(handlers::create_account))
        .route("/api/accounts/:id", get(handlers::get_account).patch(handlers::update_account))
        .route("/api/accounts/:id/deposit", post(handlers::deposit))
        .route("/api/accounts/:id/withdraw", post(handlers::withdraw))
        .route("/api/transfers", post(handlers::transfer))
        .route("/api/bets", get(handlers::list_active_bets).post(handlers::place_bet))
        .route("/api/bets/hedge", post(handlers::place_hedge))
        .route("/api/bets/:id", get(handlers::get_bet))
        .route("/api/bets/:id/resolve", post(handlers::resolve_bet))
        .route("/api/history", get(handlers::get_history))
        .route("/api/settings", get(handlers::get_settings).put(handlers::update_settings))
        .route("/api/stake-calculator", get(handlers::calculate_stake))
        .route("/api/backups", get(handlers::list_backups).post(handlers::create_backup))
        .route("/api/reset", post(handlers::reset))
        .with_state(Arc::new(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serves the API on `addr` until the process is stopped.
pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
