use anyhow::Context;
use web_server::AppState;

// Entry point for `cargo run -p web-server`. The `stakebook serve` command
// does the same thing with CLI overrides on top.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = configuration::load_config(None).context("Failed to load configuration")?;
    let _guard = configuration::init_tracing(&config.logging).context("Failed to initialise logging")?;

    let addr = config.server.socket_addr().context("Invalid server address")?;
    let state = AppState::from_config(&config).await?;
    web_server::run_server(addr, state).await
}
