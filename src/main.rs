use caja_buddy::{
    bot::{self, BotData},
    config,
    errors::{Error, Result},
    ledger::LedgerClient,
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration (config.toml + env overrides)
    let settings = config::load_app_configuration()
        .inspect_err(|e| error!("Critical error loading application configuration: {e}"))?;

    // 4. Build the ledger client
    let ledger = LedgerClient::new(&settings.ledger)
        .inspect_err(|e| error!("Failed to build ledger client: {e}"))?;
    info!("Ledger client ready for {}", ledger.base_url());

    // 5. Run the bot. DISCORD_BOT_TOKEN is read directly before use, never stored.
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, BotData::new(ledger, settings))
        .await
        .map_err(Error::from)?;

    Ok(())
}
