//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the register: slash commands for
//! shifts and movements, autocomplete handlers, the shared bot context and the framework
//! setup.

/// Discord command implementations (shift, movement, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::Settings,
    core::session::ShiftSession,
    errors::{Error, ErrorKind},
    ledger::LedgerClient,
};
use poise::serenity_prelude as serenity;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
pub struct BotData {
    /// The register's shift session, backed by the ledger API
    pub session: ShiftSession<LedgerClient>,
    /// Loaded application settings
    pub settings: Settings,
}

impl BotData {
    /// Creates a new `BotData` instance around a ledger client.
    #[must_use]
    pub fn new(ledger: LedgerClient, settings: Settings) -> Self {
        Self {
            session: ShiftSession::new(ledger),
            settings,
        }
    }
}

/// Text shown to the operator when a command fails.
///
/// Validation and conflict errors are expected outcomes of operator input; everything
/// else means the ledger could not be reached or answered badly.
#[must_use]
pub fn failure_message(error: &Error) -> String {
    match error.kind() {
        ErrorKind::Validation => format!("❌ {error}"),
        ErrorKind::Conflict => format!("⚠️ {error}"),
        ErrorKind::Transport => format!(
            "❌ The ledger could not complete the request: {error}. \
             Nothing was changed; try again."
        ),
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            match error.kind() {
                ErrorKind::Transport => {
                    error!("Error in command `{}`: {:?}", ctx.command().name, error);
                }
                ErrorKind::Validation | ErrorKind::Conflict => {
                    warn!("Command `{}` rejected: {error}", ctx.command().name);
                }
            }
            if let Err(e) = ctx.say(failure_message(&error)).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the framework, registers the commands and runs the Discord client until it
/// stops.
///
/// Commands are registered in `[bot] dev_guild_id` when set (instant updates while
/// developing), globally otherwise. The current shift is loaded from the ledger before
/// the first command runs; if that fails the bot still starts and retries on demand.
///
/// # Errors
/// Returns the serenity error if the client cannot be created or stops with an error.
#[instrument(skip_all)]
pub async fn run_bot(token: String, data: BotData) -> Result<(), serenity::Error> {
    let dev_guild_id = data.settings.bot.dev_guild_id;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::shift(),
                commands::movement(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                if let Some(guild_id) = dev_guild_id {
                    let guild_id = serenity::GuildId::new(guild_id);
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                        .await?;
                    info!("Registered commands in guild {guild_id}");
                } else {
                    info!("Registering commands globally...");
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                }

                match data.session.refresh().await {
                    Ok(Some(shift)) => info!(shift_id = shift.id, "Shift already open"),
                    Ok(None) => info!("No shift open"),
                    Err(e) => warn!("Could not load the current shift: {e}"),
                }
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))
}

pub use commands::*;
pub use handlers::*;
