//! Application settings loading from config.toml
//!
//! The file is optional: without it the bot talks to a ledger on localhost. The path
//! can be changed with the `CONFIG_PATH` environment variable.

use super::ledger::LedgerSettings;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default location of the settings file.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ledger API connection
    pub ledger: LedgerSettings,
    /// Discord bot options
    pub bot: BotSettings,
}

/// Discord bot options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Register commands in this guild only (instant updates while developing)
    pub dev_guild_id: Option<u64>,
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is invalid.
pub fn parse_config(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from `CONFIG_PATH` (default `./config.toml`), falling back to
/// defaults when the file does not exist, then applies environment overrides.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_app_configuration() -> Result<Settings> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut settings = if Path::new(&path).exists() {
        load_config(&path)?
    } else {
        info!("No configuration file at {path}; using defaults.");
        Settings::default()
    };
    settings.ledger = settings.ledger.with_env_overrides();

    info!("Ledger API at {}", settings.ledger.base_url);
    Ok(settings)
}
