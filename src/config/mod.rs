/// Ledger API connection settings
pub mod ledger;

/// Settings file loading from config.toml
pub mod settings;

pub use ledger::LedgerSettings;
pub use settings::{BotSettings, Settings, load_app_configuration};
