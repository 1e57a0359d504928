//! Ledger API connection settings.
//!
//! Values come from the `[ledger]` table of config.toml and can be overridden with the
//! `LEDGER_API_URL` and `LEDGER_API_TOKEN` environment variables (usually set in `.env`).

use serde::Deserialize;

/// Default base URL of the ledger's cash-register API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/caja";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings for the ledger API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Base URL, e.g. `http://localhost:8000/api/caja`
    pub base_url: String,
    /// Token sent as `Authorization: Token <token>`, if the ledger requires one
    pub api_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LedgerSettings {
    /// Applies `LEDGER_API_URL` / `LEDGER_API_TOKEN` from the environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("LEDGER_API_URL").ok(),
            std::env::var("LEDGER_API_TOKEN").ok(),
        )
    }

    /// Applies explicit overrides; blank values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, base_url: Option<String>, api_token: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(token) = api_token.filter(|t| !t.trim().is_empty()) {
            self.api_token = Some(token.trim().to_string());
        }
        self
    }
}
