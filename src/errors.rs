//! Unified error types and result handling.
//!
//! Every fallible operation in the crate returns [`Result`]. Variants are grouped into
//! the three kinds the operator sees (see [`ErrorKind`]): validation errors are caught
//! before any request is sent, conflicts come from shift-state preconditions, and
//! transport errors cover everything that went wrong talking to the ledger API.

use crate::entities::PaymentMethod;
use thiserror::Error;

/// Classification of an [`Error`] by how the operator recovers from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad operator input. Fixed by correcting the input; nothing was sent.
    Validation,
    /// Shift-state precondition failed. Fixed by refreshing shift state.
    Conflict,
    /// Network or server failure. State is assumed unchanged; the action may be retried.
    Transport,
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A counted amount at close time was missing, unparsable or negative.
    #[error("Invalid counted amount for {method}: {reason}")]
    InvalidCountedAmount {
        /// Payment method whose counted amount was rejected
        method: PaymentMethod,
        /// Human-readable reason
        reason: String,
    },

    /// The opening amount for a new shift was unparsable or negative.
    #[error("Invalid opening amount: {reason}")]
    InvalidOpeningAmount {
        /// Human-readable reason
        reason: String,
    },

    /// A movement draft failed validation.
    #[error("Invalid movement: {reason}")]
    InvalidMovement {
        /// Human-readable reason
        reason: String,
    },

    /// Adding up amounts for one method went past the range of a decimal.
    #[error("Amounts for {method} are too large to add up")]
    AmountOutOfRange {
        /// Payment method whose sum overflowed
        method: PaymentMethod,
    },

    /// A shift-state precondition failed (no active shift, shift already open, ...).
    #[error("{message}")]
    Conflict {
        /// Message shown to the operator
        message: String,
    },

    /// The movement belongs to a closed shift and can no longer be edited or deleted.
    #[error("Movement #{id} belongs to a closed shift and cannot be modified")]
    MovementLocked {
        /// Movement identifier
        id: i64,
    },

    /// The movement was not found in the ledger listing.
    #[error("Movement #{id} not found")]
    MovementNotFound {
        /// Movement identifier
        id: i64,
    },

    /// A close request for the current shift is already being processed.
    #[error("A close request for this shift is already in progress")]
    CloseInFlight,

    /// The ledger returned a closed shift without the fields needed for the report.
    #[error("Closed shift #{id} is missing {field}")]
    IncompleteShift {
        /// Shift identifier
        id: i64,
        /// Name of the missing field
        field: &'static str,
    },

    /// The ledger API answered with a non-success status.
    #[error("Ledger API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body, or a generic fallback
        message: String,
    },

    /// Transport-level failure talking to the ledger API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Missing or invalid environment variable.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error.
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl Error {
    /// Shorthand for a [`Error::Conflict`] with the given message.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Returns how the operator recovers from this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCountedAmount { .. }
            | Self::InvalidOpeningAmount { .. }
            | Self::InvalidMovement { .. }
            | Self::AmountOutOfRange { .. } => ErrorKind::Validation,
            Self::Conflict { .. }
            | Self::MovementLocked { .. }
            | Self::MovementNotFound { .. }
            | Self::CloseInFlight => ErrorKind::Conflict,
            Self::IncompleteShift { .. }
            | Self::Api { .. }
            | Self::Http(_)
            | Self::Config { .. }
            | Self::EnvVar(_)
            | Self::FrameworkError(_) => ErrorKind::Transport,
        }
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
