//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Movement recording commands
pub mod movement;

/// Shift lifecycle commands
pub mod shift;

// Export commands
pub use general::*;
pub use movement::*;
pub use shift::*;
