//! Entity module - shifts and movements as exchanged with the ledger API.
//! Wire field names follow the ledger; Rust field names describe the domain.

pub mod amount;
pub mod movement;
pub mod shift;
pub mod totals;

pub use movement::{Movement, MovementKind, PaymentMethod};
pub use shift::{Shift, ShiftState};
pub use totals::{MethodTotals, RECONCILED_METHODS};
