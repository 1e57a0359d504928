//! Ledger API access.
//!
//! The ledger (the barbershop's back-office API) is the single source of truth for
//! shifts and movements. [`Ledger`] is the seam the session controller talks through;
//! [`LedgerClient`] is the HTTP implementation.

/// HTTP implementation of [`Ledger`]
pub mod client;

pub use client::LedgerClient;

use crate::{
    core::{movement::NewMovement, reconcile::CloseRequest},
    entities::{Movement, Shift},
    errors::Result,
};
use rust_decimal::Decimal;
use std::future::Future;

/// Operations the register needs from the ledger.
///
/// Implementations never retry on their own: every call maps to one operator action.
pub trait Ledger: Send + Sync {
    /// The currently open shift, if any.
    fn active_shift(&self) -> impl Future<Output = Result<Option<Shift>>> + Send;

    /// Opens a new shift with the declared opening cash.
    fn open_shift(&self, opening_amount: Decimal) -> impl Future<Output = Result<Shift>> + Send;

    /// Every movement the ledger lists, across shifts.
    fn list_movements(&self) -> impl Future<Output = Result<Vec<Movement>>> + Send;

    /// Records a movement against the open shift.
    fn create_movement(
        &self,
        movement: &NewMovement,
    ) -> impl Future<Output = Result<Movement>> + Send;

    /// Replaces an existing movement.
    fn update_movement(
        &self,
        id: i64,
        movement: &NewMovement,
    ) -> impl Future<Output = Result<Movement>> + Send;

    /// Deletes a movement.
    fn delete_movement(&self, id: i64) -> impl Future<Output = Result<()>> + Send;

    /// Closes a shift with the counted amounts; returns the closed shift including the
    /// server-computed differences.
    fn close_shift(
        &self,
        shift_id: i64,
        request: &CloseRequest,
    ) -> impl Future<Output = Result<Shift>> + Send;

    /// Past shifts, for historical display.
    fn shift_history(&self) -> impl Future<Output = Result<Vec<Shift>>> + Send;
}
