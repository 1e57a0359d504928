//! Per-method amounts for the three reconciled payment methods.

use super::PaymentMethod;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment methods that take part in shift reconciliation, in report order.
pub const RECONCILED_METHODS: [PaymentMethod; 3] = [
    PaymentMethod::Cash,
    PaymentMethod::Transfer,
    PaymentMethod::Deposit,
];

/// One amount per reconciled payment method.
///
/// Used for expected totals, counted totals, expense subtotals and differences alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTotals {
    /// Cash
    pub cash: Decimal,
    /// Bank transfer
    pub transfer: Decimal,
    /// Deposit ("seña") paid in advance
    pub deposit: Decimal,
}

impl MethodTotals {
    /// Builds totals from the three amounts.
    #[must_use]
    pub const fn new(cash: Decimal, transfer: Decimal, deposit: Decimal) -> Self {
        Self {
            cash,
            transfer,
            deposit,
        }
    }

    /// Amount for `method`; methods outside reconciliation always report zero.
    #[must_use]
    pub const fn get(&self, method: PaymentMethod) -> Decimal {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::Transfer => self.transfer,
            PaymentMethod::Deposit => self.deposit,
            PaymentMethod::Card | PaymentMethod::Unknown => Decimal::ZERO,
        }
    }

    /// Adds `amount` to the slot for `method`. Returns `Ok(false)` (and changes nothing)
    /// for methods outside reconciliation.
    ///
    /// # Errors
    /// [`Error::AmountOutOfRange`] if the sum does not fit in a [`Decimal`]. The slot
    /// keeps its previous value.
    pub fn add(&mut self, method: PaymentMethod, amount: Decimal) -> Result<bool> {
        let slot = match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Transfer => &mut self.transfer,
            PaymentMethod::Deposit => &mut self.deposit,
            PaymentMethod::Card | PaymentMethod::Unknown => return Ok(false),
        };
        *slot = slot
            .checked_add(amount)
            .ok_or(Error::AmountOutOfRange { method })?;
        Ok(true)
    }

    /// Sum over the three methods, or `None` if it does not fit in a [`Decimal`].
    #[must_use]
    pub fn checked_sum(&self) -> Option<Decimal> {
        self.cash.checked_add(self.transfer)?.checked_add(self.deposit)
    }
}
