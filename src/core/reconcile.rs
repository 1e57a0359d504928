//! Shift close reconciliation.
//!
//! At close time the operator declares what was counted for each reconciled method.
//! The difference per method is `counted - expected`, where `expected` is the ledger's
//! figure taken as-is (the ledger already accounts for expenses; subtracting them here
//! would count them twice). Expense subtotals travel alongside as information only.
//!
//! Sign convention: a difference of zero or below is classified as [`Standing::Surplus`],
//! anything above zero as [`Standing::Shortfall`]. This is a business rule of the
//! register and must not be "corrected".
//!
//! The locally computed [`Reconciliation`] is a preview. Once the ledger closes the
//! shift, [`Reconciliation::from_closed_shift`] rebuilds the report from the server's
//! own differences, which are authoritative.

use crate::{
    core::money::{self, parse_amount},
    entities::{MethodTotals, PaymentMethod, RECONCILED_METHODS, Shift},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use serde::Serialize;

/// Classification of a difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    /// Difference `<= 0`
    Surplus,
    /// Difference `> 0`
    Shortfall,
}

impl Standing {
    /// Classifies a difference; zero counts as surplus.
    #[must_use]
    pub fn classify(difference: Decimal) -> Self {
        if difference <= Decimal::ZERO {
            Self::Surplus
        } else {
            Self::Shortfall
        }
    }

    /// Marker shown next to a per-method difference.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Surplus => "✅",
            Self::Shortfall => "⚠️",
        }
    }

    /// Word shown next to the total difference.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Surplus => "Sobrante",
            Self::Shortfall => "Faltante",
        }
    }
}

/// Counted amounts that passed validation: present, numeric and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountedAmounts(MethodTotals);

impl CountedAmounts {
    /// Validates already-parsed amounts.
    ///
    /// # Errors
    /// [`Error::InvalidCountedAmount`] if any amount is negative.
    pub fn new(totals: MethodTotals) -> Result<Self> {
        for method in RECONCILED_METHODS {
            check_non_negative(method, totals.get(method))?;
        }
        Ok(Self(totals))
    }

    /// Parses operator input for the three methods.
    ///
    /// # Errors
    /// [`Error::InvalidCountedAmount`] naming the first method whose input is missing,
    /// unparsable or negative.
    pub fn from_inputs(
        cash: Option<&str>,
        transfer: Option<&str>,
        deposit: Option<&str>,
    ) -> Result<Self> {
        Ok(Self(MethodTotals::new(
            parse_counted(PaymentMethod::Cash, cash)?,
            parse_counted(PaymentMethod::Transfer, transfer)?,
            parse_counted(PaymentMethod::Deposit, deposit)?,
        )))
    }

    /// Starting values for the close dialog: the expected figures, so the operator only
    /// corrects what differs. Negative expected figures start at zero.
    #[must_use]
    pub fn prefilled(expected: MethodTotals) -> Self {
        Self(MethodTotals::new(
            expected.cash.max(Decimal::ZERO),
            expected.transfer.max(Decimal::ZERO),
            expected.deposit.max(Decimal::ZERO),
        ))
    }

    /// Replaces the amount for one method with parsed operator input.
    ///
    /// # Errors
    /// Same as [`CountedAmounts::from_inputs`] for that method.
    pub fn with_input(self, method: PaymentMethod, input: Option<&str>) -> Result<Self> {
        let value = parse_counted(method, input)?;
        let mut totals = self.0;
        match method {
            PaymentMethod::Cash => totals.cash = value,
            PaymentMethod::Transfer => totals.transfer = value,
            PaymentMethod::Deposit => totals.deposit = value,
            PaymentMethod::Card | PaymentMethod::Unknown => {
                return Err(Error::InvalidCountedAmount {
                    method,
                    reason: "method is not counted at close".to_string(),
                });
            }
        }
        Ok(Self(totals))
    }

    /// The validated amounts.
    #[must_use]
    pub const fn totals(&self) -> MethodTotals {
        self.0
    }
}

fn parse_counted(method: PaymentMethod, input: Option<&str>) -> Result<Decimal> {
    let raw = input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidCountedAmount {
            method,
            reason: "a value is required".to_string(),
        })?;

    let value = parse_amount(raw).map_err(|e| Error::InvalidCountedAmount {
        method,
        reason: e.to_string(),
    })?;
    check_non_negative(method, value)?;
    Ok(value)
}

fn too_large(method: PaymentMethod) -> Error {
    Error::InvalidCountedAmount {
        method,
        reason: "amount too large".to_string(),
    }
}

fn check_non_negative(method: PaymentMethod, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::InvalidCountedAmount {
            method,
            reason: format!("must not be negative (got {})", money::format_amount(value)),
        });
    }
    Ok(())
}

/// One method's row in the reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodLine {
    /// Payment method
    pub method: PaymentMethod,
    /// Ledger's expected amount
    pub expected: Decimal,
    /// Operator's counted amount
    pub counted: Decimal,
    /// Expenses recorded with this method (informational)
    pub expenses: Decimal,
    /// `counted - expected`
    pub difference: Decimal,
    /// Classification of `difference`
    pub standing: Standing,
}

/// Discrepancy report for a closing or closed shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Rows for cash, transfer and deposit, in that order
    pub lines: [MethodLine; 3],
    /// Sum of the per-method differences
    pub total_difference: Decimal,
    /// Classification of `total_difference`
    pub total_standing: Standing,
}

impl Reconciliation {
    /// Client-side preview. Pure: the same inputs always produce the same report.
    ///
    /// # Errors
    /// [`Error::InvalidCountedAmount`] if a difference or the total does not fit in a
    /// [`Decimal`]. Only absurdly large counted amounts get there.
    pub fn preview(
        expected: MethodTotals,
        counted: &CountedAmounts,
        expenses: MethodTotals,
    ) -> Result<Self> {
        let counted = counted.totals();
        let line = |method: PaymentMethod| -> Result<MethodLine> {
            let difference = counted
                .get(method)
                .checked_sub(expected.get(method))
                .ok_or_else(|| too_large(method))?;
            Ok(MethodLine {
                method,
                expected: expected.get(method),
                counted: counted.get(method),
                expenses: expenses.get(method),
                difference,
                standing: Standing::classify(difference),
            })
        };
        let [cash, transfer, deposit] = RECONCILED_METHODS;
        let lines = [line(cash)?, line(transfer)?, line(deposit)?];
        let total_difference = lines.iter().try_fold(Decimal::ZERO, |total, line| {
            total
                .checked_add(line.difference)
                .ok_or_else(|| too_large(line.method))
        })?;

        Ok(Self {
            lines,
            total_difference,
            total_standing: Standing::classify(total_difference),
        })
    }

    /// Report built from a shift the ledger has closed, using the server's differences.
    ///
    /// # Errors
    /// [`Error::IncompleteShift`] if the shift lacks counted amounts or differences.
    pub fn from_closed_shift(shift: &Shift) -> Result<Self> {
        let require = |value: Option<Decimal>, field: &'static str| {
            value.ok_or(Error::IncompleteShift { id: shift.id, field })
        };

        let counted = MethodTotals::new(
            require(shift.counted_cash, "monto_cierre_efectivo")?,
            require(shift.counted_transfer, "monto_cierre_transferencia")?,
            require(shift.counted_deposit, "monto_cierre_seña")?,
        );
        let differences = MethodTotals::new(
            require(shift.difference_cash, "diferencia_efectivo")?,
            require(shift.difference_transfer, "diferencia_transferencia")?,
            require(shift.difference_deposit, "diferencia_seña")?,
        );
        let total_difference = require(shift.difference_total, "diferencia_total")?;
        let expected = shift.expected();
        let expenses = shift.reported_expenses();

        let lines = RECONCILED_METHODS.map(|method| MethodLine {
            method,
            expected: expected.get(method),
            counted: counted.get(method),
            expenses: expenses.get(method),
            difference: differences.get(method),
            standing: Standing::classify(differences.get(method)),
        });

        Ok(Self {
            lines,
            total_difference,
            total_standing: Standing::classify(total_difference),
        })
    }

    /// Row for `method`, if it is a reconciled method.
    #[must_use]
    pub fn line(&self, method: PaymentMethod) -> Option<&MethodLine> {
        self.lines.iter().find(|line| line.method == method)
    }

    /// Per-method differences.
    #[must_use]
    pub fn differences(&self) -> MethodTotals {
        let difference = |method| self.line(method).map_or(Decimal::ZERO, |l| l.difference);
        MethodTotals::new(
            difference(PaymentMethod::Cash),
            difference(PaymentMethod::Transfer),
            difference(PaymentMethod::Deposit),
        )
    }

    /// Whether another report disagrees on any difference.
    #[must_use]
    pub fn diverges_from(&self, other: &Self) -> bool {
        self.differences() != other.differences()
            || self.total_difference != other.total_difference
    }
}

/// Body of the close request sent to the ledger.
///
/// The ledger also expects a counted amount for an online-wallet method this register
/// does not count; it is always sent as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseRequest {
    /// Counted cash
    #[serde(rename = "monto_cierre_efectivo")]
    pub counted_cash: Decimal,
    /// Counted transfers
    #[serde(rename = "monto_cierre_transferencia")]
    pub counted_transfer: Decimal,
    /// Fixed zero for the uncounted online-wallet slot
    #[serde(rename = "monto_cierre_mercadopago")]
    pub counted_other: Decimal,
    /// Counted deposits
    #[serde(rename = "monto_cierre_seña")]
    pub counted_deposit: Decimal,
    /// Operator notes; empty when none were given
    #[serde(rename = "observaciones")]
    pub observations: String,
}

impl CloseRequest {
    /// Packages validated counted amounts and optional notes.
    #[must_use]
    pub fn new(counted: &CountedAmounts, observations: Option<&str>) -> Self {
        let totals = counted.totals();
        Self {
            counted_cash: totals.cash,
            counted_transfer: totals.transfer,
            counted_other: Decimal::ZERO,
            counted_deposit: totals.deposit,
            observations: observations.map(str::trim).unwrap_or_default().to_string(),
        }
    }
}
