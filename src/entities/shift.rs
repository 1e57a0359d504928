//! Shift entity - one open/close session of the cash register ("turno").
//!
//! The ledger maintains `expected_*` as income accrues (opening cash included in
//! `expected_cash`). Counted amounts, differences and expense subtotals stay null until
//! the shift is closed.

use super::{MethodTotals, amount};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a shift. `Open -> Closed` happens exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftState {
    /// Accepting movements
    #[serde(rename = "abierto")]
    Open,
    /// Closed and reconciled; immutable
    #[serde(rename = "cerrado")]
    Closed,
}

/// A cash-register shift as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Unique identifier
    pub id: i64,
    /// When the shift was opened
    #[serde(rename = "fecha_apertura")]
    pub opened_at: DateTime<Utc>,
    /// When the shift was closed; `None` while open
    #[serde(rename = "fecha_cierre", default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Open or closed
    #[serde(rename = "estado")]
    pub state: ShiftState,
    /// Cash declared at opening
    #[serde(rename = "monto_apertura", default, deserialize_with = "amount::lenient")]
    pub opening_amount: Decimal,
    /// Expected cash, opening amount included
    #[serde(
        rename = "efectivo_esperado",
        default,
        deserialize_with = "amount::lenient"
    )]
    pub expected_cash: Decimal,
    /// Expected transfer total
    #[serde(
        rename = "transferencia_esperada",
        default,
        deserialize_with = "amount::lenient"
    )]
    pub expected_transfer: Decimal,
    /// Expected deposit total
    #[serde(rename = "seña_esperada", default, deserialize_with = "amount::lenient")]
    pub expected_deposit: Decimal,
    /// Cash counted at close
    #[serde(
        rename = "monto_cierre_efectivo",
        default,
        deserialize_with = "amount::lenient_opt"
    )]
    pub counted_cash: Option<Decimal>,
    /// Transfers counted at close
    #[serde(
        rename = "monto_cierre_transferencia",
        default,
        deserialize_with = "amount::lenient_opt"
    )]
    pub counted_transfer: Option<Decimal>,
    /// Deposits counted at close
    #[serde(
        rename = "monto_cierre_seña",
        default,
        deserialize_with = "amount::lenient_opt"
    )]
    pub counted_deposit: Option<Decimal>,
    /// Server-computed cash difference
    #[serde(
        rename = "diferencia_efectivo",
        default,
        deserialize_with = "amount::lenient_opt"
    )]
    pub difference_cash: Option<Decimal>,
    /// Server-computed transfer difference
    #[serde(
        rename = "diferencia_transferencia",
        default,
        deserialize_with = "amount::lenient_opt"
    )]
    pub difference_transfer: Option<Decimal>,
    /// Server-computed deposit difference
    #[serde(
        rename = "diferencia_seña",
        default,
        deserialize_with = "amount::lenient_opt"
    )]
    pub difference_deposit: Option<Decimal>,
    /// Server-computed total difference
    #[serde(
        rename = "diferencia_total",
        default,
        deserialize_with = "amount::lenient_opt"
    )]
    pub difference_total: Option<Decimal>,
    /// Cash expenses recorded during the shift
    #[serde(
        rename = "total_egresos_efectivo",
        default,
        deserialize_with = "amount::lenient_opt"
    )]
    pub expenses_cash: Option<Decimal>,
    /// Transfer expenses recorded during the shift
    #[serde(
        rename = "total_egresos_transferencia",
        default,
        deserialize_with = "amount::lenient_opt"
    )]
    pub expenses_transfer: Option<Decimal>,
    /// Deposit expenses recorded during the shift
    #[serde(
        rename = "total_egresos_seña",
        default,
        deserialize_with = "amount::lenient_opt"
    )]
    pub expenses_deposit: Option<Decimal>,
    /// Operator notes entered at close
    #[serde(rename = "observaciones", default)]
    pub observations: Option<String>,
}

impl Shift {
    /// Whether the shift still accepts movements.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ShiftState::Open
    }

    /// Expected totals per method as maintained by the ledger.
    #[must_use]
    pub const fn expected(&self) -> MethodTotals {
        MethodTotals::new(
            self.expected_cash,
            self.expected_transfer,
            self.expected_deposit,
        )
    }

    /// Expense subtotals reported by the ledger at close, zero where missing.
    #[must_use]
    pub fn reported_expenses(&self) -> MethodTotals {
        MethodTotals::new(
            self.expenses_cash.unwrap_or_default(),
            self.expenses_transfer.unwrap_or_default(),
            self.expenses_deposit.unwrap_or_default(),
        )
    }
}
