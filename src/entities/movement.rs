//! Movement entity - a single cash-drawer entry recorded against a shift.
//!
//! Field names on the wire follow the ledger API (`turno`, `tipo`, `monto`, ...).
//! Unknown payment methods are kept as [`PaymentMethod::Unknown`] so that a
//! listing never fails because of one odd row.

use super::{Shift, amount};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Direction of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    /// Money coming into the register
    #[serde(rename = "ingreso")]
    Income,
    /// Money going out of the register
    #[serde(rename = "egreso")]
    Expense,
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => f.write_str("income"),
            Self::Expense => f.write_str("expense"),
        }
    }
}

/// Payment method of a movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash in the drawer
    #[default]
    #[serde(rename = "efectivo")]
    Cash,
    /// Bank transfer
    #[serde(rename = "transferencia")]
    Transfer,
    /// Card payment. Only valid for income.
    #[serde(rename = "tarjeta")]
    Card,
    /// Deposit ("seña") paid in advance for a booking
    #[serde(rename = "seña")]
    Deposit,
    /// Any value the ledger sends that this crate does not know about
    #[serde(other)]
    Unknown,
}

impl PaymentMethod {
    /// Whether an expense may be paid with this method.
    #[must_use]
    pub const fn allowed_for_expense(self) -> bool {
        matches!(self, Self::Cash | Self::Transfer | Self::Deposit)
    }

    /// Operator-facing label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cash => "EFECTIVO",
            Self::Transfer => "TRANSFERENCIA",
            Self::Card => "TARJETA",
            Self::Deposit => "SEÑAS",
            Self::Unknown => "OTRO",
        }
    }

    /// Null means cash, the same default the register screen applies.
    fn lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Self>::deserialize(deserializer)?.unwrap_or_default())
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cash => "cash",
            Self::Transfer => "transfer",
            Self::Card => "card",
            Self::Deposit => "deposit",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A movement as listed by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Unique identifier
    pub id: i64,
    /// Owning shift
    #[serde(rename = "turno")]
    pub shift_id: i64,
    /// Income or expense
    #[serde(rename = "tipo")]
    pub kind: MovementKind,
    /// Non-negative amount
    #[serde(rename = "monto", default, deserialize_with = "amount::lenient")]
    pub amount: Decimal,
    /// Free-text description
    #[serde(rename = "descripcion", default)]
    pub description: String,
    /// Payment method; null or missing means cash
    #[serde(
        rename = "metodo_pago",
        default,
        deserialize_with = "PaymentMethod::lenient"
    )]
    pub method: PaymentMethod,
    /// Descriptive category tag (`servicios`, `gastos`, ...)
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    /// Date the movement occurred
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    /// Time the movement occurred, when the ledger recorded it
    #[serde(rename = "hora", default)]
    pub time: Option<NaiveTime>,
    /// Server flag: true while the owning shift is open
    #[serde(rename = "es_editable", default)]
    pub editable: bool,
}

impl Movement {
    /// Date and time used for ordering; a missing time counts as midnight.
    #[must_use]
    pub fn occurred_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }

    /// Whether this movement may still be edited or deleted given the currently
    /// open shift. The server flag alone is not enough: the movement must belong to
    /// the shift that is open right now.
    #[must_use]
    pub fn is_editable_under(&self, active: Option<&Shift>) -> bool {
        self.editable && active.is_some_and(|shift| shift.is_open() && shift.id == self.shift_id)
    }
}
