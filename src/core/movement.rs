//! Movement drafts - validation of operator-entered movements before they reach the
//! ledger.
//!
//! Rules: the amount must be strictly positive, the description non-blank, and an
//! expense can only be paid in cash, by transfer or out of deposits. The date defaults
//! to today's local date.

use crate::{
    core::money::parse_amount,
    entities::{MovementKind, PaymentMethod},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Category tags offered to the operator. Others are accepted as free text.
pub const KNOWN_CATEGORIES: [&str; 7] = [
    "servicios",
    "productos",
    "gastos",
    "sueldos",
    "alquiler",
    "servicios_publicos",
    "otros",
];

/// Category used when the operator does not pick one.
pub const DEFAULT_CATEGORY: &str = "servicios";

/// Unvalidated movement as entered by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementDraft {
    /// Income or expense
    pub kind: MovementKind,
    /// Raw amount text
    pub amount: String,
    /// Description
    pub description: String,
    /// Payment method
    pub method: PaymentMethod,
    /// Category tag; `None` uses [`DEFAULT_CATEGORY`]
    pub category: Option<String>,
    /// Date; `None` means today
    pub date: Option<NaiveDate>,
}

/// Validated movement body sent to the ledger on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMovement {
    /// Income or expense
    #[serde(rename = "tipo")]
    pub kind: MovementKind,
    /// Strictly positive amount
    #[serde(rename = "monto")]
    pub amount: Decimal,
    /// Trimmed, non-empty description
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Payment method
    #[serde(rename = "metodo_pago")]
    pub method: PaymentMethod,
    /// Category tag
    #[serde(rename = "categoria")]
    pub category: String,
    /// Date of the movement
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
}

impl MovementDraft {
    /// Validates the draft, filling defaults relative to `today`.
    ///
    /// # Errors
    /// [`Error::InvalidMovement`] describing the first rule that failed.
    pub fn validate(&self, today: NaiveDate) -> Result<NewMovement> {
        let amount = parse_amount(&self.amount).map_err(|e| Error::InvalidMovement {
            reason: e.to_string(),
        })?;
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidMovement {
                reason: "amount must be greater than zero".to_string(),
            });
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err(Error::InvalidMovement {
                reason: "a description is required".to_string(),
            });
        }

        if self.method == PaymentMethod::Unknown {
            return Err(Error::InvalidMovement {
                reason: "unknown payment method".to_string(),
            });
        }
        if self.kind == MovementKind::Expense && !self.method.allowed_for_expense() {
            return Err(Error::InvalidMovement {
                reason: format!("expenses cannot be paid by {}", self.method),
            });
        }

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();

        Ok(NewMovement {
            kind: self.kind,
            amount,
            description: description.to_string(),
            method: self.method,
            category,
            date: self.date.unwrap_or(today),
        })
    }
}
