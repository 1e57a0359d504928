//! Shift ledger aggregation.
//!
//! Pure functions over movement listings: expense subtotals per payment method for one
//! shift (shown beside the counted amounts at close), page-wide income/expense totals,
//! and the de-duplicated, newest-first ordering used for display.

use crate::{
    entities::{MethodTotals, Movement, MovementKind},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Income, expense and balance over a set of movements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    /// Sum of income movements
    pub income: Decimal,
    /// Sum of expense movements
    pub expense: Decimal,
    /// `income - expense`
    pub balance: Decimal,
}

/// Sums the expense movements of `shift_id` per payment method.
///
/// Income movements, movements of other shifts and movements whose method is outside
/// reconciliation (card, unknown) do not contribute. The result does not depend on the
/// order of `movements`; methods without expenses report zero.
///
/// # Errors
/// [`Error::AmountOutOfRange`] if a method's expenses add up past the decimal range.
pub fn expenses_by_method(movements: &[Movement], shift_id: i64) -> Result<MethodTotals> {
    let mut totals = MethodTotals::default();
    for movement in movements
        .iter()
        .filter(|m| m.shift_id == shift_id && m.kind == MovementKind::Expense)
    {
        if !totals.add(movement.method, movement.amount)? {
            tracing::debug!(
                movement_id = movement.id,
                method = %movement.method,
                "Ignoring expense with a method outside reconciliation"
            );
        }
    }
    Ok(totals)
}

/// Totals over every movement given, regardless of shift.
///
/// # Errors
/// [`Error::AmountOutOfRange`] naming the method of the movement whose amount no longer
/// fits in the running sum.
pub fn ledger_totals(movements: &[Movement]) -> Result<LedgerTotals> {
    let mut totals = LedgerTotals::default();
    for m in movements {
        let out_of_range = || Error::AmountOutOfRange { method: m.method };
        match m.kind {
            MovementKind::Income => {
                totals.income = totals.income.checked_add(m.amount).ok_or_else(out_of_range)?;
                totals.balance = totals.balance.checked_add(m.amount).ok_or_else(out_of_range)?;
            }
            MovementKind::Expense => {
                totals.expense = totals.expense.checked_add(m.amount).ok_or_else(out_of_range)?;
                totals.balance = totals.balance.checked_sub(m.amount).ok_or_else(out_of_range)?;
            }
        }
    }
    Ok(totals)
}

/// Movements belonging to `shift_id`, in their original order.
#[must_use]
pub fn movements_for_shift(movements: &[Movement], shift_id: i64) -> Vec<Movement> {
    movements
        .iter()
        .filter(|m| m.shift_id == shift_id)
        .cloned()
        .collect()
}

/// De-duplicates by id (the last occurrence wins) and sorts newest first.
///
/// Ties on date and time are broken by descending id so the output is deterministic.
#[must_use]
pub fn normalize_movements(movements: Vec<Movement>) -> Vec<Movement> {
    let mut by_id: HashMap<i64, Movement> = HashMap::with_capacity(movements.len());
    for movement in movements {
        by_id.insert(movement.id, movement);
    }

    let mut unique: Vec<Movement> = by_id.into_values().collect();
    unique.sort_by(|a, b| {
        b.occurred_at()
            .cmp(&a.occurred_at())
            .then_with(|| b.id.cmp(&a.id))
    });
    unique
}
