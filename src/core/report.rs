//! Operator-facing text.
//!
//! This module turns shifts, movements and reconciliations into the strings the bot
//! shows. Nothing here talks to the ledger; every function is pure so the output can be
//! checked in tests without Discord.

use crate::{
    core::{
        aggregate::LedgerTotals,
        money::format_currency,
        reconcile::{Reconciliation, Standing},
    },
    entities::{Movement, MovementKind, PaymentMethod, Shift, ShiftState},
};
use rust_decimal::Decimal;

/// Date/time format used for shift timestamps.
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

fn method_heading(method: PaymentMethod) -> String {
    let icon = match method {
        PaymentMethod::Cash => "💵",
        PaymentMethod::Transfer => "🏦",
        PaymentMethod::Deposit => "💰",
        PaymentMethod::Card => "💳",
        PaymentMethod::Unknown => "❔",
    };
    format!("{icon} {}", method.label())
}

/// Renders the close summary.
///
/// One block per reconciled method with the expected and counted amounts, the absolute
/// difference with its marker and the expenses recorded with that method, followed by
/// the total line. Callers pass the ledger-derived report once the shift is closed and
/// the local preview before confirming.
///
/// # Arguments
/// * `report` - Reconciliation to render
///
/// # Returns
/// Multi-line text ending with `🎯 DIFERENCIA TOTAL: $x (Sobrante|Faltante)`
#[must_use]
pub fn close_summary(report: &Reconciliation) -> String {
    let mut out = String::new();
    for line in &report.lines {
        out.push_str(&format!(
            "{}\n  Esperado: {}\n  Contado: {}\n  Diferencia: {} {}\n  Egresos: {}\n\n",
            method_heading(line.method),
            format_currency(line.expected),
            format_currency(line.counted),
            format_currency(line.difference.abs()),
            line.standing.marker(),
            format_currency(line.expenses)
        ));
    }
    out.push_str(&total_line(report.total_difference.abs(), report.total_standing));
    out
}

fn total_line(magnitude: Decimal, standing: Standing) -> String {
    format!(
        "🎯 DIFERENCIA TOTAL: {} ({})",
        format_currency(magnitude),
        standing.label()
    )
}

/// Describes the active shift, or its absence.
#[must_use]
pub fn shift_status(shift: Option<&Shift>) -> String {
    let Some(shift) = shift else {
        return "🔒 No shift is open. Use `/shift open` to start one.".to_string();
    };

    let expected = shift.expected();
    format!(
        "🟢 Shift #{} open since {}\n\
         Opening cash: {}\n\
         💵 EFECTIVO esperado: {}\n\
         🏦 TRANSFERENCIA esperada: {}\n\
         💰 SEÑAS esperadas: {}",
        shift.id,
        shift.opened_at.format(TIMESTAMP_FORMAT),
        format_currency(shift.opening_amount),
        format_currency(expected.cash),
        format_currency(expected.transfer),
        format_currency(expected.deposit)
    )
}

/// One row of the shift history.
///
/// Closed shifts show their total difference classified the same way as the close
/// summary; shifts without a recorded difference show a dash.
#[must_use]
pub fn history_line(shift: &Shift) -> String {
    let opened = shift.opened_at.format(TIMESTAMP_FORMAT);
    match shift.state {
        ShiftState::Open => format!("#{} · {opened} · 🟢 abierto", shift.id),
        ShiftState::Closed => {
            let closed = shift
                .closed_at
                .map_or_else(|| "?".to_string(), |at| at.format(TIMESTAMP_FORMAT).to_string());
            let difference = shift.difference_total.map_or_else(
                || "-".to_string(),
                |total| {
                    let standing = Standing::classify(total);
                    format!(
                        "{} {} ({})",
                        format_currency(total.abs()),
                        standing.marker(),
                        standing.label()
                    )
                },
            );
            format!("#{} · {opened} → {closed} · {difference}", shift.id)
        }
    }
}

/// One row of a movement listing.
///
/// # Arguments
/// * `movement` - Movement to describe
/// * `editable` - Whether it can still be edited or deleted (adds a ✏️ marker)
#[must_use]
pub fn movement_line(movement: &Movement, editable: bool) -> String {
    let sign = match movement.kind {
        MovementKind::Income => "+",
        MovementKind::Expense => "-",
    };
    let when = movement.time.map_or_else(
        || movement.date.format("%d/%m").to_string(),
        |time| format!("{} {}", movement.date.format("%d/%m"), time.format("%H:%M")),
    );
    let category = movement
        .category
        .as_deref()
        .map(|c| format!(" [{c}]"))
        .unwrap_or_default();
    let lock = if editable { " ✏️" } else { "" };

    format!(
        "`#{}` {when} {sign}{} {}{category} · {}{lock}",
        movement.id,
        format_currency(movement.amount),
        movement.method.label(),
        movement.description,
    )
}

/// Footer with income, expense and balance over a listing.
#[must_use]
pub fn totals_line(totals: &LedgerTotals) -> String {
    format!(
        "Ingresos: {} · Egresos: {} · Balance: {}",
        format_currency(totals.income),
        format_currency(totals.expense),
        format_currency(totals.balance)
    )
}
