//! Shift session controller.
//!
//! One [`ShiftSession`] per process owns the "current shift" state. It is refreshed
//! explicitly (after opening, after closing, and before any action whose precondition
//! depends on it) and read through [`ShiftSession::current`]. The ledger remains the
//! source of truth; the cached shift is only what the operator is shown.
//!
//! Nothing here retries. A failed call leaves both the ledger and the cached state as
//! they were, and the operator repeats the action if they want to. Once the ledger has
//! accepted a write, the action counts as done: a failed refresh afterwards is only
//! logged.

use crate::{
    core::{
        aggregate,
        money::parse_amount,
        movement::MovementDraft,
        reconcile::{CloseRequest, CountedAmounts, Reconciliation},
    },
    entities::{MethodTotals, Movement, Shift},
    errors::{Error, Result},
    ledger::Ledger,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

const NO_ACTIVE_SHIFT: &str = "No active shift found. Open the register first.";

/// Everything the close dialog shows before the operator confirms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseContext {
    /// The shift being closed, as freshly read from the ledger
    pub shift: Shift,
    /// Ledger's expected totals
    pub expected: MethodTotals,
    /// Expense subtotals recorded during the shift
    pub expenses: MethodTotals,
    /// Suggested counted amounts (the expected totals)
    pub prefilled: CountedAmounts,
}

/// Result of a successful close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseOutcome {
    /// The closed shift returned by the ledger
    pub shift: Shift,
    /// Client-side preview computed just before submitting
    pub preview: Reconciliation,
    /// Authoritative report built from the ledger's differences, or `None` when the
    /// ledger closed the shift but left some of them out
    pub report: Option<Reconciliation>,
    /// Whether the preview disagreed with the ledger's report
    pub diverged: bool,
}

/// Clears the in-flight flag when the close attempt ends, however it ends.
struct CloseGuard<'a>(&'a AtomicBool);

impl<'a> CloseGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for CloseGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Process-wide owner of the current shift state.
#[derive(Debug)]
pub struct ShiftSession<L> {
    ledger: L,
    current: RwLock<Option<Shift>>,
    closing: AtomicBool,
}

impl<L: Ledger> ShiftSession<L> {
    /// Creates a session with no known shift. Call [`ShiftSession::refresh`] to load it.
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            current: RwLock::new(None),
            closing: AtomicBool::new(false),
        }
    }

    /// The shift last seen open, without contacting the ledger.
    pub async fn current(&self) -> Option<Shift> {
        self.current.read().await.clone()
    }

    /// Whether a close request is being processed right now.
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// Re-reads the active shift from the ledger and caches it.
    ///
    /// # Errors
    /// Transport errors from the ledger; the cached state is left untouched.
    pub async fn refresh(&self) -> Result<Option<Shift>> {
        let active = self.ledger.active_shift().await?;
        *self.current.write().await = active.clone();
        Ok(active)
    }

    /// Refreshes after a write the ledger has accepted; failures are logged only.
    async fn refresh_after_write(&self, action: &str) {
        if let Err(e) = self.refresh().await {
            warn!("Could not refresh after {action}: {e}");
        }
    }

    async fn require_open(&self) -> Result<Shift> {
        self.refresh()
            .await?
            .ok_or_else(|| Error::conflict(NO_ACTIVE_SHIFT))
    }

    /// Opens a new shift with the operator's text input for the opening cash.
    ///
    /// # Errors
    /// See [`ShiftSession::open`]; unparsable input is an
    /// [`Error::InvalidOpeningAmount`] and nothing is sent.
    pub async fn open_with_input(&self, input: &str) -> Result<Shift> {
        let amount = parse_amount(input).map_err(|e| Error::InvalidOpeningAmount {
            reason: e.to_string(),
        })?;
        self.open(amount).await
    }

    /// Opens a new shift.
    ///
    /// # Errors
    /// - [`Error::InvalidOpeningAmount`] for a negative amount (nothing is sent)
    /// - [`Error::Conflict`] if a shift is already open
    /// - transport errors from the ledger
    #[instrument(skip(self))]
    pub async fn open(&self, opening_amount: Decimal) -> Result<Shift> {
        if opening_amount < Decimal::ZERO {
            return Err(Error::InvalidOpeningAmount {
                reason: "must not be negative".to_string(),
            });
        }

        if let Some(existing) = self.refresh().await? {
            return Err(Error::conflict(format!(
                "Shift #{} is already open. Close it before opening a new one.",
                existing.id
            )));
        }

        let opened = self.ledger.open_shift(opening_amount).await?;
        info!(shift_id = opened.id, %opening_amount, "Shift opened");
        *self.current.write().await = Some(opened.clone());

        match self.refresh().await {
            Ok(Some(shift)) => Ok(shift),
            Ok(None) => {
                warn!(shift_id = opened.id, "Opened shift not reported as active yet");
                Ok(opened)
            }
            Err(e) => {
                warn!(shift_id = opened.id, "Could not refresh after opening: {e}");
                Ok(opened)
            }
        }
    }

    /// All movements, de-duplicated and newest first.
    ///
    /// # Errors
    /// Transport errors from the ledger.
    pub async fn movements(&self) -> Result<Vec<Movement>> {
        Ok(aggregate::normalize_movements(
            self.ledger.list_movements().await?,
        ))
    }

    /// Records a movement against the open shift.
    ///
    /// # Errors
    /// - [`Error::InvalidMovement`] if the draft is invalid (nothing is sent)
    /// - [`Error::Conflict`] if no shift is open
    /// - transport errors from the ledger before the movement is created
    #[instrument(skip(self, draft))]
    pub async fn record_movement(
        &self,
        draft: &MovementDraft,
        today: NaiveDate,
    ) -> Result<Movement> {
        let body = draft.validate(today)?;
        let shift = self.require_open().await?;

        let created = self.ledger.create_movement(&body).await?;
        info!(
            shift_id = shift.id,
            movement_id = created.id,
            kind = %created.kind,
            method = %created.method,
            amount = %created.amount,
            "Movement recorded"
        );
        self.refresh_after_write("recording a movement").await;
        Ok(created)
    }

    /// Finds a movement that may still be changed under the open shift.
    async fn editable_movement(&self, id: i64) -> Result<Movement> {
        let shift = self.require_open().await?;
        let movement = self
            .ledger
            .list_movements()
            .await?
            .into_iter()
            .find(|m| m.id == id)
            .ok_or(Error::MovementNotFound { id })?;

        if !movement.is_editable_under(Some(&shift)) {
            return Err(Error::MovementLocked { id });
        }
        Ok(movement)
    }

    /// Replaces a movement of the open shift.
    ///
    /// # Errors
    /// - [`Error::InvalidMovement`] if the draft is invalid (nothing is sent)
    /// - [`Error::MovementNotFound`] / [`Error::MovementLocked`] if it cannot be changed
    /// - [`Error::Conflict`] if no shift is open
    /// - transport errors from the ledger before the movement is replaced
    #[instrument(skip(self, draft))]
    pub async fn update_movement(
        &self,
        id: i64,
        draft: &MovementDraft,
        today: NaiveDate,
    ) -> Result<Movement> {
        let body = draft.validate(today)?;
        self.editable_movement(id).await?;

        let updated = self.ledger.update_movement(id, &body).await?;
        info!(movement_id = id, amount = %updated.amount, "Movement updated");
        self.refresh_after_write("updating a movement").await;
        Ok(updated)
    }

    /// Deletes a movement of the open shift.
    ///
    /// # Errors
    /// Same as [`ShiftSession::update_movement`], minus draft validation.
    #[instrument(skip(self))]
    pub async fn delete_movement(&self, id: i64) -> Result<Movement> {
        let movement = self.editable_movement(id).await?;

        self.ledger.delete_movement(id).await?;
        info!(movement_id = id, "Movement deleted");
        self.refresh_after_write("deleting a movement").await;
        Ok(movement)
    }

    /// Data for the close dialog: expected totals, expense subtotals and prefilled
    /// counted amounts for the open shift.
    ///
    /// # Errors
    /// [`Error::Conflict`] if no shift is open, [`Error::AmountOutOfRange`] if the
    /// shift's expenses cannot be added up, and transport errors from the ledger.
    pub async fn close_context(&self) -> Result<CloseContext> {
        let shift = self.require_open().await?;
        let movements = self.ledger.list_movements().await?;
        let expected = shift.expected();

        Ok(CloseContext {
            expenses: aggregate::expenses_by_method(&movements, shift.id)?,
            prefilled: CountedAmounts::prefilled(expected),
            expected,
            shift,
        })
    }

    /// Client-side preview of the reconciliation for the open shift.
    ///
    /// # Errors
    /// Same as [`ShiftSession::close_context`], plus [`Error::InvalidCountedAmount`] if
    /// the differences do not fit in a decimal.
    pub async fn preview_close(&self, counted: &CountedAmounts) -> Result<Reconciliation> {
        let context = self.close_context().await?;
        Reconciliation::preview(context.expected, counted, context.expenses)
    }

    /// Validates raw operator input, then closes. Invalid input never reaches the
    /// ledger.
    ///
    /// # Errors
    /// [`Error::InvalidCountedAmount`] for invalid input, otherwise as
    /// [`ShiftSession::close`].
    pub async fn close_with_inputs(
        &self,
        cash: Option<&str>,
        transfer: Option<&str>,
        deposit: Option<&str>,
        observations: Option<&str>,
    ) -> Result<CloseOutcome> {
        let counted = CountedAmounts::from_inputs(cash, transfer, deposit)?;
        self.close(&counted, observations).await
    }

    /// Closes the open shift with the counted amounts.
    ///
    /// Only one close can be in flight at a time. The active shift is re-read right
    /// before submitting. On success the cached shift is cleared and the report is
    /// rebuilt from the ledger's own differences; a disagreement with the local preview
    /// is logged and flagged in the outcome. A closed shift that lacks those differences
    /// still counts as closed and comes back without a report.
    ///
    /// # Errors
    /// - [`Error::CloseInFlight`] if another close is running
    /// - [`Error::Conflict`] if no shift is open
    /// - [`Error::InvalidCountedAmount`] if the preview does not fit in a decimal
    ///   (nothing is sent)
    /// - transport errors from the ledger (the shift stays open)
    #[instrument(skip(self, counted, observations))]
    pub async fn close(
        &self,
        counted: &CountedAmounts,
        observations: Option<&str>,
    ) -> Result<CloseOutcome> {
        let _guard = CloseGuard::acquire(&self.closing).ok_or(Error::CloseInFlight)?;

        let context = self.close_context().await?;
        let preview = Reconciliation::preview(context.expected, counted, context.expenses)?;
        let request = CloseRequest::new(counted, observations);

        let closed = self.ledger.close_shift(context.shift.id, &request).await?;
        info!(
            shift_id = closed.id,
            total_difference = ?closed.difference_total,
            "Shift closed"
        );
        *self.current.write().await = None;

        self.refresh_after_write("closing").await;

        let report = Reconciliation::from_closed_shift(&closed)
            .inspect_err(|e| warn!(shift_id = closed.id, "Ledger report is incomplete: {e}"))
            .ok();
        let diverged = match &report {
            Some(report) if preview.diverges_from(report) => {
                warn!(
                    shift_id = closed.id,
                    preview_total = %preview.total_difference,
                    ledger_total = %report.total_difference,
                    "Close preview disagrees with the ledger; reporting the ledger's figures"
                );
                true
            }
            _ => false,
        };

        Ok(CloseOutcome {
            shift: closed,
            preview,
            report,
            diverged,
        })
    }

    /// Past shifts, newest first as the ledger lists them.
    ///
    /// # Errors
    /// Transport errors from the ledger.
    pub async fn history(&self) -> Result<Vec<Shift>> {
        self.ledger.shift_history().await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{MovementKind, PaymentMethod};
    use crate::errors::ErrorKind;
    use crate::test_utils::{FakeLedger, amount, movement, totals};
    use std::sync::Arc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    fn draft(kind: MovementKind, value: &str, method: PaymentMethod) -> MovementDraft {
        MovementDraft {
            kind,
            amount: value.to_string(),
            description: "Corte".to_string(),
            method,
            category: None,
            date: None,
        }
    }

    #[tokio::test]
    async fn test_open_then_current() -> Result<()> {
        let session = ShiftSession::new(FakeLedger::default());
        assert!(session.current().await.is_none());

        let shift = session.open(amount("500")).await?;
        assert!(shift.is_open());
        assert_eq!(shift.expected_cash, amount("500"));
        assert_eq!(session.current().await.map(|s| s.id), Some(shift.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_open_rejects_negative_without_calls() {
        let ledger = FakeLedger::default();
        let session = ShiftSession::new(ledger.clone());

        let err = session.open(amount("-1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = session.open_with_input("mil").await.unwrap_err();
        assert!(matches!(err, Error::InvalidOpeningAmount { .. }));
        assert_eq!(ledger.call_count(), 0);
    }

    #[tokio::test]
    async fn test_open_conflicts_with_open_shift() -> Result<()> {
        let session = ShiftSession::new(FakeLedger::default());
        session.open(amount("100")).await?;

        let err = session.open(amount("100")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_requires_open_shift() {
        let session = ShiftSession::new(FakeLedger::default());
        let err = session
            .record_movement(&draft(MovementKind::Income, "100", PaymentMethod::Cash), today())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_record_invalid_draft_sends_nothing() {
        let ledger = FakeLedger::default();
        let session = ShiftSession::new(ledger.clone());
        let err = session
            .record_movement(&draft(MovementKind::Expense, "100", PaymentMethod::Card), today())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ledger.call_count(), 0);
    }

    #[tokio::test]
    async fn test_record_updates_expected_totals() -> Result<()> {
        let session = ShiftSession::new(FakeLedger::default());
        session.open(amount("500")).await?;
        session
            .record_movement(&draft(MovementKind::Income, "1.000", PaymentMethod::Cash), today())
            .await?;
        session
            .record_movement(&draft(MovementKind::Income, "250", PaymentMethod::Transfer), today())
            .await?;

        let current = session.current().await.unwrap();
        assert_eq!(current.expected(), totals("1500", "250", "0"));
        Ok(())
    }

    #[tokio::test]
    async fn test_write_survives_failed_refresh() -> Result<()> {
        let ledger = FakeLedger::default();
        let session = ShiftSession::new(ledger.clone());
        session.open(amount("0")).await?;

        // The precondition read succeeds; the read after the create fails.
        ledger.fail_active_shift_after(1);
        let created = session
            .record_movement(&draft(MovementKind::Income, "150", PaymentMethod::Cash), today())
            .await?;
        assert_eq!(session.movements().await?.len(), 1);

        ledger.fail_active_shift_after(1);
        session.delete_movement(created.id).await?;
        assert!(session.movements().await?.is_empty());
        assert!(session.current().await.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_movements_of_closed_shift_are_locked() -> Result<()> {
        let ledger = FakeLedger::default();
        let session = ShiftSession::new(ledger.clone());
        ledger.insert_movement(movement(99, 1, MovementKind::Income, PaymentMethod::Cash, "10"));
        session.open(amount("0")).await?;

        let err = session.delete_movement(99).await.unwrap_err();
        assert!(matches!(err, Error::MovementLocked { id: 99 }));
        let err = session.delete_movement(12345).await.unwrap_err();
        assert!(matches!(err, Error::MovementNotFound { id: 12345 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_and_delete_open_shift_movement() -> Result<()> {
        let session = ShiftSession::new(FakeLedger::default());
        session.open(amount("0")).await?;
        let created = session
            .record_movement(&draft(MovementKind::Expense, "80", PaymentMethod::Cash), today())
            .await?;

        let replacement = draft(MovementKind::Expense, "90", PaymentMethod::Transfer);
        let updated = session
            .update_movement(created.id, &replacement, today())
            .await?;
        assert_eq!(updated.amount, amount("90"));
        assert_eq!(updated.method, PaymentMethod::Transfer);

        session.delete_movement(created.id).await?;
        assert!(session.movements().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_close_context_aggregates_expenses() -> Result<()> {
        let session = ShiftSession::new(FakeLedger::default());
        session.open(amount("1000")).await?;
        for (value, method) in [
            ("300", PaymentMethod::Cash),
            ("50", PaymentMethod::Cash),
            ("20", PaymentMethod::Deposit),
        ] {
            session
                .record_movement(&draft(MovementKind::Expense, value, method), today())
                .await?;
        }

        let context = session.close_context().await?;
        assert_eq!(context.expenses, totals("350", "0", "20"));
        assert_eq!(context.expected, totals("650", "0", "-20"));
        assert_eq!(context.prefilled.totals(), totals("650", "0", "0"));
        Ok(())
    }

    #[tokio::test]
    async fn test_preview_close_sends_nothing() -> Result<()> {
        let ledger = FakeLedger::default();
        let session = ShiftSession::new(ledger.clone());
        session.open(amount("1000")).await?;

        let counted = CountedAmounts::from_inputs(Some("1100"), Some("0"), Some("0"))?;
        let preview = session.preview_close(&counted).await?;
        assert_eq!(preview.total_difference, amount("100"));
        assert!(session.current().await.is_some_and(|s| s.is_open()));
        assert!(session.history().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_close_reports_server_figures() -> Result<()> {
        let session = ShiftSession::new(FakeLedger::default());
        session.open(amount("1000")).await?;

        let outcome = session
            .close_with_inputs(Some("950"), Some("0"), Some("0"), Some("cierre"))
            .await?;
        assert!(!outcome.diverged);
        assert_eq!(outcome.report.unwrap().total_difference, amount("-50"));
        assert_eq!(outcome.shift.observations.as_deref(), Some("cierre"));
        assert!(session.current().await.is_none());
        assert_eq!(session.history().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_close_flags_server_divergence() -> Result<()> {
        let ledger = FakeLedger::default();
        let session = ShiftSession::new(ledger.clone());
        session.open(amount("1000")).await?;
        ledger.skew_close_differences(amount("25"));

        let outcome = session
            .close_with_inputs(Some("1000"), Some("0"), Some("0"), None)
            .await?;
        assert!(outcome.diverged);
        assert_eq!(outcome.preview.total_difference, Decimal::ZERO);
        assert_eq!(outcome.report.unwrap().total_difference, amount("25"));
        Ok(())
    }

    #[tokio::test]
    async fn test_close_with_incomplete_ledger_report_is_still_closed() -> Result<()> {
        let ledger = FakeLedger::default();
        let session = ShiftSession::new(ledger.clone());
        let opened = session.open(amount("300")).await?;
        ledger.omit_next_close_total();

        let outcome = session
            .close_with_inputs(Some("300"), Some("0"), Some("0"), None)
            .await?;
        assert_eq!(outcome.shift.id, opened.id);
        assert!(outcome.report.is_none());
        assert!(!outcome.diverged);
        assert_eq!(outcome.preview.total_difference, Decimal::ZERO);
        assert!(session.current().await.is_none());
        assert_eq!(session.history().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_close_with_out_of_range_counts_sends_nothing() -> Result<()> {
        let session = ShiftSession::new(FakeLedger::default());
        let opened = session.open(amount("0")).await?;
        let max = Decimal::MAX.to_string();

        let err = session
            .close_with_inputs(Some(max.as_str()), Some(max.as_str()), Some("0"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!session.is_closing());
        assert_eq!(session.current().await.map(|s| s.id), Some(opened.id));
        assert!(session.history().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_close_rejects_invalid_input_without_calls() {
        let ledger = FakeLedger::default();
        let session = ShiftSession::new(ledger.clone());

        for (cash, transfer, deposit) in [
            (Some("-5"), Some("0"), Some("0")),
            (Some("0"), None, Some("0")),
            (Some("0"), Some("0"), Some("NaN")),
        ] {
            let err = session
                .close_with_inputs(cash, transfer, deposit, None)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert_eq!(ledger.call_count(), 0);
    }

    #[tokio::test]
    async fn test_close_without_open_shift_is_conflict() {
        let session = ShiftSession::new(FakeLedger::default());
        let err = session
            .close_with_inputs(Some("0"), Some("0"), Some("0"), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), NO_ACTIVE_SHIFT);
    }

    #[tokio::test]
    async fn test_failed_close_keeps_shift_open() -> Result<()> {
        let ledger = FakeLedger::default();
        let session = ShiftSession::new(ledger.clone());
        let opened = session.open(amount("200")).await?;
        ledger.fail_next_close(503, "Servicio no disponible");

        let err = session
            .close_with_inputs(Some("200"), Some("0"), Some("0"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(session.current().await.map(|s| s.id), Some(opened.id));
        assert!(!session.is_closing());

        // The operator retries explicitly.
        let outcome = session
            .close_with_inputs(Some("200"), Some("0"), Some("0"), None)
            .await?;
        assert_eq!(outcome.shift.id, opened.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_second_close_while_in_flight_is_rejected() -> Result<()> {
        let ledger = FakeLedger::default();
        let session = Arc::new(ShiftSession::new(ledger.clone()));
        session.open(amount("0")).await?;
        let release = ledger.hold_next_close();

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session
                    .close_with_inputs(Some("0"), Some("0"), Some("0"), None)
                    .await
            })
        };
        while !session.is_closing() {
            tokio::task::yield_now().await;
        }

        let err = session
            .close_with_inputs(Some("0"), Some("0"), Some("0"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CloseInFlight));

        release.notify_one();
        let outcome = first.await.unwrap()?;
        assert!(outcome.shift.closed_at.is_some());
        assert!(!session.is_closing());
        Ok(())
    }
}
