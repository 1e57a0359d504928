//! Shared test utilities for `CajaBuddy`.
//!
//! Fixture builders with sensible defaults, plus [`FakeLedger`], an in-memory ledger that
//! keeps expected totals the way the real back office does so the session controller
//! can be exercised end to end without HTTP.
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use crate::{
    core::{movement::NewMovement, reconcile::CloseRequest},
    entities::{MethodTotals, Movement, MovementKind, PaymentMethod, Shift, ShiftState},
    errors::{Error, Result},
    ledger::Ledger,
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Notify;

/// Parses a canonical decimal literal such as `"1234.50"`.
pub fn amount(value: &str) -> Decimal {
    Decimal::from_str_exact(value).unwrap()
}

/// Builds per-method totals from decimal literals.
pub fn totals(cash: &str, transfer: &str, deposit: &str) -> MethodTotals {
    MethodTotals::new(amount(cash), amount(transfer), amount(deposit))
}

fn fixture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap()
}

/// Creates an editable movement dated 2024-05-02 12:00.
///
/// # Defaults
/// * description: "Movimiento"
/// * category: none
pub fn movement(
    id: i64,
    shift_id: i64,
    kind: MovementKind,
    method: PaymentMethod,
    value: &str,
) -> Movement {
    Movement {
        id,
        shift_id,
        kind,
        amount: amount(value),
        description: "Movimiento".to_string(),
        method,
        category: None,
        date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        time: NaiveTime::from_hms_opt(12, 0, 0),
        editable: true,
    }
}

/// Creates a shift in the given state with zero amounts and no close figures.
pub fn shift_with_state(id: i64, state: ShiftState) -> Shift {
    Shift {
        id,
        opened_at: fixture_time(),
        closed_at: None,
        state,
        opening_amount: Decimal::ZERO,
        expected_cash: Decimal::ZERO,
        expected_transfer: Decimal::ZERO,
        expected_deposit: Decimal::ZERO,
        counted_cash: None,
        counted_transfer: None,
        counted_deposit: None,
        difference_cash: None,
        difference_transfer: None,
        difference_deposit: None,
        difference_total: None,
        expenses_cash: None,
        expenses_transfer: None,
        expenses_deposit: None,
        observations: None,
    }
}

/// Creates an open shift with zero amounts.
pub fn open_shift(id: i64) -> Shift {
    shift_with_state(id, ShiftState::Open)
}

/// Creates a closed shift as the ledger returns it; the total difference is the sum of
/// the per-method differences.
pub fn closed_shift(
    id: i64,
    expected: MethodTotals,
    counted: MethodTotals,
    differences: MethodTotals,
) -> Shift {
    Shift {
        closed_at: Some(fixture_time() + chrono::Duration::hours(10)),
        expected_cash: expected.cash,
        expected_transfer: expected.transfer,
        expected_deposit: expected.deposit,
        counted_cash: Some(counted.cash),
        counted_transfer: Some(counted.transfer),
        counted_deposit: Some(counted.deposit),
        difference_cash: Some(differences.cash),
        difference_transfer: Some(differences.transfer),
        difference_deposit: Some(differences.deposit),
        difference_total: differences.checked_sum(),
        ..shift_with_state(id, ShiftState::Closed)
    }
}

#[derive(Debug, Default)]
struct FakeState {
    open: Option<Shift>,
    history: Vec<Shift>,
    movements: Vec<Movement>,
    next_shift_id: i64,
    next_movement_id: i64,
    close_skew: Decimal,
    close_failure: Option<(u16, String)>,
    close_gate: Option<Arc<Notify>>,
    close_without_total: bool,
    active_shift_failure_in: Option<usize>,
}

/// In-memory [`Ledger`].
///
/// Expected totals follow the back office: opening cash plus income minus expenses, per
/// method. Shift ids start at 100 and movement ids at 1000 so hand-built fixtures with
/// small ids never collide with ledger-assigned ones. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeLedger {
    state: Arc<Mutex<FakeState>>,
    calls: Arc<AtomicUsize>,
}

impl FakeLedger {
    /// Number of ledger calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Adds a movement as if another client had recorded it.
    pub fn insert_movement(&self, movement: Movement) {
        self.state.lock().unwrap().movements.push(movement);
    }

    /// Makes the next close report a cash difference off by `skew`.
    pub fn skew_close_differences(&self, skew: Decimal) {
        self.state.lock().unwrap().close_skew = skew;
    }

    /// Makes the next close fail with an API error.
    pub fn fail_next_close(&self, status: u16, message: &str) {
        self.state.lock().unwrap().close_failure = Some((status, message.to_string()));
    }

    /// Makes the next close wait until the returned handle is notified.
    pub fn hold_next_close(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().close_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Makes the next close succeed but leave `diferencia_total` out of the closed shift.
    pub fn omit_next_close_total(&self) {
        self.state.lock().unwrap().close_without_total = true;
    }

    /// Lets `active_shift` answer `successes` more times, then fail once with a 502.
    pub fn fail_active_shift_after(&self, successes: usize) {
        self.state.lock().unwrap().active_shift_failure_in = Some(successes);
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn with_expected(state: &FakeState, mut shift: Shift) -> Shift {
        let mut expected = MethodTotals::new(shift.opening_amount, Decimal::ZERO, Decimal::ZERO);
        for m in state.movements.iter().filter(|m| m.shift_id == shift.id) {
            let signed = match m.kind {
                MovementKind::Income => m.amount,
                MovementKind::Expense => -m.amount,
            };
            expected.add(m.method, signed).unwrap();
        }
        shift.expected_cash = expected.cash;
        shift.expected_transfer = expected.transfer;
        shift.expected_deposit = expected.deposit;
        shift
    }

    fn not_found(id: i64) -> Error {
        Error::Api {
            status: 404,
            message: format!("Movimiento {id} no encontrado"),
        }
    }
}

impl Ledger for FakeLedger {
    async fn active_shift(&self) -> Result<Option<Shift>> {
        self.record_call();
        let mut state = self.state.lock().unwrap();
        let failure_in = state.active_shift_failure_in;
        match failure_in {
            Some(0) => {
                state.active_shift_failure_in = None;
                return Err(Error::Api {
                    status: 502,
                    message: "gateway".to_string(),
                });
            }
            Some(n) => state.active_shift_failure_in = Some(n - 1),
            None => {}
        }
        Ok(state.open.clone().map(|shift| Self::with_expected(&state, shift)))
    }

    async fn open_shift(&self, opening_amount: Decimal) -> Result<Shift> {
        self.record_call();
        let mut state = self.state.lock().unwrap();
        if state.open.is_some() {
            return Err(Error::conflict("Ya existe una caja abierta"));
        }
        let id = 100 + state.next_shift_id;
        state.next_shift_id += 1;

        let shift = Shift {
            opening_amount,
            expected_cash: opening_amount,
            ..open_shift(id)
        };
        state.open = Some(shift.clone());
        Ok(shift)
    }

    async fn list_movements(&self) -> Result<Vec<Movement>> {
        self.record_call();
        Ok(self.state.lock().unwrap().movements.clone())
    }

    async fn create_movement(&self, body: &NewMovement) -> Result<Movement> {
        self.record_call();
        let mut state = self.state.lock().unwrap();
        let shift_id = state
            .open
            .as_ref()
            .map(|s| s.id)
            .ok_or_else(|| Error::conflict("No hay ninguna caja abierta"))?;
        let id = 1000 + state.next_movement_id;
        state.next_movement_id += 1;

        let created = Movement {
            id,
            shift_id,
            kind: body.kind,
            amount: body.amount,
            description: body.description.clone(),
            method: body.method,
            category: Some(body.category.clone()),
            date: body.date,
            time: NaiveTime::from_hms_opt(12, 0, 0),
            editable: true,
        };
        state.movements.push(created.clone());
        Ok(created)
    }

    async fn update_movement(&self, id: i64, body: &NewMovement) -> Result<Movement> {
        self.record_call();
        let mut state = self.state.lock().unwrap();
        let existing = state
            .movements
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| Self::not_found(id))?;

        existing.kind = body.kind;
        existing.amount = body.amount;
        existing.description.clone_from(&body.description);
        existing.method = body.method;
        existing.category = Some(body.category.clone());
        existing.date = body.date;
        Ok(existing.clone())
    }

    async fn delete_movement(&self, id: i64) -> Result<()> {
        self.record_call();
        let mut state = self.state.lock().unwrap();
        let before = state.movements.len();
        state.movements.retain(|m| m.id != id);
        if state.movements.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    async fn close_shift(&self, shift_id: i64, request: &CloseRequest) -> Result<Shift> {
        self.record_call();
        let gate = self.state.lock().unwrap().close_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some((status, message)) = state.close_failure.take() {
            return Err(Error::Api { status, message });
        }
        let open = state
            .open
            .take_if(|s| s.id == shift_id)
            .ok_or_else(|| Error::conflict("No hay ninguna caja abierta"))?;
        let open = Self::with_expected(&state, open);

        let mut expenses = MethodTotals::default();
        for m in state
            .movements
            .iter()
            .filter(|m| m.shift_id == shift_id && m.kind == MovementKind::Expense)
        {
            expenses.add(m.method, m.amount).unwrap();
        }

        let counted = MethodTotals::new(
            request.counted_cash,
            request.counted_transfer,
            request.counted_deposit,
        );
        let skew = std::mem::take(&mut state.close_skew);
        let without_total = std::mem::take(&mut state.close_without_total);
        let differences = MethodTotals::new(
            counted.cash - open.expected_cash + skew,
            counted.transfer - open.expected_transfer,
            counted.deposit - open.expected_deposit,
        );

        let closed = Shift {
            state: ShiftState::Closed,
            closed_at: Some(open.opened_at + chrono::Duration::hours(10)),
            counted_cash: Some(counted.cash),
            counted_transfer: Some(counted.transfer),
            counted_deposit: Some(counted.deposit),
            difference_cash: Some(differences.cash),
            difference_transfer: Some(differences.transfer),
            difference_deposit: Some(differences.deposit),
            difference_total: differences.checked_sum().filter(|_| !without_total),
            expenses_cash: Some(expenses.cash),
            expenses_transfer: Some(expenses.transfer),
            expenses_deposit: Some(expenses.deposit),
            observations: Some(request.observations.clone()).filter(|o| !o.is_empty()),
            ..open
        };
        state.history.insert(0, closed.clone());
        Ok(closed)
    }

    async fn shift_history(&self) -> Result<Vec<Shift>> {
        self.record_call();
        Ok(self.state.lock().unwrap().history.clone())
    }
}
