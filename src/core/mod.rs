//! Core business logic - framework-agnostic register operations.
//!
//! Everything in here can be driven without Discord: parsing and formatting amounts,
//! aggregating movements, reconciling a close and the session controller that ties them
//! to the ledger.

/// Per-method expense aggregation and movement ordering
pub mod aggregate;
/// Currency parsing and es-AR formatting
pub mod money;
/// Movement drafts and their validation
pub mod movement;
/// Close reconciliation: counted vs expected, per method
pub mod reconcile;
/// Operator-facing text
pub mod report;
/// Current-shift state and the open/record/close flows
pub mod session;
