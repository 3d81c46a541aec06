//! # lana-core
//!
//! Foundation types for the Lana family finance backend.
//!
//! This crate provides the shared vocabulary the other Lana crates depend on:
//!
//! - **Transactions**: `Transaction`/`NewTransaction` rows, `TransactionKind`,
//!   `PaymentMethod`
//! - **Categories**: the fixed per-kind category lists the UI and the
//!   assistant tools are constrained to
//! - **Savings goals**: `SavingsGoal` and the aporte/retiro movement helpers
//! - **Recurring charges**: `RecurringCharge` rows plus the frontend-shape
//!   mapping used by the HTTP surface
//! - **Money**: es-MX amount formatting for confirmation messages
//!
//! All wire field names are the Spanish names the hosted database uses.

#![deny(unsafe_code)]

pub mod categories;
pub mod goal;
pub mod money;
pub mod recurring;
pub mod text;
pub mod transaction;

pub use goal::{DEFAULT_GOAL_COLOR, NewSavingsGoal, SavingsGoal};
pub use recurring::{NewRecurringCharge, RecurringCharge, RecurringChargeView, clamp_charge_day};
pub use transaction::{NewTransaction, PaymentMethod, Transaction, TransactionKind};
