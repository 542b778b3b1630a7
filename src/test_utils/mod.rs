//! Test utilities shared by the unit and HTTP-level tests.
//!
//! - Factories for records with sensible defaults
//! - An in-memory ledger implementing every repository trait
//! - A recording notifier
//! - `TestAppStateBuilder` for router tests

mod app_state_builder;
mod factories;
mod ledger_mocks;
mod notifier_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use ledger_mocks::*;
pub use notifier_mocks::*;
