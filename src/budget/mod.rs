//! Quarterly budget engine
//! Converts banked reputation plus a growing base allowance into periodic payouts

pub mod calendar;
pub mod engine;
pub mod types;

pub use engine::BudgetEngine;
pub use types::{BudgetConfig, BudgetState, Payout};
