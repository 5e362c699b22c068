//! repbudget v0.5.0 - Quarterly Program Budget
//!
//! Pays a space program every calendar quarter: a base allowance that grows
//! exponentially over twelve years, plus funds converted from reputation
//! banked through contracts.
//!
//! # Architecture
//!
//! - **Engine**: budget curve, reputation conversion, quarterly schedule
//! - **Scheduler**: tick protocol with catch-up after time jumps
//! - **Host**: time warp, funds ledger and currency event bus boundary
//! - **Session**: per-save ownership, subscription lifecycle, persistence

pub mod errors;
pub mod budget;
pub mod scheduler;
pub mod host;
pub mod session;

// Re-export commonly used types
pub use errors::{BudgetError, Result};
pub use budget::{BudgetConfig, BudgetEngine, BudgetState, Payout};
pub use scheduler::{PayoutScheduler, ScheduleState};

// Reference host: config, telemetry, simulation and CLI
pub mod config;
pub mod telemetry;
pub mod sim;
pub mod cli;
