//! Save-bound budget session
//!
//! - Controller: owns the engine for one save and its bus subscription
//! - Persistence: the three stored budget fields and a JSON save store

pub mod controller;
pub mod persistence;

// Re-export key types
pub use controller::BudgetSession;
pub use persistence::{PersistedBudget, SaveGame, SaveStore};
