//! Error types for repbudget
//!
//! The engine itself is pure arithmetic; errors come from the calendar
//! boundary, configuration validation and the save store.

use thiserror::Error;

/// Main error type for the budget engine and its host glue
#[derive(Error, Debug)]
pub enum BudgetError {
    /// Calendar arithmetic left the representable date range
    #[error("Calendar overflow: cannot add {months} months to t={seconds}s")]
    CalendarOverflow { seconds: f64, months: u32 },

    /// Period counter cannot advance any further
    #[error("Period counter overflow at period {period}")]
    CounterOverflow { period: u32 },

    /// Engine configuration rejected by validation
    #[error("Invalid budget configuration: {0}")]
    InvalidConfig(String),

    /// Date string could not be parsed
    #[error("Invalid date '{input}': expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")]
    InvalidDate { input: String },

    /// Named save does not exist in the store
    #[error("Save not found: {0}")]
    SaveNotFound(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("Budget error: {0}")]
    Generic(String),
}

/// Result type alias for budget operations
pub type Result<T> = std::result::Result<T, BudgetError>;

/// Convert anyhow errors to BudgetError
impl From<anyhow::Error> for BudgetError {
    fn from(err: anyhow::Error) -> Self {
        BudgetError::Generic(err.to_string())
    }
}
