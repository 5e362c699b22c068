//! Budget system type definitions

use crate::errors::{BudgetError, Result};
use serde::{Deserialize, Serialize};

/// Calendar months per budget period (one quarter)
pub const PERIOD_LENGTH_MONTHS: u32 = 3;

/// Base budget paid for the first period
pub const BASE_BUDGET_START: f64 = 5000.0 * PERIOD_LENGTH_MONTHS as f64 / 12.0;

/// Base budget once the growth curve has saturated
pub const BASE_BUDGET_END: f64 = 300_000.0 * PERIOD_LENGTH_MONTHS as f64 / 12.0;

/// Periods over which the base budget grows from start to end (12 years)
pub const TOTAL_PERIODS: u32 = 12 * 4;

/// Fraction of banked reputation converted each period
pub const REPUTATION_DECAY_FACTOR: f64 = 0.125;

/// Funds per unit of converted reputation
pub const REPUTATION_TO_FUNDS_RATE: f64 = 1000.0;

/// Constants for the budget curve and reputation conversion
///
/// `Default` carries the program constants. Engines built from code or tests
/// may use other values, but the user config file never exposes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Calendar months per period (default: 3)
    pub period_length_months: u32,

    /// Base budget at period 0 (default: 1250)
    pub base_budget_start: f64,

    /// Base budget at and after `total_periods` (default: 75000)
    pub base_budget_end: f64,

    /// Length of the growth curve in periods (default: 48)
    pub total_periods: u32,

    /// Fraction of banked reputation converted per period, in (0, 1] (default: 0.125)
    pub reputation_decay_factor: f64,

    /// Funds per converted reputation point (default: 1000)
    pub reputation_to_funds_rate: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            period_length_months: PERIOD_LENGTH_MONTHS,
            base_budget_start: BASE_BUDGET_START,
            base_budget_end: BASE_BUDGET_END,
            total_periods: TOTAL_PERIODS,
            reputation_decay_factor: REPUTATION_DECAY_FACTOR,
            reputation_to_funds_rate: REPUTATION_TO_FUNDS_RATE,
        }
    }
}

impl BudgetConfig {
    /// Check that the curve and conversion constants are usable
    pub fn validate(&self) -> Result<()> {
        if self.period_length_months == 0 {
            return Err(BudgetError::InvalidConfig(
                "period_length_months must be at least 1".to_string(),
            ));
        }
        if self.total_periods == 0 {
            return Err(BudgetError::InvalidConfig(
                "total_periods must be at least 1".to_string(),
            ));
        }
        if !(self.base_budget_start > 0.0 && self.base_budget_start.is_finite()) {
            return Err(BudgetError::InvalidConfig(format!(
                "base_budget_start must be positive, got {}",
                self.base_budget_start
            )));
        }
        if !(self.base_budget_end > 0.0 && self.base_budget_end.is_finite()) {
            return Err(BudgetError::InvalidConfig(format!(
                "base_budget_end must be positive, got {}",
                self.base_budget_end
            )));
        }
        if !(self.reputation_decay_factor > 0.0 && self.reputation_decay_factor <= 1.0) {
            return Err(BudgetError::InvalidConfig(format!(
                "reputation_decay_factor must be in (0, 1], got {}",
                self.reputation_decay_factor
            )));
        }
        if !self.reputation_to_funds_rate.is_finite() {
            return Err(BudgetError::InvalidConfig(
                "reputation_to_funds_rate must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Persistent budget state for one save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetState {
    /// Seconds since the epoch at which the next payout is due
    pub next_due_time: f64,

    /// Payouts made so far
    pub period_counter: u32,

    /// Reputation not yet converted to funds; negative means debt
    pub banked_reputation: f64,
}

impl BudgetState {
    /// Fresh state: first payout due immediately
    pub fn new(now: f64, current_reputation: f64) -> Self {
        Self {
            next_due_time: now,
            period_counter: 0,
            banked_reputation: current_reputation,
        }
    }
}

/// Breakdown of a single period's payout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    /// Period counter value the payout was computed from
    pub period: u32,

    /// Time-based component
    pub base_budget: f64,

    /// Reputation taken out of the bank this period
    pub reputation_converted: f64,

    /// Funds from converted reputation
    pub reputation_budget: f64,

    /// `base_budget + reputation_budget`
    pub total: f64,
}
