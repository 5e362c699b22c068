//! Quarterly budget engine
//!
//! Payout for a period is a time-based base budget plus funds converted from
//! banked reputation:
//!
//! ```text
//! base(n)     = start * (end / start) ^ (min(N, n) / N)
//! convert     = max(banked * decay, 0)
//! banked'     = banked - convert
//! payout(n)   = base(n) + convert * rate
//! ```
//!
//! Guarantees:
//! - Saturation: base(n) == end for n >= N
//! - Monotonicity: base is strictly increasing on [0, N]
//! - Conservation: banked' == banked - max(banked * decay, 0)

use crate::budget::calendar;
use crate::budget::types::{BudgetConfig, BudgetState, Payout};
use crate::errors::{BudgetError, Result};
use tracing::{debug, info};

/// Owns the budget state for one save and advances it period by period
#[derive(Debug, Clone)]
pub struct BudgetEngine {
    /// Curve and conversion constants
    config: BudgetConfig,

    /// Persistent state
    state: BudgetState,
}

impl BudgetEngine {
    /// Create engine with fresh state and the program constants
    pub fn new(now: f64, current_reputation: f64) -> Self {
        Self::restore(BudgetState::new(now, current_reputation))
    }

    /// Create engine over restored state with the program constants
    pub fn restore(state: BudgetState) -> Self {
        Self {
            config: BudgetConfig::default(),
            state,
        }
    }

    /// Create engine over existing state, rejecting unusable constants
    pub fn with_state(config: BudgetConfig, state: BudgetState) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, state })
    }

    /// Add an observed reputation change to the bank
    pub fn accrue_reputation(&mut self, delta: f64) {
        self.state.banked_reputation += delta;
        debug!(
            delta,
            banked = self.state.banked_reputation,
            "Reputation accrued"
        );
    }

    /// Whether the next payout is due at `now`
    pub fn is_payout_due(&self, now: f64) -> bool {
        now >= self.state.next_due_time
    }

    /// Base budget for the current period counter
    pub fn base_budget(&self) -> f64 {
        self.base_budget_at(self.state.period_counter)
    }

    /// Base budget for an arbitrary period, clamped once the curve saturates
    pub fn base_budget_at(&self, period: u32) -> f64 {
        let total = self.config.total_periods;
        if period >= total {
            return self.config.base_budget_end;
        }
        let start = self.config.base_budget_start;
        let ratio = self.config.base_budget_end / start;
        start * ratio.powf(period as f64 / total as f64)
    }

    /// Payout the next period would produce, without touching state
    pub fn preview_payout(&self) -> Payout {
        let base_budget = self.base_budget();
        let reputation_converted = self.convertible_reputation();
        let reputation_budget = reputation_converted * self.config.reputation_to_funds_rate;

        Payout {
            period: self.state.period_counter,
            base_budget,
            reputation_converted,
            reputation_budget,
            total: base_budget + reputation_budget,
        }
    }

    /// Compute the payout for the current period and consume converted reputation
    ///
    /// Reads the period counter before [`advance_period`](Self::advance_period)
    /// increments it. Negative banked reputation converts nothing and stays
    /// banked as debt.
    pub fn compute_payout(&mut self) -> Payout {
        let payout = self.preview_payout();
        self.state.banked_reputation -= payout.reputation_converted;
        payout
    }

    /// Pay out the current period and schedule the next one
    ///
    /// State is left untouched if the next due date cannot be represented or
    /// the period counter is exhausted.
    pub fn advance_period(&mut self, now: f64) -> Result<Payout> {
        let next_due =
            calendar::add_calendar_months(self.state.next_due_time, self.config.period_length_months)?;
        let next_period = self
            .state
            .period_counter
            .checked_add(1)
            .ok_or(BudgetError::CounterOverflow {
                period: self.state.period_counter,
            })?;

        let payout = self.compute_payout();
        self.state.period_counter = next_period;
        self.state.next_due_time = next_due;

        info!(
            "Budget payout: {} (Base: {}, Rep: {})",
            payout.total, payout.base_budget, payout.reputation_budget
        );
        debug!(
            period = payout.period,
            now,
            next_due = %calendar::format_time(next_due),
            banked = self.state.banked_reputation,
            "Period advanced"
        );

        Ok(payout)
    }

    /// Current persistent state
    pub fn state(&self) -> &BudgetState {
        &self.state
    }

    /// Engine constants
    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Next due time in seconds since the epoch
    pub fn next_due_time(&self) -> f64 {
        self.state.next_due_time
    }

    /// Payouts made so far
    pub fn period_counter(&self) -> u32 {
        self.state.period_counter
    }

    /// Reputation waiting to be converted
    pub fn banked_reputation(&self) -> f64 {
        self.state.banked_reputation
    }

    fn convertible_reputation(&self) -> f64 {
        (self.state.banked_reputation * self.config.reputation_decay_factor).max(0.0)
    }
}
