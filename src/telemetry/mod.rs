//! Telemetry system for repbudget
//!
//! Collects budget events and running totals for the session summary.

use colored::Colorize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::budget::calendar;
use crate::budget::Payout;
use crate::host::TransactionReasons;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum BudgetEvent {
    /// A period was paid out
    PayoutIssued {
        payout: Payout,
        at: f64,
        timestamp: Instant,
    },
    /// A contract reputation change was banked
    ReputationAccrued {
        delta: f64,
        reason: TransactionReasons,
        timestamp: Instant,
    },
    /// A reputation change was seen but not banked
    ReputationIgnored {
        delta: f64,
        reason: TransactionReasons,
        timestamp: Instant,
    },
    /// Time acceleration was stopped ahead of a payout
    TimeWarpHalted { at: f64, timestamp: Instant },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub payouts: usize,
    pub total_paid: f64,
    pub base_paid: f64,
    pub reputation_paid: f64,
    pub reputation_accrued: f64,
    pub accrual_events: usize,
    pub ignored_changes: usize,
    pub warp_halts: usize,
    pub last_payout_at: Option<f64>,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<BudgetEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
}

// A poisoned lock only means a panic elsewhere; the counters are still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
        }
    }

    /// Record an event
    pub fn record(&self, event: BudgetEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                BudgetEvent::PayoutIssued { payout, at, .. } => {
                    stats.payouts += 1;
                    stats.total_paid += payout.total;
                    stats.base_paid += payout.base_budget;
                    stats.reputation_paid += payout.reputation_budget;
                    stats.last_payout_at = Some(*at);
                }
                BudgetEvent::ReputationAccrued { delta, .. } => {
                    stats.accrual_events += 1;
                    stats.reputation_accrued += delta;
                }
                BudgetEvent::ReputationIgnored { .. } => {
                    stats.ignored_changes += 1;
                }
                BudgetEvent::TimeWarpHalted { .. } => {
                    stats.warp_halts += 1;
                }
            }
        }

        lock(&self.events).push(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// All payouts recorded so far, oldest first
    pub fn payouts(&self) -> Vec<Payout> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                BudgetEvent::PayoutIssued { payout, .. } => Some(*payout),
                _ => None,
            })
            .collect()
    }

    /// Share of paid funds that came from reputation
    pub fn reputation_share(&self) -> f64 {
        let stats = lock(&self.stats);
        if stats.total_paid == 0.0 {
            0.0
        } else {
            stats.reputation_paid / stats.total_paid
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: crate::cli::Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: crate::cli::Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Display summary statistics
    pub fn display_summary(&self) {
        if !self.verbosity.show_progress() {
            return;
        }
        let stats = self.collector.get_stats();

        println!("\n{}", "Budget Summary".bold());
        println!("─────────────────────────────────────");
        println!("Payouts:            {}", stats.payouts);
        println!("Total paid:         {:.2}", stats.total_paid);
        println!("  base:             {:.2}", stats.base_paid);
        println!(
            "  reputation:       {:.2} ({:.1}%)",
            stats.reputation_paid,
            self.collector.reputation_share() * 100.0
        );
        println!("Reputation banked:  {:.2} ({} changes)", stats.reputation_accrued, stats.accrual_events);
        println!("Ignored changes:    {}", stats.ignored_changes);
        println!("Time warp halts:    {}", stats.warp_halts);
        if let Some(at) = stats.last_payout_at {
            println!("Last payout:        {}", calendar::format_time(at));
        }
        println!();
    }

    /// Print one payout line
    pub fn display_payout(&self, payout: &Payout, at: f64) {
        if !self.verbosity.show_progress() {
            return;
        }
        println!(
            "{}  #{:<3} {:>12.2}  (base {:>10.2}, rep {:>10.2})",
            calendar::format_time(at).cyan(),
            payout.period,
            payout.total,
            payout.base_budget,
            payout.reputation_budget
        );
    }
}
