//! In-memory host used by the CLI and integration tests
//!
//! Models the parts of a game the budget touches: a universal clock, a time
//! warp rate, a funds ledger, a reputation score and contract completions
//! that publish currency changes on the bus.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::budget::calendar::SECONDS_PER_DAY;
use crate::budget::Payout;
use crate::config::SimulationConfig;
use crate::errors::{BudgetError, Result};
use crate::host::{CurrencyEventBus, CurrencyModified, FundsLedger, TimeWarpControl, TransactionReasons};
use crate::session::{BudgetSession, PersistedBudget};
use crate::telemetry::TelemetryCollector;

/// Normal (un-accelerated) time rate
pub const NORMAL_RATE: f64 = 1.0;

/// One ledger movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub at: f64,
    pub amount: f64,
    pub reason: TransactionReasons,
}

/// Simulated game host
#[derive(Debug, Clone)]
pub struct SimulatedHost {
    /// Seconds since the epoch
    pub universal_time: f64,
    pub warp_rate: f64,
    pub funds: f64,
    pub reputation: f64,
    pub ledger: Vec<LedgerEntry>,
}

impl SimulatedHost {
    /// Create host at a given clock and wallet
    pub fn new(universal_time: f64, funds: f64, reputation: f64) -> Self {
        Self {
            universal_time,
            warp_rate: NORMAL_RATE,
            funds,
            reputation,
            ledger: Vec::new(),
        }
    }

    /// Engage time acceleration
    pub fn set_warp_rate(&mut self, rate: f64) {
        self.warp_rate = rate.max(NORMAL_RATE);
    }

    /// Move the clock forward to `t` (never backwards)
    pub fn advance_to(&mut self, t: f64) {
        if t > self.universal_time {
            self.universal_time = t;
        }
    }

    /// Apply a currency change and publish it
    pub fn apply(&mut self, bus: &mut CurrencyEventBus, change: CurrencyModified) {
        self.reputation += change.reputation;
        if change.funds != 0.0 {
            self.add_funds(change.funds, change.reason);
        }
        bus.publish(change);
    }

    /// Complete a contract: reward funds and reputation
    pub fn complete_contract(&mut self, bus: &mut CurrencyEventBus, funds: f64, reputation: f64) {
        self.apply(
            bus,
            CurrencyModified {
                reason: TransactionReasons::CONTRACT_REWARD,
                funds,
                reputation,
                science: 0.0,
            },
        );
    }

    /// Fail a contract: reputation penalty
    pub fn fail_contract(&mut self, bus: &mut CurrencyEventBus, reputation_penalty: f64) {
        self.apply(
            bus,
            CurrencyModified::reputation(TransactionReasons::CONTRACT_PENALTY, -reputation_penalty.abs()),
        );
    }

    /// Total deposited with a given reason
    pub fn deposited(&self, reason: TransactionReasons) -> f64 {
        self.ledger
            .iter()
            .filter(|entry| entry.reason == reason)
            .map(|entry| entry.amount)
            .sum()
    }
}

impl TimeWarpControl for SimulatedHost {
    fn stop_time_warp(&mut self) {
        self.warp_rate = NORMAL_RATE;
    }
}

impl FundsLedger for SimulatedHost {
    fn add_funds(&mut self, amount: f64, reason: TransactionReasons) {
        self.funds += amount;
        self.ledger.push(LedgerEntry {
            at: self.universal_time,
            amount,
            reason,
        });
    }
}

/// Outcome of a simulation run
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Payouts with the clock time they fired at
    pub payouts: Vec<(f64, Payout)>,
    pub final_time: f64,
    pub final_funds: f64,
    pub final_reputation: f64,
    pub budget: PersistedBudget,
}

/// Drives a session against a simulated host at a fixed tick
pub struct Simulation {
    config: SimulationConfig,
    host: SimulatedHost,
    bus: CurrencyEventBus,
    session: BudgetSession,
}

impl Simulation {
    /// Start from a fresh career at the epoch
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::resume(config, 0.0, None, None)
    }

    /// Start from an existing clock, wallet and stored budget
    pub fn resume(
        config: SimulationConfig,
        universal_time: f64,
        wallet: Option<(f64, f64)>,
        saved: Option<&PersistedBudget>,
    ) -> Result<Self> {
        config.validate()?;
        let (funds, reputation) =
            wallet.unwrap_or((config.starting_funds, config.starting_reputation));

        let host = SimulatedHost::new(universal_time, funds, reputation);
        let mut bus = CurrencyEventBus::new();
        let session = BudgetSession::start(&mut bus, saved, universal_time, reputation);

        Ok(Self {
            config,
            host,
            bus,
            session,
        })
    }

    /// Share a telemetry collector with the caller
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.session = self.session.with_telemetry(telemetry);
        self
    }

    /// Run until `end_time`, completing a contract every configured interval
    pub fn run_until(mut self, end_time: f64) -> Result<SimulationReport> {
        let step = self.config.tick_hours * 3600.0;
        let contract_every = self.config.contract_interval_days * SECONDS_PER_DAY;
        let mut next_contract = self.host.universal_time + contract_every;
        let mut payouts = Vec::new();

        loop {
            let now = self.host.universal_time;
            for payout in self.session.update(now, &mut self.host)? {
                payouts.push((now, payout));
            }

            if contract_every > 0.0 && now >= next_contract {
                debug!(now, "Simulated contract completed");
                self.host.complete_contract(
                    &mut self.bus,
                    self.config.contract_funds,
                    self.config.contract_reputation,
                );
                self.host.set_warp_rate(self.config.warp_rate);
                next_contract += contract_every;
            }

            if now >= end_time {
                break;
            }
            self.host.advance_to((now + step * self.host.warp_rate).min(end_time));
        }

        let budget = self.session.end(&mut self.bus);
        Ok(SimulationReport {
            payouts,
            final_time: self.host.universal_time,
            final_funds: self.host.funds,
            final_reputation: self.host.reputation,
            budget,
        })
    }

    /// Run for a number of calendar years from the current clock
    pub fn run_years(self, years: u32) -> Result<SimulationReport> {
        let start = self.host.universal_time;
        let end = crate::budget::calendar::add_calendar_months(start, years.saturating_mul(12))
            .map_err(|_| BudgetError::Generic(format!("cannot simulate {} years", years)))?;
        self.run_until(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> SimulationConfig {
        SimulationConfig {
            contract_interval_days: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_host_stops_warp() {
        let mut host = SimulatedHost::new(0.0, 0.0, 0.0);
        host.set_warp_rate(100_000.0);
        host.stop_time_warp();
        assert_eq!(host.warp_rate, NORMAL_RATE);
    }

    #[test]
    fn test_host_ledger() {
        let mut host = SimulatedHost::new(5.0, 100.0, 0.0);
        host.add_funds(50.0, TransactionReasons::NONE);
        assert_eq!(host.funds, 150.0);
        assert_eq!(host.ledger[0].at, 5.0);
        assert_eq!(host.deposited(TransactionReasons::NONE), 50.0);
    }

    #[test]
    fn test_contract_publishes_change() {
        let mut bus = CurrencyEventBus::new();
        let sub = bus.subscribe();
        let mut host = SimulatedHost::new(0.0, 0.0, 0.0);

        host.complete_contract(&mut bus, 1000.0, 8.0);
        host.fail_contract(&mut bus, 3.0);

        let events = sub.drain();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.reason.is_contract()));
        assert_eq!(host.reputation, 5.0);
        assert_eq!(host.funds, 1000.0);
    }

    #[test]
    fn test_one_year_without_contracts() {
        let report = Simulation::new(quiet_config()).unwrap().run_years(1).unwrap();
        // Payouts on Jan 1, Apr 1, Jul 1, Oct 1 and the following Jan 1
        assert_eq!(report.payouts.len(), 5);
        assert_eq!(report.budget.period_counter, Some(5));
        let paid: f64 = report.payouts.iter().map(|(_, p)| p.total).sum();
        assert!((report.final_funds - quiet_config().starting_funds - paid).abs() < 1e-6);
    }

    #[test]
    fn test_warp_does_not_skip_payouts() {
        let config = SimulationConfig {
            warp_rate: 10_000.0,
            contract_interval_days: 1.0,
            ..Default::default()
        };
        let report = Simulation::new(config).unwrap().run_years(2).unwrap();
        assert_eq!(report.payouts.len(), 9);
        for (i, (_, payout)) in report.payouts.iter().enumerate() {
            assert_eq!(payout.period, i as u32);
        }
    }
}
