//! Tick-driven payout protocol
//!
//! Two states: `Idle` while `now < next_due_time`, `Due` otherwise. A tick in
//! `Due` halts time warp, advances one period, deposits the payout and checks
//! again, so one tick catches up every period the clock skipped over.

use crate::budget::{BudgetEngine, Payout};
use crate::errors::Result;
use crate::host::{FundsLedger, TimeWarpControl, TransactionReasons};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Scheduling state of the engine at a given time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleState {
    /// Waiting for the next due time
    Idle,

    /// A payout is pending
    Due,
}

/// Drives an engine from the host's clock
#[derive(Debug, Clone, Copy, Default)]
pub struct PayoutScheduler;

impl PayoutScheduler {
    /// Create a scheduler
    pub fn new() -> Self {
        Self
    }

    /// Scheduling state at `now`
    pub fn state(engine: &BudgetEngine, now: f64) -> ScheduleState {
        if engine.is_payout_due(now) {
            ScheduleState::Due
        } else {
            ScheduleState::Idle
        }
    }

    /// Run one tick, paying out every period due at `now`
    ///
    /// Returns the payouts in the order they fired. An idle tick touches
    /// nothing and returns an empty list.
    pub fn tick<H>(&self, engine: &mut BudgetEngine, now: f64, host: &mut H) -> Result<Vec<Payout>>
    where
        H: TimeWarpControl + FundsLedger,
    {
        let mut payouts = Vec::new();
        self.tick_into(engine, now, host, &mut payouts)?;
        Ok(payouts)
    }

    /// Run one tick, appending each payout to `paid` as soon as it is deposited
    ///
    /// On error `paid` still holds every payout deposited before the failure.
    pub fn tick_into<H>(
        &self,
        engine: &mut BudgetEngine,
        now: f64,
        host: &mut H,
        paid: &mut Vec<Payout>,
    ) -> Result<()>
    where
        H: TimeWarpControl + FundsLedger,
    {
        let start = paid.len();

        while Self::state(engine, now) == ScheduleState::Due {
            host.stop_time_warp();
            let payout = engine.advance_period(now)?;
            host.add_funds(payout.total, TransactionReasons::NONE);
            paid.push(payout);
        }

        match paid.len() - start {
            0 => {}
            1 => debug!(now, "Paid one budget period"),
            n => info!(periods = n, now, "Caught up on overdue budget periods"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::calendar::{self, SECONDS_PER_DAY};
    use crate::budget::BudgetState;
    use crate::errors::BudgetError;
    use quickcheck_macros::quickcheck;

    #[derive(Default)]
    struct RecordingHost {
        warp_stops: usize,
        deposits: Vec<(f64, TransactionReasons)>,
    }

    impl TimeWarpControl for RecordingHost {
        fn stop_time_warp(&mut self) {
            self.warp_stops += 1;
        }
    }

    impl FundsLedger for RecordingHost {
        fn add_funds(&mut self, amount: f64, reason: TransactionReasons) {
            self.deposits.push((amount, reason));
        }
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let mut engine = BudgetEngine::new(1000.0, 50.0);
        let before = engine.state().clone();
        let mut host = RecordingHost::default();

        let payouts = PayoutScheduler::new().tick(&mut engine, 999.0, &mut host).unwrap();

        assert!(payouts.is_empty());
        assert_eq!(engine.state(), &before);
        assert_eq!(host.warp_stops, 0);
        assert!(host.deposits.is_empty());
    }

    #[test]
    fn test_due_tick_pays_once() {
        let mut engine = BudgetEngine::new(0.0, 800.0);
        let mut host = RecordingHost::default();

        let payouts = PayoutScheduler::new().tick(&mut engine, 0.0, &mut host).unwrap();

        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].total, 1250.0 + 100_000.0);
        assert_eq!(host.warp_stops, 1);
        assert_eq!(host.deposits, vec![(101_250.0, TransactionReasons::NONE)]);
        assert_eq!(engine.period_counter(), 1);
        assert_eq!(PayoutScheduler::state(&engine, 0.0), ScheduleState::Idle);
    }

    #[test]
    fn test_catch_up_after_time_jump() {
        let mut engine = BudgetEngine::new(0.0, 0.0);
        let mut host = RecordingHost::default();
        let now = 400.0 * SECONDS_PER_DAY;

        let payouts = PayoutScheduler::new().tick(&mut engine, now, &mut host).unwrap();

        // 1951-01-01, 04-01, 07-01, 10-01 and 1952-01-01 are all <= day 400
        assert_eq!(payouts.len(), 5);
        for (i, payout) in payouts.iter().enumerate() {
            assert_eq!(payout.period, i as u32);
        }
        assert_eq!(engine.period_counter(), 5);
        assert_eq!(engine.next_due_time(), calendar::parse_date("1952-04-01").unwrap());
        assert!(engine.next_due_time() > now);
        assert_eq!(host.warp_stops, 5);
        assert_eq!(host.deposits.len(), 5);
    }

    #[test]
    fn test_schedule_independent_of_idle_ticks() {
        let mut stepped = BudgetEngine::new(0.0, 0.0);
        let mut jumped = BudgetEngine::new(0.0, 0.0);
        let mut host = RecordingHost::default();
        let scheduler = PayoutScheduler::new();

        let step = 7.0 * 3600.0;
        let ticks = (3.0 * 365.0 * SECONDS_PER_DAY / step) as u32;
        for i in 0..=ticks {
            scheduler.tick(&mut stepped, i as f64 * step, &mut host).unwrap();
        }
        scheduler.tick(&mut jumped, ticks as f64 * step, &mut host).unwrap();

        assert_eq!(stepped.state(), jumped.state());

        let mut expected = 0.0;
        for _ in 0..stepped.period_counter() {
            expected = calendar::add_calendar_months(expected, 3).unwrap();
        }
        assert_eq!(stepped.next_due_time(), expected);
    }

    #[test]
    fn test_overflow_surfaces_error() {
        let mut engine = BudgetEngine::restore(BudgetState::new(f64::MAX, 0.0));
        let mut host = RecordingHost::default();
        assert!(PayoutScheduler::new().tick(&mut engine, f64::MAX, &mut host).is_err());
        assert!(host.deposits.is_empty());
    }

    #[test]
    fn test_partial_catch_up_keeps_paid_periods() {
        let mut engine = BudgetEngine::restore(BudgetState {
            next_due_time: 0.0,
            period_counter: u32::MAX - 1,
            banked_reputation: 0.0,
        });
        let mut host = RecordingHost::default();
        let mut paid = Vec::new();

        let result = PayoutScheduler::new().tick_into(&mut engine, 365.0 * SECONDS_PER_DAY, &mut host, &mut paid);

        assert!(matches!(result, Err(BudgetError::CounterOverflow { .. })));
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].period, u32::MAX - 1);
        assert_eq!(host.deposits.len(), 1);
        assert_eq!(engine.period_counter(), u32::MAX);
    }

    #[quickcheck]
    fn prop_idle_tick_never_mutates(due_days: u16, before_secs: u32, banked: i32) -> bool {
        let due = due_days as f64 * SECONDS_PER_DAY + 1.0;
        let now = due - 1.0 - (before_secs as f64 % due);
        let mut engine = BudgetEngine::new(due, banked as f64);
        let before = engine.state().clone();
        let mut host = RecordingHost::default();

        let payouts = PayoutScheduler::new().tick(&mut engine, now, &mut host).unwrap();
        payouts.is_empty() && engine.state() == &before && host.warp_stops == 0
    }
}
