//! Integration tests for repbudget
//!
//! Drives budget sessions against the simulated host end to end.

use repbudget::{
    budget::calendar::{self, SECONDS_PER_DAY},
    host::{CurrencyEventBus, CurrencyModified, FundsLedger, TimeWarpControl, TransactionReasons},
    session::{BudgetSession, PersistedBudget, SaveGame, SaveStore},
    sim::{SimulatedHost, NORMAL_RATE},
};
use tempfile::TempDir;

#[test]
fn test_catch_up_after_long_warp() {
    let mut bus = CurrencyEventBus::new();
    let mut host = SimulatedHost::new(0.0, 0.0, 0.0);
    let mut session = BudgetSession::start(&mut bus, None, 0.0, 0.0);

    host.set_warp_rate(100_000.0);
    host.advance_to(400.0 * SECONDS_PER_DAY);
    let payouts = session.update(host.universal_time, &mut host).unwrap();

    assert!(payouts.len() > 1, "Expected several periods to fire");
    assert_eq!(payouts.len(), 5);
    assert_eq!(host.warp_rate, NORMAL_RATE);
    assert!(session.engine().next_due_time() > host.universal_time);

    let paid: f64 = payouts.iter().map(|p| p.total).sum();
    assert!((host.deposited(TransactionReasons::NONE) - paid).abs() < 1e-6);
}

#[test]
fn test_contract_reputation_converts_next_quarter() {
    let mut bus = CurrencyEventBus::new();
    let mut host = SimulatedHost::new(0.0, 0.0, 0.0);
    let mut session = BudgetSession::start(&mut bus, None, 0.0, 0.0);

    // First quarter pays only the base budget
    let first = session.update(0.0, &mut host).unwrap();
    assert_eq!(first[0].total, 1250.0);

    host.complete_contract(&mut bus, 0.0, 800.0);
    host.apply(
        &mut bus,
        CurrencyModified::reputation(TransactionReasons::PROGRESSION, 500.0),
    );

    let april = calendar::parse_date("1951-04-01").unwrap();
    host.advance_to(april);
    let second = session.update(april, &mut host).unwrap();

    assert_eq!(second.len(), 1);
    assert_eq!(second[0].reputation_converted, 100.0);
    assert_eq!(second[0].reputation_budget, 100_000.0);
    assert_eq!(session.engine().banked_reputation(), 700.0);
    // The host still counts the progression reputation
    assert_eq!(host.reputation, 1300.0);
}

#[test]
fn test_penalties_become_debt() {
    let mut bus = CurrencyEventBus::new();
    let mut host = SimulatedHost::new(0.0, 0.0, 0.0);
    let mut session = BudgetSession::start(&mut bus, None, 0.0, 0.0);

    host.fail_contract(&mut bus, 40.0);
    let payouts = session.update(0.0, &mut host).unwrap();

    assert_eq!(payouts[0].reputation_budget, 0.0);
    assert_eq!(session.engine().banked_reputation(), -40.0);
}

#[test]
fn test_save_reload_continues_schedule() {
    let temp = TempDir::new().unwrap();
    let store = SaveStore::new(temp.path()).unwrap();

    let mut bus = CurrencyEventBus::new();
    let mut host = SimulatedHost::new(0.0, 0.0, 50.0);
    let mut session = BudgetSession::start(&mut bus, None, 0.0, host.reputation);
    host.advance_to(100.0 * SECONDS_PER_DAY);
    session.update(host.universal_time, &mut host).unwrap();

    let mut save = SaveGame::new("career", host.universal_time, host.funds, host.reputation);
    save.budget = session.end(&mut bus);
    store.save(&mut save).unwrap();

    let loaded = store.load_required("career").unwrap();
    let mut host = SimulatedHost::new(loaded.universal_time, loaded.funds, loaded.reputation);
    let mut session = BudgetSession::start(&mut bus, Some(&loaded.budget), loaded.universal_time, 0.0);

    assert_eq!(session.engine().period_counter(), 2);
    assert_eq!(
        session.engine().next_due_time(),
        calendar::parse_date("1951-07-01").unwrap()
    );

    host.advance_to(calendar::parse_date("1951-07-01").unwrap());
    let payouts = session.update(host.universal_time, &mut host).unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].period, 2);
}

#[test]
fn test_legacy_save_seeds_bank_from_reputation() {
    let mut bus = CurrencyEventBus::new();
    let legacy = PersistedBudget::default();
    let session = BudgetSession::start(&mut bus, Some(&legacy), 3600.0, 64.0);

    assert_eq!(session.engine().banked_reputation(), 64.0);
    assert_eq!(session.engine().next_due_time(), 3600.0);
}

#[test]
fn test_warp_stopped_before_deposit() {
    #[derive(Default)]
    struct OrderHost {
        warping: bool,
        deposits_while_warping: usize,
        deposits: usize,
    }

    impl TimeWarpControl for OrderHost {
        fn stop_time_warp(&mut self) {
            self.warping = false;
        }
    }

    impl FundsLedger for OrderHost {
        fn add_funds(&mut self, _amount: f64, _reason: TransactionReasons) {
            if self.warping {
                self.deposits_while_warping += 1;
            }
            self.deposits += 1;
            self.warping = true;
        }
    }

    let mut bus = CurrencyEventBus::new();
    let mut session = BudgetSession::start(&mut bus, None, 0.0, 0.0);
    let mut host = OrderHost {
        warping: true,
        ..Default::default()
    };

    session.update(3.0 * 365.0 * SECONDS_PER_DAY, &mut host).unwrap();
    assert!(host.deposits > 1);
    assert_eq!(host.deposits_while_warping, 0);
}

#[test]
fn test_base_budget_reaches_cap_after_twelve_years() {
    let mut bus = CurrencyEventBus::new();
    let mut host = SimulatedHost::new(0.0, 0.0, 0.0);
    let mut session = BudgetSession::start(&mut bus, None, 0.0, 0.0);

    let end = calendar::parse_date("1964-01-01").unwrap();
    let payouts = session.update(end, &mut host).unwrap();

    // Quarters from 1951-01-01 through 1964-01-01 inclusive
    assert_eq!(payouts.len(), 53);
    assert_eq!(payouts[48].base_budget, 75_000.0);
    assert_eq!(payouts[52].base_budget, 75_000.0);
    assert!(payouts[47].base_budget < 75_000.0);
}
