//! Budget session: single owner of the engine for one loaded save
//!
//! The session registers on the currency bus when it starts and deregisters
//! when it ends. Loading another save means ending this session and starting
//! a new one; there is no global instance.

use std::time::Instant;
use tracing::{debug, info};

use crate::budget::{BudgetConfig, BudgetEngine, BudgetState, Payout};
use crate::errors::Result;
use crate::host::{
    CurrencyEventBus, CurrencyModified, FundsLedger, Subscription, TimeWarpControl, TransactionReasons,
};
use crate::scheduler::PayoutScheduler;
use crate::session::persistence::PersistedBudget;
use crate::telemetry::{BudgetEvent, TelemetryCollector};

/// Engine plus its bus subscription for one save
pub struct BudgetSession {
    engine: BudgetEngine,
    subscription: Subscription,
    scheduler: PayoutScheduler,
    telemetry: TelemetryCollector,
}

impl BudgetSession {
    /// Start a session with the program constants
    ///
    /// `saved` is whatever the save held; `None` or missing fields start
    /// fresh, with banked reputation seeded from `current_reputation`.
    pub fn start(
        bus: &mut CurrencyEventBus,
        saved: Option<&PersistedBudget>,
        now: f64,
        current_reputation: f64,
    ) -> Self {
        let state = Self::restored_state(saved, now, current_reputation);
        Self::open(bus, BudgetEngine::restore(state))
    }

    /// Start a session with explicit engine constants
    ///
    /// Fails without subscribing if the constants are unusable.
    pub fn start_with_config(
        bus: &mut CurrencyEventBus,
        config: BudgetConfig,
        saved: Option<&PersistedBudget>,
        now: f64,
        current_reputation: f64,
    ) -> Result<Self> {
        let state = Self::restored_state(saved, now, current_reputation);
        let engine = BudgetEngine::with_state(config, state)?;
        Ok(Self::open(bus, engine))
    }

    fn restored_state(saved: Option<&PersistedBudget>, now: f64, current_reputation: f64) -> BudgetState {
        saved
            .cloned()
            .unwrap_or_default()
            .restore(now, current_reputation)
    }

    fn open(bus: &mut CurrencyEventBus, engine: BudgetEngine) -> Self {
        let subscription = bus.subscribe();

        info!(
            period = engine.period_counter(),
            banked = engine.banked_reputation(),
            next_due = engine.next_due_time(),
            "Budget session started"
        );

        Self {
            engine,
            subscription,
            scheduler: PayoutScheduler::new(),
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Use a shared telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Handle one currency change from the host
    ///
    /// Only non-zero reputation changes with a contract reason are banked.
    pub fn on_currency_modified(&mut self, event: &CurrencyModified) {
        if event.is_visible() {
            info!(
                "Currency change: Reason: {}, Funds: {}, Rep: {}",
                event.reason, event.funds, event.reputation
            );
        }

        if event.reputation == 0.0 {
            return;
        }

        if event.reason.is_contract() {
            self.engine.accrue_reputation(event.reputation);
            self.telemetry.record(BudgetEvent::ReputationAccrued {
                delta: event.reputation,
                reason: event.reason,
                timestamp: Instant::now(),
            });
        } else {
            debug!(reason = %event.reason, delta = event.reputation, "Reputation change not banked");
            self.telemetry.record(BudgetEvent::ReputationIgnored {
                delta: event.reputation,
                reason: event.reason,
                timestamp: Instant::now(),
            });
        }
    }

    /// Process every currency change queued on the bus
    pub fn pump_events(&mut self) -> usize {
        let events = self.subscription.drain();
        for event in &events {
            self.on_currency_modified(event);
        }
        events.len()
    }

    /// Per-frame update: bank pending changes, then pay anything due
    pub fn update<H>(&mut self, now: f64, host: &mut H) -> Result<Vec<Payout>>
    where
        H: TimeWarpControl + FundsLedger,
    {
        self.pump_events();

        let mut observed = TelemetryHost {
            inner: host,
            telemetry: &self.telemetry,
            now,
        };
        let mut payouts = Vec::new();
        let result = self
            .scheduler
            .tick_into(&mut self.engine, now, &mut observed, &mut payouts);

        // Deposited periods are recorded even when a later period fails
        for payout in &payouts {
            self.telemetry.record(BudgetEvent::PayoutIssued {
                payout: *payout,
                at: now,
                timestamp: Instant::now(),
            });
        }
        result.map(|()| payouts)
    }

    /// Fields to write into the save
    pub fn snapshot(&self) -> PersistedBudget {
        PersistedBudget::from_state(self.engine.state())
    }

    /// Deregister from the bus and hand back the final state
    ///
    /// Changes still queued are banked first so nothing published before the
    /// end is lost.
    pub fn end(mut self, bus: &mut CurrencyEventBus) -> PersistedBudget {
        self.pump_events();
        bus.unsubscribe(self.subscription.id());
        info!(period = self.engine.period_counter(), "Budget session ended");
        self.snapshot()
    }

    /// Engine owned by this session
    pub fn engine(&self) -> &BudgetEngine {
        &self.engine
    }

    /// Telemetry for this session
    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }
}

/// Forwards to the host and records warp halts
struct TelemetryHost<'a, H> {
    inner: &'a mut H,
    telemetry: &'a TelemetryCollector,
    now: f64,
}

impl<H: TimeWarpControl> TimeWarpControl for TelemetryHost<'_, H> {
    fn stop_time_warp(&mut self) {
        info!("Stopping time warp for budget payout");
        self.inner.stop_time_warp();
        self.telemetry.record(BudgetEvent::TimeWarpHalted {
            at: self.now,
            timestamp: Instant::now(),
        });
    }
}

impl<H: FundsLedger> FundsLedger for TelemetryHost<'_, H> {
    fn add_funds(&mut self, amount: f64, reason: TransactionReasons) {
        self.inner.add_funds(amount, reason);
    }
}
