//! Host environment boundary
//!
//! The engine never talks to the game directly. The host implements these
//! traits and publishes currency changes on the [`CurrencyEventBus`].

pub mod events;

pub use events::{CurrencyEventBus, CurrencyModified, Subscription, SubscriptionId, TransactionReasons};

/// Control over the host's time acceleration
pub trait TimeWarpControl {
    /// Drop back to normal speed immediately
    fn stop_time_warp(&mut self);
}

/// The host's currency ledger
pub trait FundsLedger {
    /// Deposit (or withdraw, if negative) funds
    fn add_funds(&mut self, amount: f64, reason: TransactionReasons);
}
