//! Currency change events and the bus that delivers them
//!
//! Each subscriber owns a queue. Publishing fans the event out to every live
//! subscription; the subscriber drains its queue on the driver thread, so
//! delivery order matches publish order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;
use std::sync::mpsc;

/// Bit mask describing why a currency changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionReasons(u32);

impl TransactionReasons {
    /// No particular reason (used for budget payouts)
    pub const NONE: Self = Self(0);
    pub const CONTRACT_ADVANCE: Self = Self(1 << 0);
    pub const CONTRACT_REWARD: Self = Self(1 << 1);
    pub const CONTRACT_PENALTY: Self = Self(1 << 2);
    pub const CONTRACT_DECLINE: Self = Self(1 << 3);
    pub const VESSEL_ROLLOUT: Self = Self(1 << 4);
    pub const VESSEL_RECOVERY: Self = Self(1 << 5);
    pub const STRATEGIES: Self = Self(1 << 6);
    pub const PROGRESSION: Self = Self(1 << 7);
    pub const CHEATING: Self = Self(1 << 8);

    /// Every contract-originated reason
    pub const CONTRACTS: Self = Self(
        Self::CONTRACT_ADVANCE.0
            | Self::CONTRACT_REWARD.0
            | Self::CONTRACT_PENALTY.0
            | Self::CONTRACT_DECLINE.0,
    );

    const NAMES: [(Self, &'static str); 9] = [
        (Self::CONTRACT_ADVANCE, "ContractAdvance"),
        (Self::CONTRACT_REWARD, "ContractReward"),
        (Self::CONTRACT_PENALTY, "ContractPenalty"),
        (Self::CONTRACT_DECLINE, "ContractDecline"),
        (Self::VESSEL_ROLLOUT, "VesselRollout"),
        (Self::VESSEL_RECOVERY, "VesselRecovery"),
        (Self::STRATEGIES, "Strategies"),
        (Self::PROGRESSION, "Progression"),
        (Self::CHEATING, "Cheating"),
    ];

    /// True if any bit is shared with `other`
    pub fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True if this change came from a contract
    pub fn is_contract(&self) -> bool {
        self.intersects(Self::CONTRACTS)
    }
}

impl BitOr for TransactionReasons {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for TransactionReasons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "None");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.intersects(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "Unknown({:#x})", self.0)
        } else {
            write!(f, "{}", names.join(", "))
        }
    }
}

/// A currency change reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrencyModified {
    pub reason: TransactionReasons,
    pub funds: f64,
    pub reputation: f64,
    pub science: f64,
}

impl CurrencyModified {
    /// Reputation-only change
    pub fn reputation(reason: TransactionReasons, delta: f64) -> Self {
        Self {
            reason,
            funds: 0.0,
            reputation: delta,
            science: 0.0,
        }
    }

    /// Whether funds or reputation moved
    pub fn is_visible(&self) -> bool {
        self.funds != 0.0 || self.reputation != 0.0
    }
}

/// Handle identifying a subscription on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Receiving end of a subscription
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<CurrencyModified>,
}

impl Subscription {
    /// Subscription handle, needed to unsubscribe
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Take every event queued so far, in publish order
    pub fn drain(&self) -> Vec<CurrencyModified> {
        self.receiver.try_iter().collect()
    }
}

/// Fan-out bus for currency change notifications
#[derive(Debug, Default)]
pub struct CurrencyEventBus {
    subscribers: HashMap<SubscriptionId, mpsc::Sender<CurrencyModified>>,
    next_id: u64,
}

impl CurrencyEventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&mut self) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let (sender, receiver) = mpsc::channel();
        self.subscribers.insert(id, sender);
        Subscription { id, receiver }
    }

    /// Remove a subscriber; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Deliver an event to every subscriber
    ///
    /// Subscribers whose receiving end was dropped are pruned.
    pub fn publish(&mut self, event: CurrencyModified) {
        self.subscribers
            .retain(|_, sender| sender.send(event).is_ok());
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
