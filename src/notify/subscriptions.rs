//! Subscription registry.
//!
//! Tracks which central is subscribed to which notifiable
//! characteristic. At most one entry exists per `(central,
//! characteristic)` pair; many centrals may share a characteristic.

use log::{debug, warn};

use crate::protocol::types::{Characteristic, CentralId};

/// One `(central, characteristic)` registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub central: CentralId,
    pub characteristic: Characteristic,
}

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: Vec<Subscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `central` for `characteristic`.
    ///
    /// Idempotent. Returns `true` only when a new entry was added; a
    /// non-notifiable characteristic is refused.
    pub fn subscribe(&mut self, central: CentralId, characteristic: Characteristic) -> bool {
        if !characteristic.is_notifiable() {
            warn!("NOTIFY: central {} cannot subscribe to {}", central, characteristic);
            return false;
        }
        let sub = Subscription {
            central,
            characteristic,
        };
        if self.entries.contains(&sub) {
            return false;
        }
        debug!("NOTIFY: central {} subscribed to {}", central, characteristic);
        self.entries.push(sub);
        true
    }

    /// Remove the matching entry. Returns `true` if one was present.
    pub fn unsubscribe(&mut self, central: CentralId, characteristic: Characteristic) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|s| !(s.central == central && s.characteristic == characteristic));
        let removed = self.entries.len() != before;
        if removed {
            debug!("NOTIFY: central {} unsubscribed from {}", central, characteristic);
        }
        removed
    }

    /// Centrals currently subscribed to `characteristic`, in subscription order.
    pub fn subscribers_of(&self, characteristic: Characteristic) -> Vec<CentralId> {
        self.entries
            .iter()
            .filter(|s| s.characteristic == characteristic)
            .map(|s| s.central)
            .collect()
    }

    pub fn is_subscribed(&self, central: CentralId, characteristic: Characteristic) -> bool {
        self.entries.contains(&Subscription {
            central,
            characteristic,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry (session teardown).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
