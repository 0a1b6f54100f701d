//! Network gate: may the head job of a queue run right now?
//!
//! The decision itself is [`should_defer`], a pure function of a
//! [`NetworkConditions`] snapshot. [`NetworkGate`] takes a fresh snapshot
//! from the providers on every call.

use std::sync::Arc;

use crate::domain::{PriorityClass, QueueType};
use crate::network::{NetworkState, Preferences};

/// Everything the gate looks at, read at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkConditions {
    pub feature_disabled: bool,
    pub offline: bool,
    pub metered: bool,
    pub disable_over_metered: bool,
}

/// Whether a job of `priority` at the head of `queue` must wait.
pub fn should_defer(conditions: &NetworkConditions, queue: QueueType, priority: PriorityClass) -> bool {
    if conditions.feature_disabled {
        return true;
    }

    if conditions.offline {
        return true;
    }

    // Only background file transfers yield to metered-connection policy
    let metered_policy_applies = queue == QueueType::File && priority.is_deferrable();
    metered_policy_applies && conditions.metered && conditions.disable_over_metered
}

/// Live view of the network and preference providers.
#[derive(Clone)]
pub struct NetworkGate {
    network: Arc<dyn NetworkState>,
    preferences: Arc<dyn Preferences>,
}

impl NetworkGate {
    pub fn new(network: Arc<dyn NetworkState>, preferences: Arc<dyn Preferences>) -> Self {
        Self { network, preferences }
    }

    pub fn conditions(&self) -> NetworkConditions {
        NetworkConditions {
            feature_disabled: self.preferences.feature_disabled(),
            offline: self.network.is_offline(),
            metered: self.network.connection_is_metered(),
            disable_over_metered: self.preferences.disable_over_metered(),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.network.is_offline()
    }

    pub fn should_defer(&self, queue: QueueType, priority: PriorityClass) -> bool {
        should_defer(&self.conditions(), queue, priority)
    }
}
