//! In-process network and preference providers.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

use super::{ConnectionType, NetworkState, Preferences};

/// Network provider whose connection is set by hand.
#[derive(Debug)]
pub struct SimulatedNetwork {
    connection: Mutex<ConnectionType>,
    events: broadcast::Sender<ConnectionType>,
}

impl SimulatedNetwork {
    pub fn new(connection: ConnectionType) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            connection: Mutex::new(connection),
            events,
        }
    }

    pub fn connection(&self) -> ConnectionType {
        *self.connection.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Switch connection and notify subscribers.
    pub fn set_connection(&self, connection: ConnectionType) {
        debug!(?connection, "SimulatedNetwork::set_connection: called");
        *self.connection.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = connection;
        // No subscribers is fine
        let _ = self.events.send(connection);
    }
}

impl Default for SimulatedNetwork {
    fn default() -> Self {
        Self::new(ConnectionType::Wifi)
    }
}

impl NetworkState for SimulatedNetwork {
    fn is_offline(&self) -> bool {
        self.connection().is_offline()
    }

    fn connection_is_metered(&self) -> bool {
        self.connection().is_metered()
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionType> {
        self.events.subscribe()
    }
}

/// Preferences held in memory.
#[derive(Debug, Default)]
pub struct StaticPreferences {
    feature_disabled: AtomicBool,
    disable_over_metered: AtomicBool,
}

impl StaticPreferences {
    pub fn new(feature_disabled: bool, disable_over_metered: bool) -> Self {
        Self {
            feature_disabled: AtomicBool::new(feature_disabled),
            disable_over_metered: AtomicBool::new(disable_over_metered),
        }
    }

    pub fn set_feature_disabled(&self, value: bool) {
        self.feature_disabled.store(value, Ordering::SeqCst);
    }

    pub fn set_disable_over_metered(&self, value: bool) {
        self.disable_over_metered.store(value, Ordering::SeqCst);
    }
}

impl Preferences for StaticPreferences {
    fn feature_disabled(&self) -> bool {
        self.feature_disabled.load(Ordering::SeqCst)
    }

    fn disable_over_metered(&self) -> bool {
        self.disable_over_metered.load(Ordering::SeqCst)
    }
}
