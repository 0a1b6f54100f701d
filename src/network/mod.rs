//! Network-state and preference providers.
//!
//! The scheduler reads these on every gate decision and never caches their
//! answers. [`SimulatedNetwork`] and [`StaticPreferences`] are in-process
//! implementations used by tests and the `simulate` command.

mod simulated;

pub use simulated::{SimulatedNetwork, StaticPreferences};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Physical connection class as reported by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    #[default]
    Unknown,
    Ethernet,
    Wifi,
    Cellular,
    /// No connection at all
    None,
}

impl ConnectionType {
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_metered(&self) -> bool {
        matches!(self, Self::Cellular)
    }
}

/// Source of connectivity information.
pub trait NetworkState: Send + Sync {
    fn is_offline(&self) -> bool;

    fn connection_is_metered(&self) -> bool;

    /// Receive every connection change the provider observes.
    fn subscribe(&self) -> broadcast::Receiver<ConnectionType>;
}

/// User preferences consulted by the gate.
pub trait Preferences: Send + Sync {
    /// The remote-storage feature is switched off entirely.
    fn feature_disabled(&self) -> bool;

    /// Background file transfers must not use metered connections.
    fn disable_over_metered(&self) -> bool;
}
