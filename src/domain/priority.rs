//! Caller-supplied priority classes.
//!
//! Ordering is `UserInitiated < Background < Prefetch`, so an ascending sort
//! puts the most urgent jobs first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Urgency of a job, chosen by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    /// Someone is waiting on the result
    #[default]
    UserInitiated,
    /// Sync work nobody is watching
    Background,
    /// Speculative fetches
    Prefetch,
}

impl PriorityClass {
    pub const ALL: [PriorityClass; 3] = [Self::UserInitiated, Self::Background, Self::Prefetch];

    /// Background and prefetch jobs yield to metered-connection policy.
    pub fn is_deferrable(&self) -> bool {
        matches!(self, Self::Background | Self::Prefetch)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserInitiated => "user_initiated",
            Self::Background => "background",
            Self::Prefetch => "prefetch",
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "user_initiated" | "user" => Ok(Self::UserInitiated),
            "background" => Ok(Self::Background),
            "prefetch" => Ok(Self::Prefetch),
            other => Err(format!("unknown priority class: {}", other)),
        }
    }
}
