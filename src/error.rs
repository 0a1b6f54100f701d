//! Error types for drivesched
//!
//! Centralized error handling using thiserror. Remote-service failures are
//! not represented here: they travel to callers as [`crate::api::ApiStatus`]
//! values, untouched by the scheduler.

use thiserror::Error;

/// Errors raised by the scheduler itself
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler actor has stopped and no longer accepts commands
    #[error("Scheduler is shut down")]
    ChannelClosed,

    /// The scheduler stopped before answering a query
    #[error("Scheduler dropped the reply for {0}")]
    ReplyDropped(&'static str),

    /// Configuration rejected at spawn time
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;
