//! Request scheduler for remote-storage calls.
//!
//! This module provides:
//! - **Queues**: a metadata queue (5 concurrent calls) and a file queue (1
//!   concurrent transfer), each ordered by priority class, FIFO within a class.
//! - **Throttle control**: global exponential backoff with jitter when the
//!   service answers `ServiceUnavailable`; throttled jobs are requeued.
//! - **Network gate**: jobs wait while offline or disabled, and background
//!   transfers wait on metered connections when the user asked for it.
//! - **Connection observer**: re-arms both queues when the network comes back.
//!
//! # Architecture
//!
//! All state lives in one actor task:
//! 1. Callers submit through a [`SchedulerHandle`] (never blocks)
//! 2. The actor enqueues and dispatches up to each queue's cap
//! 3. Each remote call runs in its own task and posts its completion back
//! 4. The actor requeues throttled jobs or delivers the result to the callback
//!
//! # Example
//!
//! ```ignore
//! use drivesched::scheduler::{Collaborators, Scheduler, SchedulerConfig};
//!
//! let handle = Scheduler::spawn(SchedulerConfig::default(), collaborators)?;
//! handle.search("title contains 'report'", |status, list| {
//!     println!("{status}: {:?}", list.map(|l| l.entries.len()));
//! });
//! ```

pub mod config;
mod core;
mod dispatch;
pub mod gate;
mod handle;
mod messages;
mod observer;
pub mod queue;
pub mod throttle;

pub use config::SchedulerConfig;
pub use gate::{NetworkConditions, NetworkGate, should_defer};
pub use handle::{Collaborators, Scheduler, SchedulerHandle};
pub use messages::SchedulerStats;
pub use queue::{QueueManager, QueueStats};
pub use throttle::ThrottleController;
