//! drivesched - request scheduling core for a remote-storage sync client
//!
//! Every remote call (metadata queries, directory mutations, uploads and
//! downloads) goes through a [`SchedulerHandle`]. The scheduler keeps two
//! priority queues with independent concurrency caps, backs off globally
//! when the service throttles, and holds jobs back while the network or the
//! user's preferences don't allow them to run.

pub mod api;
pub mod domain;
pub mod error;
pub mod network;
pub mod scheduler;

pub use api::{ApiStatus, FileError, RemoteService, Uploader};
pub use domain::{JobId, JobInfo, JobState, JobType, Operation, PriorityClass, QueueType};
pub use error::{Result, SchedulerError};
pub use network::{ConnectionType, NetworkState, Preferences};
pub use scheduler::{Collaborators, Scheduler, SchedulerConfig, SchedulerHandle, SchedulerStats};
