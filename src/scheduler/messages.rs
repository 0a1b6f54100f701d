//! Scheduler mailbox messages
//!
//! Everything that touches scheduler state arrives here as a command, so the
//! actor task is the only place state is ever mutated.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::dispatch::Completion;
use super::queue::QueueStats;
use crate::domain::{JobId, JobInfo, Operation, PriorityClass, QueueType};
use crate::network::ConnectionType;

/// Aggregated scheduler counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub total_submitted: u64,
    pub total_completed: u64,
    pub total_throttled: u64,
    /// Current consecutive throttle count
    pub throttle_count: u32,
    pub metadata: QueueStats,
    pub file: QueueStats,
}

impl SchedulerStats {
    pub fn queue(&self, queue: QueueType) -> &QueueStats {
        match queue {
            QueueType::Metadata => &self.metadata,
            QueueType::File => &self.file,
        }
    }
}

/// Commands processed by the scheduler actor
pub enum SchedulerCommand {
    /// New job from a caller
    Submit {
        priority: PriorityClass,
        operation: Operation,
    },

    /// Deferred continuation of a queue's job loop
    RunLoop(QueueType),

    /// A running job's remote call finished
    JobDone {
        info: JobInfo,
        completion: Completion,
    },

    /// Transfer progress for a running job
    JobProgress {
        id: JobId,
        completed_bytes: i64,
        total_bytes: i64,
    },

    /// The network provider reported a connection change
    ConnectionChanged(ConnectionType),

    /// Snapshot of running and waiting jobs
    ListJobs {
        reply: oneshot::Sender<Vec<JobInfo>>,
    },

    /// Snapshot of counters
    GetStats {
        reply: oneshot::Sender<SchedulerStats>,
    },

    /// Stop the actor and drop every waiting job
    Shutdown,
}
