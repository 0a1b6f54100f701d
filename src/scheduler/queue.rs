//! Priority queues and running-count bookkeeping.
//!
//! Each queue keeps its waiting jobs sorted by priority class. The sort is
//! stable, so equal-priority jobs stay in submission order and a requeued job
//! lands behind the jobs already waiting in its band.

use serde::{Deserialize, Serialize};

use crate::domain::{Job, JobInfo, QueueType};

/// Snapshot of one queue for stats display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub queued: usize,
    pub running: usize,
    pub max_jobs: usize,
    pub peak_running: usize,
}

#[derive(Debug)]
struct JobQueue {
    waiting: Vec<Job>,
    running: usize,
    max_jobs: usize,
    peak_running: usize,
}

impl JobQueue {
    fn new(max_jobs: usize) -> Self {
        Self {
            waiting: Vec::new(),
            running: 0,
            max_jobs,
            peak_running: 0,
        }
    }
}

/// Owner of the metadata and file queues.
#[derive(Debug)]
pub struct QueueManager {
    queues: [JobQueue; 2],
}

impl QueueManager {
    pub fn new(metadata_max_jobs: usize, file_max_jobs: usize) -> Self {
        Self {
            queues: [JobQueue::new(metadata_max_jobs), JobQueue::new(file_max_jobs)],
        }
    }

    fn queue(&self, queue: QueueType) -> &JobQueue {
        &self.queues[queue.index()]
    }

    fn queue_mut(&mut self, queue: QueueType) -> &mut JobQueue {
        &mut self.queues[queue.index()]
    }

    /// Append `job` to its queue and restore priority order. Returns the queue.
    pub fn enqueue(&mut self, job: Job) -> QueueType {
        let queue_type = job.queue_type();
        let queue = self.queue_mut(queue_type);
        queue.waiting.push(job);
        queue.waiting.sort_by_key(|j| j.priority());
        queue_type
    }

    /// First waiting job, if any.
    pub fn peek_next(&self, queue: QueueType) -> Option<&Job> {
        self.queue(queue).waiting.first()
    }

    /// Take the head job out of the waiting list and count it as running.
    pub fn mark_running(&mut self, queue: QueueType) -> Option<Job> {
        let queue = self.queue_mut(queue);
        if queue.waiting.is_empty() {
            return None;
        }
        let job = queue.waiting.remove(0);
        queue.running += 1;
        queue.peak_running = queue.peak_running.max(queue.running);
        Some(job)
    }

    /// A running job of `queue` has reported back.
    pub fn mark_finished(&mut self, queue: QueueType) {
        let queue = self.queue_mut(queue);
        queue.running = queue.running.saturating_sub(1);
    }

    pub fn running_count(&self, queue: QueueType) -> usize {
        self.queue(queue).running
    }

    pub fn max_jobs(&self, queue: QueueType) -> usize {
        self.queue(queue).max_jobs
    }

    pub fn has_capacity(&self, queue: QueueType) -> bool {
        let queue = self.queue(queue);
        queue.running < queue.max_jobs
    }

    pub fn len(&self, queue: QueueType) -> usize {
        self.queue(queue).waiting.len()
    }

    pub fn is_empty(&self, queue: QueueType) -> bool {
        self.queue(queue).waiting.is_empty()
    }

    /// Waiting jobs of `queue` in dispatch order.
    pub fn waiting(&self, queue: QueueType) -> impl Iterator<Item = &JobInfo> {
        self.queue(queue).waiting.iter().map(|job| &job.info)
    }

    pub fn stats(&self, queue: QueueType) -> QueueStats {
        let queue = self.queue(queue);
        QueueStats {
            queued: queue.waiting.len(),
            running: queue.running,
            max_jobs: queue.max_jobs,
            peak_running: queue.peak_running,
        }
    }
}
