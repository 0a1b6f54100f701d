//! The scheduler actor.
//!
//! [`SchedulerCore`] owns both queues, the throttle counter and the table of
//! running jobs. It lives inside one tokio task and is driven exclusively by
//! [`SchedulerCommand`]s from its mailbox:
//!
//! - `Submit` enqueues and tries to advance the job's queue
//! - `RunLoop` is the deferred continuation of a queue's loop, posted after
//!   every completion (immediately, or after the throttle delay)
//! - `JobDone` is a remote call reporting back from its spawned task
//! - `ConnectionChanged` re-arms both queues when the network is usable
//!
//! Spawned tasks only ever hold a weak sender to the mailbox. Once the actor
//! has stopped, their completions fail to upgrade or to send and the job,
//! callback included, is dropped without being invoked.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, WeakUnboundedSender};
use tokio::task::JoinHandle;

use super::config::SchedulerConfig;
use super::dispatch::{self, Completion, Remote};
use super::gate::NetworkGate;
use super::messages::{SchedulerCommand, SchedulerStats};
use super::queue::QueueManager;
use super::throttle::ThrottleController;
use crate::api::{ApiStatus, ProgressCallback};
use crate::domain::{Job, JobId, JobInfo, JobState, Operation, PriorityClass, QueueType};
use crate::network::ConnectionType;

pub(crate) struct SchedulerCore {
    queues: QueueManager,
    throttle: ThrottleController,
    gate: NetworkGate,
    remote: Remote,
    /// Our own mailbox; weak so the actor never keeps itself alive.
    mailbox: WeakUnboundedSender<SchedulerCommand>,
    /// Jobs handed to the remote service, by id.
    running: HashMap<JobId, JobInfo>,
    next_job_id: u64,
    total_submitted: u64,
    total_completed: u64,
    total_throttled: u64,
    observer: Option<JoinHandle<()>>,
}

impl SchedulerCore {
    pub(crate) fn new(
        config: &SchedulerConfig,
        remote: Remote,
        gate: NetworkGate,
        mailbox: WeakUnboundedSender<SchedulerCommand>,
    ) -> Self {
        Self {
            queues: QueueManager::new(config.metadata_max_jobs, config.file_max_jobs),
            throttle: ThrottleController::new(config),
            gate,
            remote,
            mailbox,
            running: HashMap::new(),
            next_job_id: 1,
            total_submitted: 0,
            total_completed: 0,
            total_throttled: 0,
            observer: None,
        }
    }

    /// Attach the connection observer task; it is aborted when the actor stops.
    pub(crate) fn with_observer(mut self, observer: JoinHandle<()>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Process commands until shutdown or until every handle is gone.
    pub(crate) async fn run(mut self, mut commands: UnboundedReceiver<SchedulerCommand>) {
        tracing::info!("Scheduler started");

        while let Some(command) = commands.recv().await {
            match command {
                SchedulerCommand::Submit { priority, operation } => self.submit(priority, operation),
                SchedulerCommand::RunLoop(queue) => self.try_advance(queue),
                SchedulerCommand::JobDone { info, completion } => self.on_completion(info, completion),
                SchedulerCommand::JobProgress {
                    id,
                    completed_bytes,
                    total_bytes,
                } => self.on_progress(id, completed_bytes, total_bytes),
                SchedulerCommand::ConnectionChanged(connection) => self.on_connection_changed(connection),
                SchedulerCommand::ListJobs { reply } => {
                    let _ = reply.send(self.jobs());
                }
                SchedulerCommand::GetStats { reply } => {
                    let _ = reply.send(self.stats());
                }
                SchedulerCommand::Shutdown => break,
            }
        }

        let dropped = QueueType::ALL.iter().map(|q| self.queues.len(*q)).sum::<usize>();
        tracing::info!(
            dropped_jobs = dropped,
            in_flight = self.running.len(),
            "Scheduler stopped"
        );

        if let Some(observer) = self.observer.take() {
            observer.abort();
        }
    }

    fn submit(&mut self, priority: PriorityClass, operation: Operation) {
        let id = JobId(self.next_job_id);
        self.next_job_id += 1;
        self.total_submitted += 1;

        let job = Job::new(id, priority, operation);
        tracing::debug!(
            job_id = %id,
            job_type = ?job.info.job_type,
            %priority,
            "SchedulerCore::submit: queued"
        );

        let queue = self.queues.enqueue(job);
        self.try_advance(queue);
    }

    /// Run the loop of `queue` while it has free slots and something to start.
    ///
    /// Unlike a single `run_loop` step, one trigger (a submission, a
    /// completion, a reconnect) may start several jobs here, filling every
    /// free slot of the queue. The cap is rechecked before each step.
    fn try_advance(&mut self, queue: QueueType) {
        while self.queues.has_capacity(queue) {
            if !self.run_loop(queue) {
                break;
            }
        }
    }

    /// Start the head job of `queue` if the network allows it. Returns
    /// whether a job was dispatched.
    fn run_loop(&mut self, queue: QueueType) -> bool {
        let Some(head) = self.queues.peek_next(queue) else {
            return false;
        };

        if self.gate.should_defer(queue, head.priority()) {
            tracing::debug!(
                job_id = %head.id(),
                %queue,
                priority = %head.priority(),
                "SchedulerCore::run_loop: deferred by network gate"
            );
            return false;
        }

        let Some(mut job) = self.queues.mark_running(queue) else {
            return false;
        };
        job.info.state = JobState::Running;
        self.running.insert(job.id(), job.info.clone());
        self.dispatch(job);
        true
    }

    /// Hand `job` to a spawned task that issues the remote call.
    fn dispatch(&self, job: Job) {
        let Job { info, operation } = job;
        tracing::debug!(
            job_id = %info.id,
            queue = %info.queue_type(),
            target = %operation.target(),
            "SchedulerCore::dispatch: starting {:?}",
            info.job_type
        );

        let remote = self.remote.clone();
        let mailbox = self.mailbox.clone();
        let progress = progress_reporter(info.id, self.mailbox.clone());

        tokio::spawn(async move {
            let id = info.id;
            let call = tokio::spawn(async move { dispatch::execute(&remote, operation, progress).await });
            let completion = match call.await {
                Ok(completion) => completion,
                Err(e) => {
                    // The callback went down with the call; free the slot anyway
                    tracing::error!(job_id = %id, error = ?e, "Remote call task panicked");
                    Completion::abandoned(ApiStatus::OtherError)
                }
            };
            let delivered = mailbox
                .upgrade()
                .is_some_and(|tx| tx.send(SchedulerCommand::JobDone { info, completion }).is_ok());
            if !delivered {
                tracing::debug!(job_id = %id, "Scheduler gone, dropping completion");
            }
        });
    }

    fn on_completion(&mut self, info: JobInfo, completion: Completion) {
        let queue = info.queue_type();
        self.queues.mark_finished(queue);
        self.running.remove(&info.id);

        match completion {
            Completion::Throttled(operation) => {
                self.total_throttled += 1;
                let mut info = info;
                info.state = JobState::Retrying;
                info.completed_bytes = 0;
                tracing::debug!(job_id = %info.id, %queue, "SchedulerCore::on_completion: throttled, requeued");
                self.queues.enqueue(Job { info, operation });

                let delay = self.throttle.on_throttled();
                self.schedule_run_loop(queue, delay);
            }
            Completion::Finished { status, deliver } => {
                self.throttle.on_succeeded_or_terminal_error();
                self.schedule_run_loop(queue, Duration::ZERO);
                self.total_completed += 1;
                tracing::debug!(job_id = %info.id, %status, "SchedulerCore::on_completion: finished");
                if panic::catch_unwind(AssertUnwindSafe(deliver)).is_err() {
                    tracing::error!(job_id = %info.id, %status, "Job callback panicked");
                }
            }
        }
    }

    /// Post `RunLoop(queue)` to our own mailbox, after `delay` if non-zero.
    fn schedule_run_loop(&self, queue: QueueType, delay: Duration) {
        let mailbox = self.mailbox.clone();
        if delay.is_zero() {
            post(&mailbox, SchedulerCommand::RunLoop(queue));
            return;
        }

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            post(&mailbox, SchedulerCommand::RunLoop(queue));
        });
    }

    fn on_progress(&mut self, id: JobId, completed_bytes: i64, total_bytes: i64) {
        if let Some(info) = self.running.get_mut(&id) {
            info.completed_bytes = completed_bytes;
            info.total_bytes = total_bytes;
        }
    }

    fn on_connection_changed(&mut self, connection: ConnectionType) {
        if self.gate.is_offline() {
            tracing::debug!(?connection, "SchedulerCore: offline, queues stay parked");
            return;
        }

        tracing::info!(?connection, "Connection changed, re-arming queues");
        for queue in QueueType::ALL {
            self.try_advance(queue);
        }
    }

    /// Running jobs by id, then waiting jobs of each queue in dispatch order.
    fn jobs(&self) -> Vec<JobInfo> {
        let mut running: Vec<JobInfo> = self.running.values().cloned().collect();
        running.sort_by_key(|info| info.id);

        let waiting = QueueType::ALL
            .into_iter()
            .flat_map(|queue| self.queues.waiting(queue).cloned().collect::<Vec<_>>());
        running.into_iter().chain(waiting).collect()
    }

    fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            total_submitted: self.total_submitted,
            total_completed: self.total_completed,
            total_throttled: self.total_throttled,
            throttle_count: self.throttle.count(),
            metadata: self.queues.stats(QueueType::Metadata),
            file: self.queues.stats(QueueType::File),
        }
    }
}

fn post(mailbox: &WeakUnboundedSender<SchedulerCommand>, command: SchedulerCommand) {
    if let Some(tx) = mailbox.upgrade() {
        let _ = tx.send(command);
    }
}

/// Progress callback that forwards reports for job `id` to the actor.
fn progress_reporter(id: JobId, mailbox: WeakUnboundedSender<SchedulerCommand>) -> ProgressCallback {
    Arc::new(move |completed_bytes, total_bytes| {
        post(
            &mailbox,
            SchedulerCommand::JobProgress {
                id,
                completed_bytes,
                total_bytes,
            },
        );
    })
}
