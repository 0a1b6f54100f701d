//! Scheduler integration tests
//!
//! Drive a real scheduler through its public handle against the scripted
//! mock service: every remote call parks until the test answers it.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use drivesched::api::{ApiStatus, MockCall, MockCalls, MockRemoteService, ProgressCallback, UploadOutcome, Uploader};
use drivesched::domain::{JobState, JobType, PriorityClass};
use drivesched::network::{ConnectionType, SimulatedNetwork, StaticPreferences};
use drivesched::scheduler::{Collaborators, Scheduler, SchedulerConfig, SchedulerHandle};
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(3);

struct Harness {
    handle: SchedulerHandle,
    calls: MockCalls,
    network: Arc<SimulatedNetwork>,
}

fn harness(config: SchedulerConfig, connection: ConnectionType, disable_over_metered: bool) -> Harness {
    let (mock, calls) = MockRemoteService::new();
    let mock = Arc::new(mock);
    let network = Arc::new(SimulatedNetwork::new(connection));
    let handle = Scheduler::spawn(
        config,
        Collaborators {
            service: mock.clone(),
            uploader: mock,
            network: network.clone(),
            preferences: Arc::new(StaticPreferences::new(false, disable_over_metered)),
        },
    )
    .expect("default config is valid");
    Harness { handle, calls, network }
}

fn online() -> Harness {
    harness(SchedulerConfig::default(), ConnectionType::Wifi, false)
}

async fn next_call(calls: &mut MockCalls) -> MockCall {
    tokio::time::timeout(WAIT, calls.next())
        .await
        .expect("timed out waiting for a remote call")
        .expect("mock service closed")
}

/// Give spawned call tasks a moment, then check nothing else was issued.
async fn assert_no_call(calls: &mut MockCalls) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    if let Some(call) = calls.try_next() {
        panic!("unexpected remote call {:?} for {}", call.job_type, call.target);
    }
}

fn download(handle: &SchedulerHandle, name: &str, priority: PriorityClass, done: &mpsc::UnboundedSender<String>) {
    let done = done.clone();
    let label = name.to_string();
    handle.download_file(
        format!("/drive/root/{}", name),
        format!("/cache/{}", name),
        format!("https://example.test/{}", name),
        priority,
        None,
        move |_, _| {
            let _ = done.send(label);
        },
    );
}

#[tokio::test]
async fn test_metadata_queue_never_exceeds_five_running() {
    let mut h = online();
    let (done_tx, mut done) = mpsc::unbounded_channel();

    for i in 0..8 {
        let done_tx = done_tx.clone();
        h.handle.search(format!("q{}", i), move |status, _| {
            let _ = done_tx.send(status);
        });
    }

    let stats = h.handle.stats().await.unwrap();
    assert_eq!(stats.metadata.running, 5);
    assert_eq!(stats.metadata.queued, 3);

    let mut parked = Vec::new();
    for _ in 0..5 {
        parked.push(next_call(&mut h.calls).await);
    }
    assert_no_call(&mut h.calls).await;

    // Each completion frees exactly one slot
    let mut answered = 0;
    while answered < 8 {
        let call = match parked.pop() {
            Some(call) => call,
            None => next_call(&mut h.calls).await,
        };
        call.respond(ApiStatus::Success);
        answered += 1;
        let status = tokio::time::timeout(WAIT, done.recv()).await.unwrap().unwrap();
        assert_eq!(status, ApiStatus::Success);

        let stats = h.handle.stats().await.unwrap();
        assert!(stats.metadata.running <= 5);
    }

    let stats = h.handle.stats().await.unwrap();
    assert_eq!(stats.total_completed, 8);
    assert_eq!(stats.metadata.peak_running, 5);
    assert_eq!(stats.metadata.running, 0);
}

#[tokio::test]
async fn test_user_initiated_jumps_ahead_of_background() {
    let mut h = online();
    let (done_tx, mut done) = mpsc::unbounded_channel();

    // Occupy the single file slot
    download(&h.handle, "blocker", PriorityClass::UserInitiated, &done_tx);
    let blocker = next_call(&mut h.calls).await;

    download(&h.handle, "background", PriorityClass::Background, &done_tx);
    download(&h.handle, "urgent", PriorityClass::UserInitiated, &done_tx);

    blocker.respond(ApiStatus::Success);
    assert_eq!(done.recv().await.unwrap(), "blocker");

    let second = next_call(&mut h.calls).await;
    assert_eq!(second.job_type, JobType::DownloadFile);
    assert_eq!(second.target, "/drive/root/urgent");
    second.respond(ApiStatus::Success);
    assert_eq!(done.recv().await.unwrap(), "urgent");

    let third = next_call(&mut h.calls).await;
    assert_eq!(third.target, "/drive/root/background");
    third.respond(ApiStatus::Success);
    assert_eq!(done.recv().await.unwrap(), "background");
}

#[tokio::test]
async fn test_equal_priority_is_fifo() {
    let mut h = online();
    let (done_tx, _done) = mpsc::unbounded_channel();

    download(&h.handle, "blocker", PriorityClass::Prefetch, &done_tx);
    let blocker = next_call(&mut h.calls).await;

    download(&h.handle, "first", PriorityClass::Background, &done_tx);
    download(&h.handle, "second", PriorityClass::Background, &done_tx);

    blocker.respond(ApiStatus::Success);
    let call = next_call(&mut h.calls).await;
    assert_eq!(call.target, "/drive/root/first");
    call.respond(ApiStatus::Success);

    let call = next_call(&mut h.calls).await;
    assert_eq!(call.target, "/drive/root/second");
    call.respond(ApiStatus::Success);
}

#[tokio::test]
async fn test_throttled_job_is_retried_without_callback() {
    let mut h = harness(
        SchedulerConfig::default().without_throttling(),
        ConnectionType::Wifi,
        false,
    );
    let invoked = Arc::new(AtomicUsize::new(0));
    let (done_tx, mut done) = mpsc::unbounded_channel();

    let counter = invoked.clone();
    h.handle
        .get_resource_entry("file:42", PriorityClass::UserInitiated, move |status, entry| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = done_tx.send((status, entry));
        });

    let call = next_call(&mut h.calls).await;
    call.respond(ApiStatus::ServiceUnavailable);

    let retry = next_call(&mut h.calls).await;
    assert_eq!(retry.job_type, JobType::GetResourceEntry);
    assert_eq!(retry.target, "file:42");
    assert_eq!(invoked.load(Ordering::SeqCst), 0);

    let stats = h.handle.stats().await.unwrap();
    assert_eq!(stats.total_throttled, 1);
    assert_eq!(stats.throttle_count, 1);

    retry.respond(ApiStatus::Success);
    let (status, entry) = tokio::time::timeout(WAIT, done.recv()).await.unwrap().unwrap();
    assert_eq!(status, ApiStatus::Success);
    assert_eq!(entry.unwrap().resource_id, "file:42");
    assert_eq!(invoked.load(Ordering::SeqCst), 1);

    let stats = h.handle.stats().await.unwrap();
    assert_eq!(stats.throttle_count, 0);
    assert_eq!(stats.total_completed, 1);
}

#[tokio::test]
async fn test_throttled_job_waits_out_backoff() {
    let config = SchedulerConfig {
        max_jitter_ms: 0,
        ..Default::default()
    };
    let mut h = harness(config, ConnectionType::Wifi, false);

    h.handle.rename_resource("file:7", "seven.txt", |_| {});
    next_call(&mut h.calls).await.respond(ApiStatus::ServiceUnavailable);

    // First backoff is one second; the job sits in its queue meanwhile
    tokio::time::sleep(Duration::from_millis(200)).await;
    let jobs = h.handle.jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].state, JobState::Retrying);
    assert!(h.calls.try_next().is_none());

    let retry = next_call(&mut h.calls).await;
    assert_eq!(retry.job_type, JobType::RenameResource);
    assert_eq!(h.handle.jobs().await.unwrap()[0].state, JobState::Running);
}

#[tokio::test]
async fn test_not_found_is_delivered_once_without_retry() {
    let mut h = online();
    let invoked = Arc::new(AtomicUsize::new(0));
    let (done_tx, mut done) = mpsc::unbounded_channel();

    let counter = invoked.clone();
    h.handle
        .get_resource_entry("file:missing", PriorityClass::Background, move |status, entry| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = done_tx.send((status, entry));
        });

    next_call(&mut h.calls).await.respond(ApiStatus::NotFound);
    let (status, entry) = tokio::time::timeout(WAIT, done.recv()).await.unwrap().unwrap();
    assert_eq!(status, ApiStatus::NotFound);
    assert!(entry.is_none());

    assert_no_call(&mut h.calls).await;
    assert_eq!(invoked.load(Ordering::SeqCst), 1);

    let stats = h.handle.stats().await.unwrap();
    assert_eq!(stats.total_throttled, 0);
    assert_eq!(stats.throttle_count, 0);
}

#[tokio::test]
async fn test_offline_job_runs_when_network_returns() {
    let mut h = harness(SchedulerConfig::default(), ConnectionType::None, false);
    let (done_tx, mut done) = mpsc::unbounded_channel();

    h.handle.search("offline query", move |status, _| {
        let _ = done_tx.send(status);
    });

    let jobs = h.handle.jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].state, JobState::Queued);
    assert_no_call(&mut h.calls).await;

    h.network.set_connection(ConnectionType::Wifi);

    let call = next_call(&mut h.calls).await;
    assert_eq!(call.target, "offline query");
    assert_eq!(h.handle.jobs().await.unwrap()[0].state, JobState::Running);

    call.respond(ApiStatus::Success);
    assert_eq!(done.recv().await.unwrap(), ApiStatus::Success);
}

#[tokio::test]
async fn test_going_offline_parks_remaining_jobs() {
    let mut h = online();
    let (done_tx, mut done) = mpsc::unbounded_channel();

    download(&h.handle, "a", PriorityClass::UserInitiated, &done_tx);
    download(&h.handle, "b", PriorityClass::UserInitiated, &done_tx);
    let first = next_call(&mut h.calls).await;

    h.network.set_connection(ConnectionType::None);
    first.respond(ApiStatus::Success);
    assert_eq!(done.recv().await.unwrap(), "a");

    assert_no_call(&mut h.calls).await;
    let jobs = h.handle.jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].state, JobState::Queued);

    h.network.set_connection(ConnectionType::Ethernet);
    assert_eq!(next_call(&mut h.calls).await.target, "/drive/root/b");
}

#[tokio::test]
async fn test_metered_policy_only_holds_background_transfers() {
    let mut h = harness(SchedulerConfig::default(), ConnectionType::Cellular, true);
    let (done_tx, mut done) = mpsc::unbounded_channel();

    download(&h.handle, "background", PriorityClass::Background, &done_tx);
    download(&h.handle, "urgent", PriorityClass::UserInitiated, &done_tx);
    h.handle.get_resource_entry("file:1", PriorityClass::Background, |_, _| {});

    let mut targets = vec![
        next_call(&mut h.calls).await,
        next_call(&mut h.calls).await,
    ];
    targets.sort_by(|a, b| a.target.cmp(&b.target));
    assert_eq!(targets[0].target, "/drive/root/urgent");
    assert_eq!(targets[1].target, "file:1");

    for call in targets {
        call.respond(ApiStatus::Success);
    }
    assert_eq!(done.recv().await.unwrap(), "urgent");

    // The background download is still held back
    assert_no_call(&mut h.calls).await;
    let waiting: Vec<_> = h
        .handle
        .jobs()
        .await
        .unwrap()
        .into_iter()
        .filter(|job| job.job_type == JobType::DownloadFile)
        .collect();
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].priority, PriorityClass::Background);
    assert_eq!(waiting[0].state, JobState::Queued);

    h.network.set_connection(ConnectionType::Wifi);
    assert_eq!(next_call(&mut h.calls).await.target, "/drive/root/background");
}

#[tokio::test]
async fn test_feature_disabled_holds_everything() {
    let (mock, mut calls) = MockRemoteService::new();
    let mock = Arc::new(mock);
    let preferences = Arc::new(StaticPreferences::new(true, false));
    let network = Arc::new(SimulatedNetwork::new(ConnectionType::Wifi));
    let handle = Scheduler::spawn(
        SchedulerConfig::default(),
        Collaborators {
            service: mock.clone(),
            uploader: mock,
            network: network.clone(),
            preferences: preferences.clone(),
        },
    )
    .unwrap();

    handle.get_about_resource(|_, _| {});
    assert_eq!(handle.jobs().await.unwrap()[0].state, JobState::Queued);
    assert_no_call(&mut calls).await;

    preferences.set_feature_disabled(false);
    network.set_connection(ConnectionType::Wifi);
    assert_eq!(next_call(&mut calls).await.job_type, JobType::GetAboutResource);
}

#[tokio::test]
async fn test_shutdown_drops_queued_and_late_completions() {
    let mut h = online();
    let invoked = Arc::new(AtomicUsize::new(0));

    let counter = invoked.clone();
    h.handle.search("in flight", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    for name in ["running", "queued"] {
        let counter = invoked.clone();
        h.handle.download_file(
            format!("/drive/root/{}", name),
            format!("/cache/{}", name),
            "https://example.test/file",
            PriorityClass::UserInitiated,
            None,
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
    }

    let mut in_flight = vec![next_call(&mut h.calls).await, next_call(&mut h.calls).await];

    h.handle.shutdown();
    tokio::time::timeout(WAIT, async {
        while !h.handle.is_closed() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    // One late completion while a handle still exists, one after all are gone
    in_flight.pop().unwrap().respond(ApiStatus::Success);
    drop(h.handle);
    in_flight.pop().unwrap().respond(ApiStatus::Success);

    assert_no_call(&mut h.calls).await;
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dropping_every_handle_stops_the_scheduler() {
    let mut h = online();
    let invoked = Arc::new(AtomicUsize::new(0));

    let counter = invoked.clone();
    h.handle.delete_resource("file:9", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let call = next_call(&mut h.calls).await;

    let clone = h.handle.clone();
    drop(h.handle);
    assert!(!clone.is_closed());
    drop(clone);

    call.respond(ApiStatus::Success);
    assert_no_call(&mut h.calls).await;
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_every_entry_point_reaches_the_service() {
    let mut h = online();
    let handle = &h.handle;
    let (done_tx, mut done) = mpsc::unbounded_channel::<ApiStatus>();

    macro_rules! tx {
        () => {{
            let done_tx = done_tx.clone();
            move |status: ApiStatus| {
                let _ = done_tx.send(status);
            }
        }};
    }

    let t = tx!();
    handle.get_about_resource(move |s, _| t(s));
    let t = tx!();
    handle.get_account_metadata(move |s, _| t(s));
    let t = tx!();
    handle.get_app_list(move |s, _| t(s));
    let t = tx!();
    handle.get_all_resource_list(move |s, _| t(s));
    let t = tx!();
    handle.get_resource_list_in_directory("folder:1", move |s, _| t(s));
    let t = tx!();
    handle.search("q", move |s, _| t(s));
    let t = tx!();
    handle.get_change_list(10, move |s, _| t(s));
    let t = tx!();
    handle.continue_get_resource_list("https://example.test/next", move |s, _| t(s));
    let t = tx!();
    handle.get_resource_entry("file:1", PriorityClass::UserInitiated, move |s, _| t(s));
    let t = tx!();
    handle.delete_resource("file:2", t);
    let t = tx!();
    handle.copy_hosted_document("doc:1", "copy", move |s, _| t(s));
    let t = tx!();
    handle.rename_resource("file:3", "renamed", t);
    let t = tx!();
    handle.add_resource_to_directory("folder:1", "file:4", t);
    let t = tx!();
    handle.remove_resource_from_directory("folder:1", "file:5", t);
    let t = tx!();
    handle.add_new_directory("folder:1", "child", move |s, _| t(s));
    let t = tx!();
    handle.download_file(
        "/drive/a",
        "/cache/a",
        "https://example.test/a",
        PriorityClass::UserInitiated,
        None,
        move |s, _| t(s),
    );
    let t = tx!();
    handle.upload_new_file(
        "folder:1",
        "/drive/b",
        "/tmp/b",
        "b",
        "text/plain",
        PriorityClass::UserInitiated,
        move |o| t(o.status),
    );
    let t = tx!();
    handle.upload_existing_file(
        "file:6",
        "/drive/c",
        "/tmp/c",
        "text/plain",
        "etag-1",
        PriorityClass::UserInitiated,
        move |o| t(o.status),
    );

    let mut seen = Vec::new();
    for _ in 0..18 {
        let call = next_call(&mut h.calls).await;
        seen.push(call.job_type);
        call.respond(ApiStatus::Success);
        assert_eq!(tokio::time::timeout(WAIT, done.recv()).await.unwrap().unwrap(), ApiStatus::Success);
    }

    seen.sort_by_key(|t| format!("{:?}", t));
    seen.dedup();
    assert_eq!(seen.len(), 18);
    let stats = h.handle.stats().await.unwrap();
    assert_eq!(stats.total_submitted, 18);
    assert_eq!(stats.total_completed, 18);
}

/// Uploader whose every call blows up mid-flight
struct PanickingUploader;

#[async_trait]
impl Uploader for PanickingUploader {
    async fn upload_new_file(
        &self,
        _parent_resource_id: &str,
        _drive_file_path: &Path,
        _local_file_path: &Path,
        _title: &str,
        _content_type: &str,
        _progress: ProgressCallback,
    ) -> UploadOutcome {
        panic!("uploader crashed");
    }

    async fn upload_existing_file(
        &self,
        _resource_id: &str,
        _drive_file_path: &Path,
        _local_file_path: &Path,
        _content_type: &str,
        _etag: &str,
        _progress: ProgressCallback,
    ) -> UploadOutcome {
        panic!("uploader crashed");
    }
}

#[tokio::test]
async fn test_panicking_remote_call_releases_its_slot() {
    let (mock, mut calls) = MockRemoteService::new();
    let handle = Scheduler::spawn(
        SchedulerConfig::default(),
        Collaborators {
            service: Arc::new(mock),
            uploader: Arc::new(PanickingUploader),
            network: Arc::new(SimulatedNetwork::new(ConnectionType::Wifi)),
            preferences: Arc::new(StaticPreferences::default()),
        },
    )
    .unwrap();
    let (done_tx, mut done) = mpsc::unbounded_channel();

    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = invoked.clone();
    handle.upload_new_file(
        "folder:root",
        "/drive/root/crash.txt",
        "/tmp/crash.txt",
        "crash.txt",
        "text/plain",
        PriorityClass::UserInitiated,
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );
    download(&handle, "after-crash", PriorityClass::UserInitiated, &done_tx);

    // The file queue holds one job; the download only starts once the upload slot is freed
    let call = next_call(&mut calls).await;
    assert_eq!(call.target, "/drive/root/after-crash");
    call.respond(ApiStatus::Success);
    assert_eq!(
        tokio::time::timeout(WAIT, done.recv()).await.unwrap().unwrap(),
        "after-crash"
    );

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.file.running, 0);
    assert_eq!(stats.file.queued, 0);
    assert_eq!(stats.total_completed, 2);
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_panicking_callback_does_not_stop_the_scheduler() {
    let mut h = online();
    let (done_tx, mut done) = mpsc::unbounded_channel();

    h.handle.download_file(
        "/drive/root/first",
        "/cache/first",
        "https://example.test/first",
        PriorityClass::UserInitiated,
        None,
        |_, _| panic!("caller bug"),
    );
    download(&h.handle, "second", PriorityClass::UserInitiated, &done_tx);

    next_call(&mut h.calls).await.respond(ApiStatus::Success);

    let call = next_call(&mut h.calls).await;
    assert_eq!(call.target, "/drive/root/second");
    call.respond(ApiStatus::Success);
    assert_eq!(tokio::time::timeout(WAIT, done.recv()).await.unwrap().unwrap(), "second");

    let stats = h.handle.stats().await.unwrap();
    assert_eq!(stats.total_completed, 2);
    assert!(!h.handle.is_closed());
}
