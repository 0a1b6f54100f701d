//! In-process stand-in for the remote service.
//!
//! Each call sleeps for a configurable latency and then either succeeds with a
//! synthetic payload or answers `ServiceUnavailable` with probability
//! `throttle_rate`. Used by the `simulate` command to exercise the scheduler
//! without a network.

use async_trait::async_trait;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::service::{GetContentCallback, ProgressCallback, RemoteService, Uploader};
use super::status::ApiStatus;
use super::types::{AboutResource, AccountMetadata, AppList, AppResource, ResourceEntry, ResourceList, UploadOutcome};

const CHUNK_COUNT: i64 = 4;
const CHUNK_BYTES: usize = 256;

/// Fake service with latency and random throttling.
#[derive(Debug)]
pub struct SimulatedRemote {
    latency: Duration,
    throttle_rate: f64,
    calls: AtomicU64,
    throttled: AtomicU64,
}

impl SimulatedRemote {
    pub fn new(latency: Duration, throttle_rate: f64) -> Self {
        let throttle_rate = if throttle_rate.is_nan() {
            0.0
        } else {
            throttle_rate.clamp(0.0, 1.0)
        };
        Self {
            latency,
            throttle_rate,
            calls: AtomicU64::new(0),
            throttled: AtomicU64::new(0),
        }
    }

    /// Number of calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Number of calls answered with `ServiceUnavailable`.
    pub fn throttled(&self) -> u64 {
        self.throttled.load(Ordering::Relaxed)
    }

    async fn roundtrip(&self, what: &str) -> ApiStatus {
        tokio::time::sleep(self.latency).await;
        self.calls.fetch_add(1, Ordering::Relaxed);

        let throttle = rand::rng().random_bool(self.throttle_rate);
        if throttle {
            self.throttled.fetch_add(1, Ordering::Relaxed);
            debug!(%what, "SimulatedRemote: throttling call");
            ApiStatus::ServiceUnavailable
        } else {
            debug!(%what, "SimulatedRemote: call succeeded");
            ApiStatus::Success
        }
    }

    async fn entry(&self, what: &str, resource_id: &str, title: &str) -> (ApiStatus, Option<ResourceEntry>) {
        let status = self.roundtrip(what).await;
        (status, status.is_success().then(|| ResourceEntry::new(resource_id, title)))
    }

    async fn list(&self, what: &str, prefix: &str) -> (ApiStatus, Option<ResourceList>) {
        let status = self.roundtrip(what).await;
        let list = status.is_success().then(|| ResourceList {
            entries: (0..3)
                .map(|i| ResourceEntry::new(format!("{}-{}", prefix, i), format!("{} item {}", prefix, i)))
                .collect(),
            largest_changestamp: 42,
            next_link: None,
        });
        (status, list)
    }
}

#[async_trait]
impl RemoteService for SimulatedRemote {
    async fn get_about_resource(&self) -> (ApiStatus, Option<AboutResource>) {
        let status = self.roundtrip("about").await;
        let about = status.is_success().then(|| AboutResource {
            largest_change_id: 42,
            quota_bytes_total: 15 << 30,
            quota_bytes_used: 3 << 30,
            root_folder_id: "root".to_string(),
        });
        (status, about)
    }

    async fn get_account_metadata(&self) -> (ApiStatus, Option<AccountMetadata>) {
        let status = self.roundtrip("account").await;
        let metadata = status.is_success().then(|| AccountMetadata {
            largest_changestamp: 42,
            quota_bytes_total: 15 << 30,
            quota_bytes_used: 3 << 30,
            installed_apps: vec!["viewer".to_string()],
        });
        (status, metadata)
    }

    async fn get_app_list(&self) -> (ApiStatus, Option<AppList>) {
        let status = self.roundtrip("apps").await;
        let apps = status.is_success().then(|| AppList {
            items: vec![AppResource {
                application_id: "viewer".to_string(),
                name: "Viewer".to_string(),
                primary_mimetypes: vec!["text/plain".to_string()],
            }],
        });
        (status, apps)
    }

    async fn get_all_resource_list(&self) -> (ApiStatus, Option<ResourceList>) {
        self.list("all", "all").await
    }

    async fn get_resource_list_in_directory(&self, directory_resource_id: &str) -> (ApiStatus, Option<ResourceList>) {
        self.list("directory", directory_resource_id).await
    }

    async fn search(&self, query: &str) -> (ApiStatus, Option<ResourceList>) {
        self.list("search", query).await
    }

    async fn get_change_list(&self, start_changestamp: i64) -> (ApiStatus, Option<ResourceList>) {
        self.list("changes", &format!("change-{}", start_changestamp)).await
    }

    async fn continue_get_resource_list(&self, feed_url: &str) -> (ApiStatus, Option<ResourceList>) {
        self.list("continue", feed_url).await
    }

    async fn get_resource_entry(&self, resource_id: &str) -> (ApiStatus, Option<ResourceEntry>) {
        self.entry("entry", resource_id, resource_id).await
    }

    async fn delete_resource(&self, _resource_id: &str) -> ApiStatus {
        self.roundtrip("delete").await
    }

    async fn copy_hosted_document(&self, resource_id: &str, new_name: &str) -> (ApiStatus, Option<ResourceEntry>) {
        self.entry("copy", &format!("{}-copy", resource_id), new_name).await
    }

    async fn rename_resource(&self, _resource_id: &str, _new_name: &str) -> ApiStatus {
        self.roundtrip("rename").await
    }

    async fn add_resource_to_directory(&self, _parent_resource_id: &str, _resource_id: &str) -> ApiStatus {
        self.roundtrip("add to directory").await
    }

    async fn remove_resource_from_directory(&self, _parent_resource_id: &str, _resource_id: &str) -> ApiStatus {
        self.roundtrip("remove from directory").await
    }

    async fn add_new_directory(
        &self,
        parent_resource_id: &str,
        directory_name: &str,
    ) -> (ApiStatus, Option<ResourceEntry>) {
        let (status, entry) = self.entry("mkdir", directory_name, directory_name).await;
        let entry = entry.map(|e| ResourceEntry {
            parent_resource_id: Some(parent_resource_id.to_string()),
            is_directory: true,
            ..e
        });
        (status, entry)
    }

    async fn download_file(
        &self,
        _virtual_path: &Path,
        local_cache_path: &Path,
        _download_url: &str,
        content: Option<GetContentCallback>,
        progress: ProgressCallback,
    ) -> (ApiStatus, PathBuf) {
        let status = self.roundtrip("download").await;
        if status.is_success() {
            let total = CHUNK_COUNT * CHUNK_BYTES as i64;
            let chunk = vec![0u8; CHUNK_BYTES];
            for i in 1..=CHUNK_COUNT {
                if let Some(content) = &content {
                    content(status, &chunk);
                }
                progress(i * CHUNK_BYTES as i64, total);
            }
        }
        (status, local_cache_path.with_extension("tmp"))
    }
}

#[async_trait]
impl Uploader for SimulatedRemote {
    async fn upload_new_file(
        &self,
        parent_resource_id: &str,
        drive_file_path: &Path,
        local_file_path: &Path,
        title: &str,
        _content_type: &str,
        progress: ProgressCallback,
    ) -> UploadOutcome {
        let status = self.roundtrip("upload new").await;
        if status.is_success() {
            progress(1, 1);
        }
        UploadOutcome {
            status,
            drive_path: drive_file_path.to_path_buf(),
            local_path: local_file_path.to_path_buf(),
            entry: status.is_success().then(|| ResourceEntry {
                parent_resource_id: Some(parent_resource_id.to_string()),
                ..ResourceEntry::new(format!("new-{}", title), title)
            }),
        }
    }

    async fn upload_existing_file(
        &self,
        resource_id: &str,
        drive_file_path: &Path,
        local_file_path: &Path,
        _content_type: &str,
        etag: &str,
        progress: ProgressCallback,
    ) -> UploadOutcome {
        let status = self.roundtrip("upload existing").await;
        if status.is_success() {
            progress(1, 1);
        }
        UploadOutcome {
            status,
            drive_path: drive_file_path.to_path_buf(),
            local_path: local_file_path.to_path_buf(),
            entry: status.is_success().then(|| ResourceEntry {
                etag: format!("{}+1", etag),
                ..ResourceEntry::new(resource_id, resource_id)
            }),
        }
    }
}
