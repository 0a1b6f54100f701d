//! Scripted remote service for tests.
//!
//! Every call made through [`MockRemoteService`] is parked until the test
//! answers it through the paired [`MockCalls`] receiver. This lets tests hold
//! a queue's slots open, observe dispatch order, and choose which status each
//! call resolves with.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};

use super::service::{GetContentCallback, ProgressCallback, RemoteService, Uploader};
use super::status::ApiStatus;
use super::types::{AboutResource, AccountMetadata, AppList, ResourceEntry, ResourceList, UploadOutcome};
use crate::domain::JobType;

/// One parked remote call.
#[derive(Debug)]
pub struct MockCall {
    /// Which operation was invoked
    pub job_type: JobType,
    /// Main argument of the call (resource id, query, path...)
    pub target: String,
    reply: oneshot::Sender<ApiStatus>,
}

impl MockCall {
    /// Resolve the call with `status`.
    pub fn respond(self, status: ApiStatus) {
        // The caller may already be gone; that is what shutdown tests exercise.
        let _ = self.reply.send(status);
    }
}

/// Receiving side of a [`MockRemoteService`].
pub struct MockCalls {
    rx: mpsc::UnboundedReceiver<MockCall>,
}

impl MockCalls {
    /// Wait for the next call.
    pub async fn next(&mut self) -> Option<MockCall> {
        self.rx.recv().await
    }

    /// Take a call if one is already waiting.
    pub fn try_next(&mut self) -> Option<MockCall> {
        self.rx.try_recv().ok()
    }
}

/// Remote service and uploader whose calls are answered by the test.
#[derive(Clone)]
pub struct MockRemoteService {
    calls_tx: mpsc::UnboundedSender<MockCall>,
}

impl MockRemoteService {
    pub fn new() -> (Self, MockCalls) {
        let (calls_tx, rx) = mpsc::unbounded_channel();
        (Self { calls_tx }, MockCalls { rx })
    }

    async fn exchange(&self, job_type: JobType, target: impl Into<String>) -> ApiStatus {
        let (reply, reply_rx) = oneshot::channel();
        let call = MockCall {
            job_type,
            target: target.into(),
            reply,
        };
        if self.calls_tx.send(call).is_err() {
            return ApiStatus::Cancelled;
        }
        reply_rx.await.unwrap_or(ApiStatus::Cancelled)
    }

    async fn entry(&self, job_type: JobType, target: &str) -> (ApiStatus, Option<ResourceEntry>) {
        let status = self.exchange(job_type, target).await;
        (status, status.is_success().then(|| ResourceEntry::new(target, target)))
    }

    async fn list(&self, job_type: JobType, target: &str) -> (ApiStatus, Option<ResourceList>) {
        let status = self.exchange(job_type, target).await;
        let list = status.is_success().then(|| ResourceList {
            entries: vec![ResourceEntry::new(target, target)],
            ..Default::default()
        });
        (status, list)
    }
}

#[async_trait]
impl RemoteService for MockRemoteService {
    async fn get_about_resource(&self) -> (ApiStatus, Option<AboutResource>) {
        let status = self.exchange(JobType::GetAboutResource, "about").await;
        (status, status.is_success().then(AboutResource::default))
    }

    async fn get_account_metadata(&self) -> (ApiStatus, Option<AccountMetadata>) {
        let status = self.exchange(JobType::GetAccountMetadata, "account").await;
        (status, status.is_success().then(AccountMetadata::default))
    }

    async fn get_app_list(&self) -> (ApiStatus, Option<AppList>) {
        let status = self.exchange(JobType::GetAppList, "apps").await;
        (status, status.is_success().then(AppList::default))
    }

    async fn get_all_resource_list(&self) -> (ApiStatus, Option<ResourceList>) {
        self.list(JobType::GetAllResourceList, "all").await
    }

    async fn get_resource_list_in_directory(&self, directory_resource_id: &str) -> (ApiStatus, Option<ResourceList>) {
        self.list(JobType::GetResourceListInDirectory, directory_resource_id).await
    }

    async fn search(&self, query: &str) -> (ApiStatus, Option<ResourceList>) {
        self.list(JobType::Search, query).await
    }

    async fn get_change_list(&self, start_changestamp: i64) -> (ApiStatus, Option<ResourceList>) {
        self.list(JobType::GetChangeList, &start_changestamp.to_string()).await
    }

    async fn continue_get_resource_list(&self, feed_url: &str) -> (ApiStatus, Option<ResourceList>) {
        self.list(JobType::ContinueGetResourceList, feed_url).await
    }

    async fn get_resource_entry(&self, resource_id: &str) -> (ApiStatus, Option<ResourceEntry>) {
        self.entry(JobType::GetResourceEntry, resource_id).await
    }

    async fn delete_resource(&self, resource_id: &str) -> ApiStatus {
        self.exchange(JobType::DeleteResource, resource_id).await
    }

    async fn copy_hosted_document(&self, resource_id: &str, new_name: &str) -> (ApiStatus, Option<ResourceEntry>) {
        let status = self.exchange(JobType::CopyHostedDocument, resource_id).await;
        (status, status.is_success().then(|| ResourceEntry::new(resource_id, new_name)))
    }

    async fn rename_resource(&self, resource_id: &str, _new_name: &str) -> ApiStatus {
        self.exchange(JobType::RenameResource, resource_id).await
    }

    async fn add_resource_to_directory(&self, _parent_resource_id: &str, resource_id: &str) -> ApiStatus {
        self.exchange(JobType::AddResourceToDirectory, resource_id).await
    }

    async fn remove_resource_from_directory(&self, _parent_resource_id: &str, resource_id: &str) -> ApiStatus {
        self.exchange(JobType::RemoveResourceFromDirectory, resource_id).await
    }

    async fn add_new_directory(
        &self,
        parent_resource_id: &str,
        directory_name: &str,
    ) -> (ApiStatus, Option<ResourceEntry>) {
        let status = self.exchange(JobType::AddNewDirectory, directory_name).await;
        let entry = status.is_success().then(|| ResourceEntry {
            parent_resource_id: Some(parent_resource_id.to_string()),
            is_directory: true,
            ..ResourceEntry::new(directory_name, directory_name)
        });
        (status, entry)
    }

    async fn download_file(
        &self,
        virtual_path: &Path,
        local_cache_path: &Path,
        _download_url: &str,
        _content: Option<GetContentCallback>,
        progress: ProgressCallback,
    ) -> (ApiStatus, PathBuf) {
        let status = self
            .exchange(JobType::DownloadFile, virtual_path.display().to_string())
            .await;
        if status.is_success() {
            progress(1, 1);
        }
        (status, local_cache_path.to_path_buf())
    }
}

#[async_trait]
impl Uploader for MockRemoteService {
    async fn upload_new_file(
        &self,
        parent_resource_id: &str,
        drive_file_path: &Path,
        local_file_path: &Path,
        title: &str,
        _content_type: &str,
        _progress: ProgressCallback,
    ) -> UploadOutcome {
        let status = self
            .exchange(JobType::UploadNewFile, drive_file_path.display().to_string())
            .await;
        UploadOutcome {
            status,
            drive_path: drive_file_path.to_path_buf(),
            local_path: local_file_path.to_path_buf(),
            entry: status.is_success().then(|| ResourceEntry {
                parent_resource_id: Some(parent_resource_id.to_string()),
                ..ResourceEntry::new(title, title)
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
        _progress: ProgressCallback,
    ) -> UploadOutcome {
        let status = self
            .exchange(JobType::UploadExistingFile, drive_file_path.display().to_string())
            .await;
        UploadOutcome {
            status,
            drive_path: drive_file_path.to_path_buf(),
            local_path: local_file_path.to_path_buf(),
            entry: status.is_success().then(|| ResourceEntry {
                etag: etag.to_string(),
                ..ResourceEntry::new(resource_id, resource_id)
            }),
        }
    }
}
