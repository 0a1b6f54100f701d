//! Collaborator traits for the remote service client and the uploader.
//!
//! Every method performs exactly one remote call and reports its status
//! alongside the parsed payload. Implementations own their transport state;
//! the scheduler only guarantees it will not issue more concurrent calls than
//! its queue caps allow.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::status::ApiStatus;
use super::types::{AboutResource, AccountMetadata, AppList, ResourceEntry, ResourceList, UploadOutcome};

/// Reports `(completed_bytes, total_bytes)` while a transfer is running.
pub type ProgressCallback = Arc<dyn Fn(i64, i64) + Send + Sync>;

/// Receives downloaded content chunks as they arrive.
pub type GetContentCallback = Arc<dyn Fn(ApiStatus, &[u8]) + Send + Sync>;

/// Remote metadata and download API.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn get_about_resource(&self) -> (ApiStatus, Option<AboutResource>);

    async fn get_account_metadata(&self) -> (ApiStatus, Option<AccountMetadata>);

    async fn get_app_list(&self) -> (ApiStatus, Option<AppList>);

    async fn get_all_resource_list(&self) -> (ApiStatus, Option<ResourceList>);

    async fn get_resource_list_in_directory(&self, directory_resource_id: &str) -> (ApiStatus, Option<ResourceList>);

    async fn search(&self, query: &str) -> (ApiStatus, Option<ResourceList>);

    async fn get_change_list(&self, start_changestamp: i64) -> (ApiStatus, Option<ResourceList>);

    async fn continue_get_resource_list(&self, feed_url: &str) -> (ApiStatus, Option<ResourceList>);

    async fn get_resource_entry(&self, resource_id: &str) -> (ApiStatus, Option<ResourceEntry>);

    /// Delete a resource unconditionally, whatever its current version.
    async fn delete_resource(&self, resource_id: &str) -> ApiStatus;

    async fn copy_hosted_document(&self, resource_id: &str, new_name: &str) -> (ApiStatus, Option<ResourceEntry>);

    async fn rename_resource(&self, resource_id: &str, new_name: &str) -> ApiStatus;

    async fn add_resource_to_directory(&self, parent_resource_id: &str, resource_id: &str) -> ApiStatus;

    async fn remove_resource_from_directory(&self, parent_resource_id: &str, resource_id: &str) -> ApiStatus;

    async fn add_new_directory(&self, parent_resource_id: &str, directory_name: &str)
    -> (ApiStatus, Option<ResourceEntry>);

    /// Download `download_url` into a temporary file and return its path.
    async fn download_file(
        &self,
        virtual_path: &Path,
        local_cache_path: &Path,
        download_url: &str,
        content: Option<GetContentCallback>,
        progress: ProgressCallback,
    ) -> (ApiStatus, PathBuf);
}

/// Resumable uploader for large payloads.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload_new_file(
        &self,
        parent_resource_id: &str,
        drive_file_path: &Path,
        local_file_path: &Path,
        title: &str,
        content_type: &str,
        progress: ProgressCallback,
    ) -> UploadOutcome;

    async fn upload_existing_file(
        &self,
        resource_id: &str,
        drive_file_path: &Path,
        local_file_path: &Path,
        content_type: &str,
        etag: &str,
        progress: ProgressCallback,
    ) -> UploadOutcome;
}
