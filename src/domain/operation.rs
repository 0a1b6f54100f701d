//! Operations and their completion callbacks
//!
//! Each [`Operation`] variant carries exactly the parameters its remote call
//! needs and one callback typed for that call's result.

use std::fmt;
use std::path::PathBuf;

use super::job::JobType;
use crate::api::{
    AboutResource, AccountMetadata, ApiStatus, AppList, GetContentCallback, ResourceEntry, ResourceList, UploadOutcome,
};

pub type AboutResourceCallback = Box<dyn FnOnce(ApiStatus, Option<AboutResource>) + Send>;
pub type AccountMetadataCallback = Box<dyn FnOnce(ApiStatus, Option<AccountMetadata>) + Send>;
pub type AppListCallback = Box<dyn FnOnce(ApiStatus, Option<AppList>) + Send>;
pub type ResourceListCallback = Box<dyn FnOnce(ApiStatus, Option<ResourceList>) + Send>;
pub type ResourceEntryCallback = Box<dyn FnOnce(ApiStatus, Option<ResourceEntry>) + Send>;
pub type EntryActionCallback = Box<dyn FnOnce(ApiStatus) + Send>;
/// Receives the status and the temporary file the content was written to.
pub type DownloadActionCallback = Box<dyn FnOnce(ApiStatus, PathBuf) + Send>;
pub type UploadCompletionCallback = Box<dyn FnOnce(UploadOutcome) + Send>;

/// A remote operation waiting to be issued.
pub enum Operation {
    GetAboutResource {
        callback: AboutResourceCallback,
    },
    GetAccountMetadata {
        callback: AccountMetadataCallback,
    },
    GetAppList {
        callback: AppListCallback,
    },
    GetAllResourceList {
        callback: ResourceListCallback,
    },
    GetResourceListInDirectory {
        directory_resource_id: String,
        callback: ResourceListCallback,
    },
    Search {
        query: String,
        callback: ResourceListCallback,
    },
    GetChangeList {
        start_changestamp: i64,
        callback: ResourceListCallback,
    },
    ContinueGetResourceList {
        feed_url: String,
        callback: ResourceListCallback,
    },
    GetResourceEntry {
        resource_id: String,
        callback: ResourceEntryCallback,
    },
    DeleteResource {
        resource_id: String,
        callback: EntryActionCallback,
    },
    CopyHostedDocument {
        resource_id: String,
        new_name: String,
        callback: ResourceEntryCallback,
    },
    RenameResource {
        resource_id: String,
        new_name: String,
        callback: EntryActionCallback,
    },
    AddResourceToDirectory {
        parent_resource_id: String,
        resource_id: String,
        callback: EntryActionCallback,
    },
    RemoveResourceFromDirectory {
        parent_resource_id: String,
        resource_id: String,
        callback: EntryActionCallback,
    },
    AddNewDirectory {
        parent_resource_id: String,
        directory_name: String,
        callback: ResourceEntryCallback,
    },
    DownloadFile {
        virtual_path: PathBuf,
        local_cache_path: PathBuf,
        download_url: String,
        content: Option<GetContentCallback>,
        callback: DownloadActionCallback,
    },
    UploadNewFile {
        parent_resource_id: String,
        drive_file_path: PathBuf,
        local_file_path: PathBuf,
        title: String,
        content_type: String,
        callback: UploadCompletionCallback,
    },
    UploadExistingFile {
        resource_id: String,
        drive_file_path: PathBuf,
        local_file_path: PathBuf,
        content_type: String,
        etag: String,
        callback: UploadCompletionCallback,
    },
}

impl Operation {
    pub fn job_type(&self) -> JobType {
        match self {
            Self::GetAboutResource { .. } => JobType::GetAboutResource,
            Self::GetAccountMetadata { .. } => JobType::GetAccountMetadata,
            Self::GetAppList { .. } => JobType::GetAppList,
            Self::GetAllResourceList { .. } => JobType::GetAllResourceList,
            Self::GetResourceListInDirectory { .. } => JobType::GetResourceListInDirectory,
            Self::Search { .. } => JobType::Search,
            Self::GetChangeList { .. } => JobType::GetChangeList,
            Self::ContinueGetResourceList { .. } => JobType::ContinueGetResourceList,
            Self::GetResourceEntry { .. } => JobType::GetResourceEntry,
            Self::DeleteResource { .. } => JobType::DeleteResource,
            Self::CopyHostedDocument { .. } => JobType::CopyHostedDocument,
            Self::RenameResource { .. } => JobType::RenameResource,
            Self::AddResourceToDirectory { .. } => JobType::AddResourceToDirectory,
            Self::RemoveResourceFromDirectory { .. } => JobType::RemoveResourceFromDirectory,
            Self::AddNewDirectory { .. } => JobType::AddNewDirectory,
            Self::DownloadFile { .. } => JobType::DownloadFile,
            Self::UploadNewFile { .. } => JobType::UploadNewFile,
            Self::UploadExistingFile { .. } => JobType::UploadExistingFile,
        }
    }

    /// Short human-readable description of the call target, for logs.
    pub fn target(&self) -> String {
        match self {
            Self::GetAboutResource { .. }
            | Self::GetAccountMetadata { .. }
            | Self::GetAppList { .. }
            | Self::GetAllResourceList { .. } => String::new(),
            Self::GetResourceListInDirectory {
                directory_resource_id, ..
            } => directory_resource_id.clone(),
            Self::Search { query, .. } => query.clone(),
            Self::GetChangeList { start_changestamp, .. } => start_changestamp.to_string(),
            Self::ContinueGetResourceList { feed_url, .. } => feed_url.clone(),
            Self::GetResourceEntry { resource_id, .. }
            | Self::DeleteResource { resource_id, .. }
            | Self::CopyHostedDocument { resource_id, .. }
            | Self::RenameResource { resource_id, .. }
            | Self::AddResourceToDirectory { resource_id, .. }
            | Self::RemoveResourceFromDirectory { resource_id, .. } => resource_id.clone(),
            Self::AddNewDirectory { directory_name, .. } => directory_name.clone(),
            Self::DownloadFile { virtual_path, .. } => virtual_path.display().to_string(),
            Self::UploadNewFile { drive_file_path, .. } | Self::UploadExistingFile { drive_file_path, .. } => {
                drive_file_path.display().to_string()
            }
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("job_type", &self.job_type())
            .field("target", &self.target())
            .finish_non_exhaustive()
    }
}
