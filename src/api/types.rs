//! Parsed payloads returned by the remote service.
//!
//! These are deliberately thin: parsing lives in the service client, the
//! scheduler only moves them from the client to the caller.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::status::ApiStatus;

/// Quota and root information for the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutResource {
    pub largest_change_id: i64,
    pub quota_bytes_total: i64,
    pub quota_bytes_used: i64,
    pub root_folder_id: String,
}

/// Legacy account metadata feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetadata {
    pub largest_changestamp: i64,
    pub quota_bytes_total: i64,
    pub quota_bytes_used: i64,
    pub installed_apps: Vec<String>,
}

/// One installed application able to open remote documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppResource {
    pub application_id: String,
    pub name: String,
    pub primary_mimetypes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppList {
    pub items: Vec<AppResource>,
}

/// A single file or directory on the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub resource_id: String,
    pub title: String,
    pub etag: String,
    pub parent_resource_id: Option<String>,
    pub is_directory: bool,
    pub file_size: i64,
    pub content_url: Option<String>,
}

impl ResourceEntry {
    pub fn new(resource_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A page of entries; `next_link` continues the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceList {
    pub entries: Vec<ResourceEntry>,
    pub largest_changestamp: i64,
    pub next_link: Option<String>,
}

/// Everything an upload reports back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub status: ApiStatus,
    pub drive_path: PathBuf,
    pub local_path: PathBuf,
    pub entry: Option<ResourceEntry>,
}
