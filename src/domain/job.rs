//! Job records
//!
//! A [`Job`] is one scheduled remote operation: its bookkeeping ([`JobInfo`])
//! plus the [`Operation`] that carries the call parameters and the caller's
//! completion callback.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::operation::Operation;
use super::priority::PriorityClass;

/// Scheduler-lifetime unique job identifier, increasing in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// The two independent queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueType {
    /// Metadata queries and directory mutations
    Metadata,
    /// Uploads and downloads
    File,
}

impl QueueType {
    pub const ALL: [QueueType; 2] = [Self::Metadata, Self::File];

    pub fn index(&self) -> usize {
        match self {
            Self::Metadata => 0,
            Self::File => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::File => "file",
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of remote operation, one per submission entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    GetAboutResource,
    GetAccountMetadata,
    GetAppList,
    GetAllResourceList,
    GetResourceListInDirectory,
    Search,
    GetChangeList,
    ContinueGetResourceList,
    GetResourceEntry,
    DeleteResource,
    CopyHostedDocument,
    RenameResource,
    AddResourceToDirectory,
    RemoveResourceFromDirectory,
    AddNewDirectory,
    DownloadFile,
    UploadNewFile,
    UploadExistingFile,
}

impl JobType {
    /// The queue every job of this type runs on.
    ///
    /// No wildcard arm: a new job type must be placed explicitly.
    pub fn queue_type(&self) -> QueueType {
        match self {
            Self::GetAboutResource
            | Self::GetAccountMetadata
            | Self::GetAppList
            | Self::GetAllResourceList
            | Self::GetResourceListInDirectory
            | Self::Search
            | Self::GetChangeList
            | Self::ContinueGetResourceList
            | Self::GetResourceEntry
            | Self::DeleteResource
            | Self::CopyHostedDocument
            | Self::RenameResource
            | Self::AddResourceToDirectory
            | Self::RemoveResourceFromDirectory
            | Self::AddNewDirectory => QueueType::Metadata,

            Self::DownloadFile | Self::UploadNewFile | Self::UploadExistingFile => QueueType::File,
        }
    }
}

/// Position of a job in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Waiting in its queue
    Queued,
    /// Handed to the remote service
    Running,
    /// Throttled and waiting in its queue again
    Retrying,
}

impl JobState {
    /// Waiting jobs are the ones shutdown discards.
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Queued | Self::Retrying)
    }
}

/// Bookkeeping for a job, safe to hand out as a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: JobId,
    pub job_type: JobType,
    pub priority: PriorityClass,
    pub state: JobState,
    /// Bytes transferred so far (transfers only)
    pub completed_bytes: i64,
    /// Total bytes to transfer, 0 if unknown
    pub total_bytes: i64,
}

impl JobInfo {
    pub fn new(id: JobId, job_type: JobType, priority: PriorityClass) -> Self {
        Self {
            id,
            job_type,
            priority,
            state: JobState::Queued,
            completed_bytes: 0,
            total_bytes: 0,
        }
    }

    pub fn queue_type(&self) -> QueueType {
        self.job_type.queue_type()
    }
}

/// A scheduled operation together with its bookkeeping.
#[derive(Debug)]
pub struct Job {
    pub info: JobInfo,
    pub operation: Operation,
}

impl Job {
    pub fn new(id: JobId, priority: PriorityClass, operation: Operation) -> Self {
        Self {
            info: JobInfo::new(id, operation.job_type(), priority),
            operation,
        }
    }

    pub fn id(&self) -> JobId {
        self.info.id
    }

    pub fn priority(&self) -> PriorityClass {
        self.info.priority
    }

    pub fn queue_type(&self) -> QueueType {
        self.info.queue_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_job_types() {
        let metadata = [
            JobType::GetAboutResource,
            JobType::GetAccountMetadata,
            JobType::GetAppList,
            JobType::GetAllResourceList,
            JobType::GetResourceListInDirectory,
            JobType::Search,
            JobType::GetChangeList,
            JobType::ContinueGetResourceList,
            JobType::GetResourceEntry,
            JobType::DeleteResource,
            JobType::CopyHostedDocument,
            JobType::RenameResource,
            JobType::AddResourceToDirectory,
            JobType::RemoveResourceFromDirectory,
            JobType::AddNewDirectory,
        ];
        for job_type in metadata {
            assert_eq!(job_type.queue_type(), QueueType::Metadata, "{:?}", job_type);
        }
    }

    #[test]
    fn test_file_job_types() {
        for job_type in [JobType::DownloadFile, JobType::UploadNewFile, JobType::UploadExistingFile] {
            assert_eq!(job_type.queue_type(), QueueType::File, "{:?}", job_type);
        }
    }

    #[test]
    fn test_queue_indexes_are_distinct() {
        assert_eq!(QueueType::Metadata.index(), 0);
        assert_eq!(QueueType::File.index(), 1);
    }

    #[test]
    fn test_new_job_info_is_queued() {
        let info = JobInfo::new(JobId(7), JobType::Search, PriorityClass::Background);
        assert_eq!(info.state, JobState::Queued);
        assert!(info.state.is_waiting());
        assert_eq!(info.queue_type(), QueueType::Metadata);
        assert_eq!(info.id.to_string(), "job-7");
    }

    #[test]
    fn test_running_is_not_waiting() {
        assert!(!JobState::Running.is_waiting());
        assert!(JobState::Retrying.is_waiting());
    }
}
