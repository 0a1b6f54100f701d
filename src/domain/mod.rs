//! Domain types for drivesched
//!
//! This module contains the job model:
//! - PriorityClass: caller-chosen urgency
//! - Job / JobInfo: one scheduled operation and its bookkeeping
//! - Operation: the remote call parameters plus the typed completion callback

pub mod job;
pub mod operation;
pub mod priority;

pub use job::{Job, JobId, JobInfo, JobState, JobType, QueueType};
pub use operation::{
    AboutResourceCallback, AccountMetadataCallback, AppListCallback, DownloadActionCallback, EntryActionCallback,
    Operation, ResourceEntryCallback, ResourceListCallback, UploadCompletionCallback,
};
pub use priority::PriorityClass;
