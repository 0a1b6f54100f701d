//! Public entry points
//!
//! [`Scheduler::spawn`] starts the actor and the connection observer and
//! returns a [`SchedulerHandle`]. Every submission method is fire-and-forget:
//! it returns immediately and the result arrives through the callback, which
//! runs on the scheduler task once the job has finished. Callbacks should be
//! short; hand heavy work off to another task.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::config::SchedulerConfig;
use super::core::SchedulerCore;
use super::dispatch::Remote;
use super::gate::NetworkGate;
use super::messages::{SchedulerCommand, SchedulerStats};
use super::observer::ConnectionObserver;
use crate::api::{
    AboutResource, AccountMetadata, ApiStatus, AppList, GetContentCallback, RemoteService, ResourceEntry,
    ResourceList, UploadOutcome, Uploader,
};
use crate::domain::{JobInfo, Operation, PriorityClass};
use crate::error::{Result, SchedulerError};
use crate::network::{NetworkState, Preferences};

/// External systems the scheduler depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub service: Arc<dyn RemoteService>,
    pub uploader: Arc<dyn Uploader>,
    pub network: Arc<dyn NetworkState>,
    pub preferences: Arc<dyn Preferences>,
}

/// Constructor for scheduler instances, one per account session.
pub struct Scheduler;

impl Scheduler {
    /// Validate `config`, start the scheduler task and its connection
    /// observer, and return a handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: SchedulerConfig, collaborators: Collaborators) -> Result<SchedulerHandle> {
        config.validate()?;

        let Collaborators {
            service,
            uploader,
            network,
            preferences,
        } = collaborators;

        let (tx, rx) = mpsc::unbounded_channel();
        let observer = ConnectionObserver::spawn(network.subscribe(), tx.downgrade());
        let core = SchedulerCore::new(
            &config,
            Remote { service, uploader },
            NetworkGate::new(network, preferences),
            tx.downgrade(),
        )
        .with_observer(observer);

        tracing::debug!(?config, "Scheduler::spawn");
        tokio::spawn(core.run(rx));

        Ok(SchedulerHandle { tx })
    }
}

/// Cloneable handle to a running scheduler. When the last handle is dropped
/// the scheduler stops as if [`SchedulerHandle::shutdown`] had been called.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Queue `operation` at `priority`.
    pub fn submit(&self, priority: PriorityClass, operation: Operation) {
        let job_type = operation.job_type();
        if self.tx.send(SchedulerCommand::Submit { priority, operation }).is_err() {
            tracing::warn!(?job_type, "SchedulerHandle::submit: scheduler is shut down, job dropped");
        }
    }

    pub fn get_about_resource(&self, callback: impl FnOnce(ApiStatus, Option<AboutResource>) + Send + 'static) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::GetAboutResource {
                callback: Box::new(callback),
            },
        );
    }

    pub fn get_account_metadata(&self, callback: impl FnOnce(ApiStatus, Option<AccountMetadata>) + Send + 'static) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::GetAccountMetadata {
                callback: Box::new(callback),
            },
        );
    }

    pub fn get_app_list(&self, callback: impl FnOnce(ApiStatus, Option<AppList>) + Send + 'static) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::GetAppList {
                callback: Box::new(callback),
            },
        );
    }

    pub fn get_all_resource_list(&self, callback: impl FnOnce(ApiStatus, Option<ResourceList>) + Send + 'static) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::GetAllResourceList {
                callback: Box::new(callback),
            },
        );
    }

    pub fn get_resource_list_in_directory(
        &self,
        directory_resource_id: impl Into<String>,
        callback: impl FnOnce(ApiStatus, Option<ResourceList>) + Send + 'static,
    ) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::GetResourceListInDirectory {
                directory_resource_id: directory_resource_id.into(),
                callback: Box::new(callback),
            },
        );
    }

    pub fn search(
        &self,
        query: impl Into<String>,
        callback: impl FnOnce(ApiStatus, Option<ResourceList>) + Send + 'static,
    ) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::Search {
                query: query.into(),
                callback: Box::new(callback),
            },
        );
    }

    pub fn get_change_list(
        &self,
        start_changestamp: i64,
        callback: impl FnOnce(ApiStatus, Option<ResourceList>) + Send + 'static,
    ) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::GetChangeList {
                start_changestamp,
                callback: Box::new(callback),
            },
        );
    }

    /// Fetch the next page of a paged listing.
    pub fn continue_get_resource_list(
        &self,
        feed_url: impl Into<String>,
        callback: impl FnOnce(ApiStatus, Option<ResourceList>) + Send + 'static,
    ) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::ContinueGetResourceList {
                feed_url: feed_url.into(),
                callback: Box::new(callback),
            },
        );
    }

    pub fn get_resource_entry(
        &self,
        resource_id: impl Into<String>,
        priority: PriorityClass,
        callback: impl FnOnce(ApiStatus, Option<ResourceEntry>) + Send + 'static,
    ) {
        self.submit(
            priority,
            Operation::GetResourceEntry {
                resource_id: resource_id.into(),
                callback: Box::new(callback),
            },
        );
    }

    pub fn delete_resource(&self, resource_id: impl Into<String>, callback: impl FnOnce(ApiStatus) + Send + 'static) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::DeleteResource {
                resource_id: resource_id.into(),
                callback: Box::new(callback),
            },
        );
    }

    pub fn copy_hosted_document(
        &self,
        resource_id: impl Into<String>,
        new_name: impl Into<String>,
        callback: impl FnOnce(ApiStatus, Option<ResourceEntry>) + Send + 'static,
    ) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::CopyHostedDocument {
                resource_id: resource_id.into(),
                new_name: new_name.into(),
                callback: Box::new(callback),
            },
        );
    }

    pub fn rename_resource(
        &self,
        resource_id: impl Into<String>,
        new_name: impl Into<String>,
        callback: impl FnOnce(ApiStatus) + Send + 'static,
    ) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::RenameResource {
                resource_id: resource_id.into(),
                new_name: new_name.into(),
                callback: Box::new(callback),
            },
        );
    }

    pub fn add_resource_to_directory(
        &self,
        parent_resource_id: impl Into<String>,
        resource_id: impl Into<String>,
        callback: impl FnOnce(ApiStatus) + Send + 'static,
    ) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::AddResourceToDirectory {
                parent_resource_id: parent_resource_id.into(),
                resource_id: resource_id.into(),
                callback: Box::new(callback),
            },
        );
    }

    pub fn remove_resource_from_directory(
        &self,
        parent_resource_id: impl Into<String>,
        resource_id: impl Into<String>,
        callback: impl FnOnce(ApiStatus) + Send + 'static,
    ) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::RemoveResourceFromDirectory {
                parent_resource_id: parent_resource_id.into(),
                resource_id: resource_id.into(),
                callback: Box::new(callback),
            },
        );
    }

    pub fn add_new_directory(
        &self,
        parent_resource_id: impl Into<String>,
        directory_name: impl Into<String>,
        callback: impl FnOnce(ApiStatus, Option<ResourceEntry>) + Send + 'static,
    ) {
        self.submit(
            PriorityClass::UserInitiated,
            Operation::AddNewDirectory {
                parent_resource_id: parent_resource_id.into(),
                directory_name: directory_name.into(),
                callback: Box::new(callback),
            },
        );
    }

    /// Download `download_url` into a temporary file next to
    /// `local_cache_path`. `content`, if given, also receives the bytes as
    /// they arrive.
    pub fn download_file(
        &self,
        virtual_path: impl Into<PathBuf>,
        local_cache_path: impl Into<PathBuf>,
        download_url: impl Into<String>,
        priority: PriorityClass,
        content: Option<GetContentCallback>,
        callback: impl FnOnce(ApiStatus, PathBuf) + Send + 'static,
    ) {
        self.submit(
            priority,
            Operation::DownloadFile {
                virtual_path: virtual_path.into(),
                local_cache_path: local_cache_path.into(),
                download_url: download_url.into(),
                content,
                callback: Box::new(callback),
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn upload_new_file(
        &self,
        parent_resource_id: impl Into<String>,
        drive_file_path: impl Into<PathBuf>,
        local_file_path: impl Into<PathBuf>,
        title: impl Into<String>,
        content_type: impl Into<String>,
        priority: PriorityClass,
        callback: impl FnOnce(UploadOutcome) + Send + 'static,
    ) {
        self.submit(
            priority,
            Operation::UploadNewFile {
                parent_resource_id: parent_resource_id.into(),
                drive_file_path: drive_file_path.into(),
                local_file_path: local_file_path.into(),
                title: title.into(),
                content_type: content_type.into(),
                callback: Box::new(callback),
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn upload_existing_file(
        &self,
        resource_id: impl Into<String>,
        drive_file_path: impl Into<PathBuf>,
        local_file_path: impl Into<PathBuf>,
        content_type: impl Into<String>,
        etag: impl Into<String>,
        priority: PriorityClass,
        callback: impl FnOnce(UploadOutcome) + Send + 'static,
    ) {
        self.submit(
            priority,
            Operation::UploadExistingFile {
                resource_id: resource_id.into(),
                drive_file_path: drive_file_path.into(),
                local_file_path: local_file_path.into(),
                content_type: content_type.into(),
                etag: etag.into(),
                callback: Box::new(callback),
            },
        );
    }

    /// Snapshot of running jobs (by id), then waiting jobs per queue in
    /// dispatch order.
    pub async fn jobs(&self) -> Result<Vec<JobInfo>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SchedulerCommand::ListJobs { reply })
            .map_err(|_| SchedulerError::ChannelClosed)?;
        rx.await.map_err(|_| SchedulerError::ReplyDropped("jobs"))
    }

    pub async fn stats(&self) -> Result<SchedulerStats> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SchedulerCommand::GetStats { reply })
            .map_err(|_| SchedulerError::ChannelClosed)?;
        rx.await.map_err(|_| SchedulerError::ReplyDropped("stats"))
    }

    /// Stop the scheduler. Waiting jobs are dropped without their callbacks
    /// running; completions of jobs still in flight are discarded. Calling
    /// this more than once is harmless.
    pub fn shutdown(&self) {
        if self.tx.send(SchedulerCommand::Shutdown).is_err() {
            tracing::debug!("SchedulerHandle::shutdown: already stopped");
        }
    }

    /// The scheduler task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
