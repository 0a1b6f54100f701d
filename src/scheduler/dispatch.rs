//! Issue one operation against the remote service.
//!
//! [`execute`] runs outside the scheduler actor, in the task spawned for the
//! job. It never touches scheduler state: it turns the remote answer into a
//! [`Completion`] that is posted back to the actor. A throttled answer hands
//! the operation back intact (callback included) so it can be requeued; any
//! other answer binds the callback to the exact status and payload the
//! service produced.

use std::fmt;
use std::sync::Arc;

use crate::api::{ApiStatus, ProgressCallback, RemoteService, Uploader};
use crate::domain::Operation;

/// Runs the caller's callback with the bound result.
pub type Delivery = Box<dyn FnOnce() + Send>;

/// Result of one remote call, as seen by the scheduler.
pub enum Completion {
    /// The service asked us to back off; the operation is returned for retry.
    Throttled(Operation),
    /// Success or terminal error, ready to hand to the caller.
    Finished { status: ApiStatus, deliver: Delivery },
}

impl Completion {
    fn finished(status: ApiStatus, deliver: impl FnOnce() + Send + 'static) -> Self {
        Self::Finished {
            status,
            deliver: Box::new(deliver),
        }
    }

    /// A terminal result whose callback was lost along with the call.
    pub(crate) fn abandoned(status: ApiStatus) -> Self {
        Self::finished(status, || {})
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Throttled(op) => f.debug_tuple("Throttled").field(op).finish(),
            Self::Finished { status, .. } => f.debug_struct("Finished").field("status", status).finish_non_exhaustive(),
        }
    }
}

/// The two remote collaborators a job can be issued to.
#[derive(Clone)]
pub struct Remote {
    pub service: Arc<dyn RemoteService>,
    pub uploader: Arc<dyn Uploader>,
}

/// Issue `operation` and wait for the service's answer.
///
/// Every operation kind has its own arm; there is deliberately no wildcard.
pub async fn execute(remote: &Remote, operation: Operation, progress: ProgressCallback) -> Completion {
    let service = &remote.service;
    let uploader = &remote.uploader;

    match operation {
        Operation::GetAboutResource { callback } => {
            let (status, about) = service.get_about_resource().await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::GetAboutResource { callback });
            }
            Completion::finished(status, move || callback(status, about))
        }

        Operation::GetAccountMetadata { callback } => {
            let (status, metadata) = service.get_account_metadata().await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::GetAccountMetadata { callback });
            }
            Completion::finished(status, move || callback(status, metadata))
        }

        Operation::GetAppList { callback } => {
            let (status, apps) = service.get_app_list().await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::GetAppList { callback });
            }
            Completion::finished(status, move || callback(status, apps))
        }

        Operation::GetAllResourceList { callback } => {
            let (status, list) = service.get_all_resource_list().await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::GetAllResourceList { callback });
            }
            Completion::finished(status, move || callback(status, list))
        }

        Operation::GetResourceListInDirectory {
            directory_resource_id,
            callback,
        } => {
            let (status, list) = service.get_resource_list_in_directory(&directory_resource_id).await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::GetResourceListInDirectory {
                    directory_resource_id,
                    callback,
                });
            }
            Completion::finished(status, move || callback(status, list))
        }

        Operation::Search { query, callback } => {
            let (status, list) = service.search(&query).await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::Search { query, callback });
            }
            Completion::finished(status, move || callback(status, list))
        }

        Operation::GetChangeList {
            start_changestamp,
            callback,
        } => {
            let (status, list) = service.get_change_list(start_changestamp).await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::GetChangeList {
                    start_changestamp,
                    callback,
                });
            }
            Completion::finished(status, move || callback(status, list))
        }

        Operation::ContinueGetResourceList { feed_url, callback } => {
            let (status, list) = service.continue_get_resource_list(&feed_url).await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::ContinueGetResourceList { feed_url, callback });
            }
            Completion::finished(status, move || callback(status, list))
        }

        Operation::GetResourceEntry { resource_id, callback } => {
            let (status, entry) = service.get_resource_entry(&resource_id).await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::GetResourceEntry { resource_id, callback });
            }
            Completion::finished(status, move || callback(status, entry))
        }

        Operation::DeleteResource { resource_id, callback } => {
            let status = service.delete_resource(&resource_id).await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::DeleteResource { resource_id, callback });
            }
            Completion::finished(status, move || callback(status))
        }

        Operation::CopyHostedDocument {
            resource_id,
            new_name,
            callback,
        } => {
            let (status, entry) = service.copy_hosted_document(&resource_id, &new_name).await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::CopyHostedDocument {
                    resource_id,
                    new_name,
                    callback,
                });
            }
            Completion::finished(status, move || callback(status, entry))
        }

        Operation::RenameResource {
            resource_id,
            new_name,
            callback,
        } => {
            let status = service.rename_resource(&resource_id, &new_name).await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::RenameResource {
                    resource_id,
                    new_name,
                    callback,
                });
            }
            Completion::finished(status, move || callback(status))
        }

        Operation::AddResourceToDirectory {
            parent_resource_id,
            resource_id,
            callback,
        } => {
            let status = service
                .add_resource_to_directory(&parent_resource_id, &resource_id)
                .await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::AddResourceToDirectory {
                    parent_resource_id,
                    resource_id,
                    callback,
                });
            }
            Completion::finished(status, move || callback(status))
        }

        Operation::RemoveResourceFromDirectory {
            parent_resource_id,
            resource_id,
            callback,
        } => {
            let status = service
                .remove_resource_from_directory(&parent_resource_id, &resource_id)
                .await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::RemoveResourceFromDirectory {
                    parent_resource_id,
                    resource_id,
                    callback,
                });
            }
            Completion::finished(status, move || callback(status))
        }

        Operation::AddNewDirectory {
            parent_resource_id,
            directory_name,
            callback,
        } => {
            let (status, entry) = service.add_new_directory(&parent_resource_id, &directory_name).await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::AddNewDirectory {
                    parent_resource_id,
                    directory_name,
                    callback,
                });
            }
            Completion::finished(status, move || callback(status, entry))
        }

        Operation::DownloadFile {
            virtual_path,
            local_cache_path,
            download_url,
            content,
            callback,
        } => {
            let (status, temp_file) = service
                .download_file(
                    &virtual_path,
                    &local_cache_path,
                    &download_url,
                    content.clone(),
                    progress,
                )
                .await;
            if status.is_throttled() {
                return Completion::Throttled(Operation::DownloadFile {
                    virtual_path,
                    local_cache_path,
                    download_url,
                    content,
                    callback,
                });
            }
            Completion::finished(status, move || callback(status, temp_file))
        }

        Operation::UploadNewFile {
            parent_resource_id,
            drive_file_path,
            local_file_path,
            title,
            content_type,
            callback,
        } => {
            let outcome = uploader
                .upload_new_file(
                    &parent_resource_id,
                    &drive_file_path,
                    &local_file_path,
                    &title,
                    &content_type,
                    progress,
                )
                .await;
            if outcome.status.is_throttled() {
                return Completion::Throttled(Operation::UploadNewFile {
                    parent_resource_id,
                    drive_file_path,
                    local_file_path,
                    title,
                    content_type,
                    callback,
                });
            }
            Completion::finished(outcome.status, move || callback(outcome))
        }

        Operation::UploadExistingFile {
            resource_id,
            drive_file_path,
            local_file_path,
            content_type,
            etag,
            callback,
        } => {
            let outcome = uploader
                .upload_existing_file(
                    &resource_id,
                    &drive_file_path,
                    &local_file_path,
                    &content_type,
                    &etag,
                    progress,
                )
                .await;
            if outcome.status.is_throttled() {
                return Completion::Throttled(Operation::UploadExistingFile {
                    resource_id,
                    drive_file_path,
                    local_file_path,
                    content_type,
                    etag,
                    callback,
                });
            }
            Completion::finished(outcome.status, move || callback(outcome))
        }
    }
}
