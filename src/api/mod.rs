//! Remote service boundary.
//!
//! The scheduler talks to the outside world only through the traits in
//! [`service`]. Status codes and payloads are passed through to callers
//! unchanged.

#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod service;
pub mod simulated;
pub mod status;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockCall, MockCalls, MockRemoteService};
pub use service::{GetContentCallback, ProgressCallback, RemoteService, Uploader};
pub use simulated::SimulatedRemote;
pub use status::{ApiStatus, FileError};
pub use types::{AboutResource, AccountMetadata, AppList, AppResource, ResourceEntry, ResourceList, UploadOutcome};
