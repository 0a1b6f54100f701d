//! Status codes reported by the remote service and their classification.
//!
//! The scheduler never rewrites an [`ApiStatus`]: callers receive exactly the
//! value the service produced. [`FileError`] is the coarse classification used
//! to decide whether a response is worth retrying.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStatus {
    Success,
    Created,
    NoContent,
    Found,
    NotModified,
    ResumeIncomplete,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    LengthRequired,
    PreconditionFailed,
    InternalServerError,
    ServiceUnavailable,
    ParseError,
    FileError,
    Cancelled,
    OtherError,
    NoConnection,
    NotReady,
    NoSpace,
}

impl ApiStatus {
    /// HTTP status for wire-level codes, negative values for client-side failures.
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 200,
            Self::Created => 201,
            Self::NoContent => 204,
            Self::Found => 302,
            Self::NotModified => 304,
            Self::ResumeIncomplete => 308,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::LengthRequired => 411,
            Self::PreconditionFailed => 412,
            Self::InternalServerError => 500,
            Self::ServiceUnavailable => 503,
            Self::ParseError => -100,
            Self::FileError => -101,
            Self::Cancelled => -102,
            Self::OtherError => -103,
            Self::NoConnection => -104,
            Self::NotReady => -105,
            Self::NoSpace => -106,
        }
    }

    /// Whether the call succeeded and a payload (if any) is present.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::Created | Self::NoContent)
    }

    /// Whether the remote service asked us to back off.
    pub fn is_throttled(&self) -> bool {
        self.to_file_error() == Some(FileError::Throttled)
    }

    /// Classify the status; `None` means success.
    pub fn to_file_error(&self) -> Option<FileError> {
        let error = match self {
            Self::Success | Self::Created | Self::NoContent | Self::Found | Self::NotModified => return None,
            Self::Unauthorized => FileError::AccessDenied,
            Self::Forbidden => FileError::AccessDenied,
            Self::NotFound => FileError::NotFound,
            Self::Conflict => FileError::Exists,
            Self::ServiceUnavailable => FileError::Throttled,
            Self::NoConnection => FileError::NoConnection,
            Self::NoSpace => FileError::NoSpace,
            Self::Cancelled => FileError::Abort,
            Self::ResumeIncomplete
            | Self::BadRequest
            | Self::LengthRequired
            | Self::PreconditionFailed
            | Self::InternalServerError
            | Self::ParseError
            | Self::FileError
            | Self::OtherError
            | Self::NotReady => FileError::Failed,
        };
        Some(error)
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Coarse error class derived from an [`ApiStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileError {
    Failed,
    AccessDenied,
    NotFound,
    Exists,
    NoSpace,
    NoConnection,
    Abort,
    /// The service is rate limiting; the only retryable class.
    Throttled,
}
