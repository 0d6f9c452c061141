//! Error types for the edgequake-pdfchat library.
//!
//! Four error types reflect four distinct failure modes:
//!
//! * [`PdfChatError`]: **Fatal setup.** The session cannot be built or a file
//!   cannot be loaded (bad base URL, missing file). Returned before any
//!   controller runs.
//!
//! * [`ServiceError`]: **One failed remote call.** Timeout, transport
//!   failure, non-success status or an undecodable body. Never escapes the
//!   controllers; it is converted into one of the two below or swallowed.
//!
//! * [`UploadError`]: **User-visible upload notice.** Local validation
//!   failures and remote upload failures, rendered verbatim by the caller.
//!
//! * [`AskError`]: **Question precondition.** No document yet, or the
//!   session is busy. A failed chat call is *not* an `AskError`; it becomes a
//!   fallback assistant message in the transcript.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown when an upload fails and the server gave no `detail`.
pub const GENERIC_UPLOAD_FAILURE: &str = "Upload failed";

/// Reported to [`crate::SessionObserver::on_answer_failed`] when a turn is
/// dropped before it resolves or its backend panics.
pub const ABANDONED_TURN: &str = "cancelled";

/// Fatal errors returned while configuring a session or loading a file.
#[derive(Debug, Error)]
pub enum PdfChatError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading the input file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// A single failed request to the question-answering service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// No response within the configured timeout.
    #[error("Request to {endpoint} timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },

    /// Connection refused, DNS failure, reset, …
    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The service answered with a non-success status.
    ///
    /// `detail` carries the `{"detail": "..."}` body field when present.
    #[error("{endpoint} returned HTTP {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status {
        endpoint: String,
        status: u16,
        detail: Option<String>,
    },

    /// The success body did not match the expected shape.
    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

impl ServiceError {
    /// Server-supplied `detail` message, if the service sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ServiceError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Outcome of a rejected or failed upload, phrased for the end user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    /// The file's declared media type is not PDF. No request was sent.
    #[error("Please select a PDF file.")]
    InvalidFileType { media_type: String },

    /// The file exceeds the upload ceiling. No request was sent.
    #[error("Max size is {} MB ({size} bytes selected).", .limit / (1024 * 1024))]
    FileTooLarge { size: u64, limit: u64 },

    /// Another upload or an answer is still in flight.
    #[error("Please wait for the current request to finish.")]
    Busy,

    /// The request was sent and failed; `message` is ready for display.
    #[error("{message}")]
    Failed { message: String },
}

impl UploadError {
    /// Convert a remote failure into the notice shown to the user: the
    /// server's `detail` verbatim when present, otherwise a generic message.
    pub fn from_service(err: &ServiceError) -> Self {
        let message = err
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| GENERIC_UPLOAD_FAILURE.to_string());
        UploadError::Failed { message }
    }

    /// `true` when the upload was rejected before touching the network.
    pub fn is_local(&self) -> bool {
        !matches!(self, UploadError::Failed { .. })
    }
}

/// Precondition failures for [`crate::Session::ask`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AskError {
    /// No document has been uploaded yet.
    #[error("Upload a PDF first.")]
    NoDocument,

    /// The previous question has not been answered yet.
    #[error("Still waiting for the previous answer.")]
    AnswerPending,

    /// A document upload is in progress.
    #[error("A document is still uploading.")]
    UploadInProgress,
}
