//! Observer trait for session lifecycle events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::config::ClientConfigBuilder::observer`] to learn when an upload or
//! a chat turn starts and finishes. A front-end uses these hooks to relabel
//! the upload control ("Uploading..."), show a "Thinking…" bubble, or scroll
//! the transcript. The state itself is always available through
//! [`crate::Session::state`]; the observer only says *when* it changed.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfchat::{ClientConfig, SessionObserver};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     answers: AtomicUsize,
//! }
//!
//! impl SessionObserver for CountingObserver {
//!     fn on_answer(&self, answer: &str) {
//!         let n = self.answers.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("answer #{n}: {} chars", answer.len());
//!     }
//! }
//!
//! let config = ClientConfig::builder()
//!     .observer(Arc::new(CountingObserver { answers: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::model::DocumentMetadata;
use std::sync::Arc;

/// Called by [`crate::Session`] as uploads and chat turns progress.
///
/// Methods are invoked without any session lock held, so an implementation
/// may call back into [`crate::Session::state`]. All methods default to
/// no-ops.
pub trait SessionObserver: Send + Sync {
    /// Validation passed and the upload request is about to be sent.
    fn on_upload_start(&self, file_name: &str, size: u64) {
        let _ = (file_name, size);
    }

    /// The service accepted the document; `metadata` is now current.
    fn on_upload_complete(&self, metadata: &DocumentMetadata) {
        let _ = metadata;
    }

    /// The upload was rejected locally or failed remotely.
    fn on_upload_failed(&self, message: &str) {
        let _ = message;
    }

    /// The user message was appended and the chat request is in flight.
    fn on_question_sent(&self, question: &str) {
        let _ = question;
    }

    /// The service answered.
    fn on_answer(&self, answer: &str) {
        let _ = answer;
    }

    /// The chat turn failed; the fallback answer was appended instead.
    fn on_answer_failed(&self, error: &str) {
        let _ = error;
    }
}

/// Observer that ignores every event. The default.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type SharedObserver = Arc<dyn SessionObserver>;
