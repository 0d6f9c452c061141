//! # edgequake-pdfchat
//!
//! Upload a PDF to a question-answering service and hold a multi-turn
//! conversation about it.
//!
//! The service does the heavy lifting (text extraction, chunking, retrieval,
//! answer generation). This crate is the client half: it validates and
//! uploads the document, keeps the transcript, sends each question with the
//! conversation so far, and keeps the session consistent whatever the network
//! does.
//!
//! ## Session Lifecycle
//!
//! ```text
//! PdfFile
//!  │
//!  ├─ 1. Validate  media type must be application/pdf, size ≤ 10 MiB
//!  ├─ 2. Upload    POST /api/upload (multipart)  → doc_id + page count
//!  ├─ 3. Ask       POST /api/chat { doc_id, question, history }
//!  │               answer appended, or a fixed fallback on failure
//!  └─ 4. Repeat 3  one question in flight at a time
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfchat::{ClientConfig, PdfFile, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://localhost:8000")
//!         .build()?;
//!     let session = Session::new(config)?;
//!
//!     let meta = session.submit_file(PdfFile::from_path("contract.pdf").await?).await?;
//!     println!("{}  {}", meta.label(), meta.page_info());
//!
//!     let outcome = session.ask("What is the payment term?").await?;
//!     if let Some(answer) = outcome.answer() {
//!         println!("{}", answer.content());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfchat` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfchat = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod chat;
pub mod config;
pub mod error;
pub mod model;
pub mod observer;
pub mod service;
pub mod session;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use chat::AskOutcome;
pub use config::{
    ClientConfig, ClientConfigBuilder, DEFAULT_API_URL, FALLBACK_ANSWER, MAX_UPLOAD_BYTES,
    PDF_MEDIA_TYPE,
};
pub use error::{
    AskError, PdfChatError, ServiceError, UploadError, ABANDONED_TURN, GENERIC_UPLOAD_FAILURE,
};
pub use model::{DocumentHandle, DocumentMetadata, Message, Role, SessionState, Transcript};
pub use observer::{NoopObserver, SessionObserver, SharedObserver};
pub use service::wire::{ChatRequest, ChatResponse, Citation, UploadResponse};
pub use service::{HttpBackend, QaBackend};
pub use session::Session;
pub use upload::PdfFile;
