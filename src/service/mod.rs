//! The remote question-answering service, as seen by the session.
//!
//! [`QaBackend`] is the seam between the controllers and the network:
//! [`http::HttpBackend`] talks to a real service, tests plug in a scripted
//! fake. Every method is one request; retries are deliberately absent.
//!
//! ```text
//! Session::submit_file ──▶ QaBackend::upload ──▶ POST /api/upload  (multipart)
//! Session::ask         ──▶ QaBackend::chat   ──▶ POST /api/chat    (JSON)
//! Session::health      ──▶ QaBackend::health ──▶ GET  /api/health
//! ```

pub mod http;
pub mod wire;

use crate::error::ServiceError;
use crate::upload::PdfFile;
use async_trait::async_trait;
use wire::{ChatRequest, ChatResponse, UploadResponse};

pub use http::HttpBackend;

/// One remote question-answering service.
#[async_trait]
pub trait QaBackend: Send + Sync {
    /// Ingest a PDF and return its identifier and page count.
    async fn upload(&self, file: &PdfFile) -> Result<UploadResponse, ServiceError>;

    /// Answer one question about a previously uploaded document.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ServiceError>;

    /// Liveness probe. Backends without one report healthy.
    async fn health(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
