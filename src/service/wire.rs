//! JSON bodies exchanged with the service.

use crate::model::Message;
use serde::{Deserialize, Serialize};

/// Success body of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub doc_id: String,
    pub page_count: u32,
    /// Retrieval chunks built from the document. Older services omit it.
    #[serde(default)]
    pub chunks: Option<u32>,
}

/// Body of `POST /api/chat`.
///
/// `history` is the transcript as it stood *before* `question` was appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub doc_id: String,
    pub question: String,
    pub history: Vec<Message>,
}

/// Success body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// A retrieved chunk the answer was grounded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-indexed source page, when the service tracked it.
    #[serde(default)]
    pub page: Option<u32>,
    pub id: String,
}

/// Error body, `{"detail": "..."}`. Validation errors carry a list instead of
/// a string; only string details are shown to the user.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Extract a displayable `detail` from a raw error body, if any.
    pub(crate) fn detail_from(raw: &str) -> Option<String> {
        let body: ErrorBody = serde_json::from_str(raw).ok()?;
        match body.detail? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
}
