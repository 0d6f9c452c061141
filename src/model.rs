//! Session data: document handle, metadata, messages and the transcript.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier the service issued for an ingested document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display-only facts about the current document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// File name as selected by the user.
    pub file_name: String,
    /// Page count reported by the service.
    pub page_count: u32,
    /// Number of retrieval chunks the service built, when it says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<u32>,
}

impl DocumentMetadata {
    /// Label shown next to the upload control, e.g. `PDF: contract.pdf`.
    pub fn label(&self) -> String {
        format!("PDF: {}", self.file_name)
    }

    /// Status line under the label, e.g. `Pages: 12 Uploaded successfully`.
    pub fn page_info(&self) -> String {
        format!("Pages: {} Uploaded successfully", self.page_count)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One transcript entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered, append-only log of the conversation.
///
/// Doubles as the context sent with each chat turn, so insertion order is
/// significant. Only the session appends; callers get read access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// Point-in-time view of a session, for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub document_handle: Option<DocumentHandle>,
    pub metadata: Option<DocumentMetadata>,
    pub transcript: Transcript,
    pub upload_in_progress: bool,
    pub answer_pending: bool,
}

impl SessionState {
    /// Whether a question may be submitted right now. A view disables its
    /// input when this is false.
    pub fn can_ask(&self) -> bool {
        self.document_handle.is_some() && !self.upload_in_progress && !self.answer_pending
    }

    /// Whether a new file may be submitted right now.
    pub fn can_upload(&self) -> bool {
        !self.upload_in_progress && !self.answer_pending
    }
}
