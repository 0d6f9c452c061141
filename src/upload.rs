//! Upload controller: validate a selected file, send it, adopt the result.
//!
//! Validation is purely local and runs before anything touches the network:
//! the *declared* media type must be PDF and the size must fit under
//! [`ClientConfig::max_upload_bytes`]. Only a file that passes both is sent.
//! The service does its own checks (extension, extractable text) and its
//! `detail` message is passed through to the user verbatim.

use crate::config::{ClientConfig, PDF_MEDIA_TYPE};
use crate::error::{PdfChatError, ServiceError, UploadError};
use crate::model::{DocumentHandle, DocumentMetadata, Transcript};
use crate::service::wire::UploadResponse;
use crate::session::{Activity, ActivityGuard, Session};
use std::path::Path;
use tracing::{debug, info, warn};

/// A file the user selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfFile {
    file_name: String,
    media_type: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for PdfFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfFile")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl PdfFile {
    /// A file with an explicitly declared media type, as a file picker
    /// hands it over.
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file. The media type is declared from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, PdfChatError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            let path = path.to_path_buf();
            match e.kind() {
                std::io::ErrorKind::NotFound => PdfChatError::FileNotFound { path },
                std::io::ErrorKind::PermissionDenied => PdfChatError::PermissionDenied { path },
                _ => PdfChatError::Io { path, source: e },
            }
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let media_type = media_type_for(path);
        debug!("Loaded '{}' as {} ({} bytes)", path.display(), media_type, bytes.len());

        Ok(Self {
            file_name,
            media_type: media_type.to_string(),
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Media type a browser would declare for `path`, judged by extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => PDF_MEDIA_TYPE,
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "doc" => "application/msword",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Check a file against the local upload rules. Never touches the network.
pub fn validate(file: &PdfFile, config: &ClientConfig) -> Result<(), UploadError> {
    // Parameters such as `; charset=binary` do not change the type.
    let essence = file
        .media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();
    if !essence.eq_ignore_ascii_case(PDF_MEDIA_TYPE) {
        return Err(UploadError::InvalidFileType {
            media_type: file.media_type.clone(),
        });
    }
    if file.size() > config.max_upload_bytes {
        return Err(UploadError::FileTooLarge {
            size: file.size(),
            limit: config.max_upload_bytes,
        });
    }
    Ok(())
}

impl Session {
    /// Validate, upload and adopt a document.
    ///
    /// On success the session's handle and metadata are replaced together
    /// and the new metadata is returned. On any failure the previous handle
    /// is left untouched and the returned [`UploadError`] is ready to show
    /// to the user.
    pub async fn submit_file(&self, file: PdfFile) -> Result<DocumentMetadata, UploadError> {
        let observer = &self.config().observer;

        if let Err(e) = validate(&file, self.config()) {
            warn!("Rejected '{}' before upload: {:?}", file.file_name(), e);
            observer.on_upload_failed(&e.to_string());
            return Err(e);
        }

        let Some(guard) = self.begin(Activity::Uploading) else {
            observer.on_upload_failed(&UploadError::Busy.to_string());
            return Err(UploadError::Busy);
        };

        observer.on_upload_start(file.file_name(), file.size());
        info!("Uploading '{}' ({} bytes)", file.file_name(), file.size());

        let result = self
            .backend()
            .upload(&file)
            .await
            .and_then(|r| check_doc_id(r, self.config()));

        match result {
            Ok(response) => {
                let metadata = DocumentMetadata {
                    file_name: file.file_name().to_string(),
                    page_count: response.page_count,
                    chunk_count: response.chunks,
                };
                self.adopt_document(DocumentHandle::new(response.doc_id), metadata.clone(), &guard);
                guard.finish();

                info!("Uploaded '{}': {}", metadata.file_name, metadata.page_info());
                observer.on_upload_complete(&metadata);
                Ok(metadata)
            }
            Err(e) => {
                guard.finish();
                warn!("Upload of '{}' failed: {}", file.file_name(), e);
                let notice = UploadError::from_service(&e);
                observer.on_upload_failed(&notice.to_string());
                Err(notice)
            }
        }
    }

    /// Replace handle and metadata in one critical section.
    fn adopt_document(
        &self,
        handle: DocumentHandle,
        metadata: DocumentMetadata,
        _uploading: &ActivityGuard<'_>,
    ) {
        let reset = self.config().reset_transcript_on_upload;
        self.with_state(|s| {
            if reset && !s.transcript.is_empty() {
                debug!("New document; starting a fresh transcript");
                s.transcript = Transcript::new();
            }
            s.document_handle = Some(handle);
            s.metadata = Some(metadata);
        });
    }
}

/// An empty identifier would make every later question fail; treat it as a
/// malformed response instead.
fn check_doc_id(
    response: UploadResponse,
    config: &ClientConfig,
) -> Result<UploadResponse, ServiceError> {
    if response.doc_id.trim().is_empty() {
        let endpoint = config
            .endpoint("api/upload")
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/api/upload".to_string());
        return Err(ServiceError::Decode {
            endpoint,
            reason: "empty doc_id".into(),
        });
    }
    Ok(response)
}
