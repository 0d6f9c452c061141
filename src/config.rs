//! Configuration for a chat session.
//!
//! Everything the controllers need from the outside world lives in
//! [`ClientConfig`], built via [`ClientConfigBuilder`] and injected into
//! [`crate::Session`] at construction. Nothing in the library reads the
//! process environment; the `pdfchat` binary resolves `PDFCHAT_API_URL` once at
//! startup and passes the result in here.

use crate::error::PdfChatError;
use crate::observer::{NoopObserver, SharedObserver};
use reqwest::Url;
use std::fmt;
use std::sync::Arc;

/// Service address used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// The only media type accepted for upload.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Upload ceiling: 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Assistant text appended when a chat turn fails.
pub const FALLBACK_ANSWER: &str = "Sorry — something went wrong.";

/// Configuration for a [`crate::Session`].
///
/// # Example
/// ```rust
/// use edgequake_pdfchat::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:8000")
///     .chat_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url.as_str(), "http://localhost:8000/");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Root of the question-answering service. Endpoints are joined onto it.
    pub base_url: Url,

    /// Largest file accepted for upload, in bytes. Default: 10 MiB.
    pub max_upload_bytes: u64,

    /// Timeout for the upload request in seconds. Default: 120.
    ///
    /// Ingestion embeds every page server-side before answering, so large
    /// documents take far longer than a chat turn.
    pub upload_timeout_secs: u64,

    /// Timeout for one chat turn in seconds. Default: 60.
    pub chat_timeout_secs: u64,

    /// Assistant text appended when a chat turn fails.
    pub fallback_answer: String,

    /// Start a fresh transcript when a new document replaces the current one.
    /// Default: true.
    pub reset_transcript_on_upload: bool,

    /// Receives upload and chat lifecycle events. Default: no-op.
    pub observer: SharedObserver,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            upload_timeout_secs: 120,
            chat_timeout_secs: 60,
            fallback_answer: FALLBACK_ANSWER.to_string(),
            reset_transcript_on_upload: true,
            observer: Arc::new(NoopObserver),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .field("chat_timeout_secs", &self.chat_timeout_secs)
            .field("fallback_answer", &self.fallback_answer)
            .field("reset_transcript_on_upload", &self.reset_transcript_on_upload)
            .field("observer", &"<dyn SessionObserver>")
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
            base_url: None,
        }
    }

    /// Absolute URL of a service endpoint such as `api/upload`.
    pub fn endpoint(&self, path: &str) -> Result<Url, PdfChatError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| PdfChatError::InvalidConfig(format!("bad endpoint '{path}': {e}")))
    }
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    config: ClientConfig,
    base_url: Option<String>,
}

impl fmt::Debug for ClientConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfigBuilder")
            .field("config", &self.config)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ClientConfigBuilder {
    /// Service root, e.g. `http://localhost:8000`. Must be http or https.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Largest accepted file in bytes. Default: 10 MiB.
    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    /// Upload request timeout. Default: 120 s.
    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upload_timeout_secs = secs;
        self
    }

    /// Per-question timeout. Default: 60 s.
    pub fn chat_timeout_secs(mut self, secs: u64) -> Self {
        self.config.chat_timeout_secs = secs;
        self
    }

    /// Assistant text recorded when a turn fails. Must not be blank.
    pub fn fallback_answer(mut self, text: impl Into<String>) -> Self {
        self.config.fallback_answer = text.into();
        self
    }

    /// Clear the transcript when a new document is adopted. Default: true.
    pub fn reset_transcript_on_upload(mut self, v: bool) -> Self {
        self.config.reset_transcript_on_upload = v;
        self
    }

    /// Lifecycle hooks for a front-end. Default: [`NoopObserver`].
    pub fn observer(mut self, observer: SharedObserver) -> Self {
        self.config.observer = observer;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ClientConfig, PdfChatError> {
        if let Some(raw) = self.base_url.take() {
            self.config.base_url = parse_base_url(&raw)?;
        }
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(PdfChatError::InvalidConfig(
                "Max upload size must be ≥ 1 byte".into(),
            ));
        }
        if c.upload_timeout_secs == 0 || c.chat_timeout_secs == 0 {
            return Err(PdfChatError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.fallback_answer.trim().is_empty() {
            return Err(PdfChatError::InvalidConfig(
                "Fallback answer must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Parse a base URL, insisting on http(s) and a trailing slash so that
/// `Url::join` appends endpoints instead of replacing the last segment.
fn parse_base_url(raw: &str) -> Result<Url, PdfChatError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| PdfChatError::InvalidConfig(format!("Invalid base URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PdfChatError::InvalidConfig(format!(
            "Base URL must use http or https, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_limits() {
        let c = ClientConfig::default();
        assert_eq!(c.base_url.as_str(), "http://localhost:8000/");
        assert_eq!(c.max_upload_bytes, 10_485_760);
        assert_eq!(c.fallback_answer, "Sorry — something went wrong.");
        assert!(c.reset_transcript_on_upload);
    }

    #[test]
    fn endpoint_joins_under_base_path() {
        let c = ClientConfig::builder()
            .base_url("https://qa.example.com/v1")
            .build()
            .unwrap();
        assert_eq!(
            c.endpoint("/api/upload").unwrap().as_str(),
            "https://qa.example.com/v1/api/upload"
        );
        assert_eq!(
            c.endpoint("api/chat").unwrap().as_str(),
            "https://qa.example.com/v1/api/chat"
        );
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = ClientConfig::builder()
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http or https"), "got: {err}");
    }

    #[test]
    fn rejects_garbage_url() {
        assert!(ClientConfig::builder().base_url("not a url").build().is_err());
    }

    #[test]
    fn rejects_zero_limits() {
        assert!(ClientConfig::builder().max_upload_bytes(0).build().is_err());
        assert!(ClientConfig::builder().chat_timeout_secs(0).build().is_err());
        assert!(ClientConfig::builder().upload_timeout_secs(0).build().is_err());
        assert!(ClientConfig::builder().fallback_answer("  ").build().is_err());
    }
}
