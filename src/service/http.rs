//! [`QaBackend`] over HTTP with `reqwest`.

use super::wire::{ChatRequest, ChatResponse, ErrorBody, HealthResponse, UploadResponse};
use super::QaBackend;
use crate::config::ClientConfig;
use crate::error::{PdfChatError, ServiceError};
use crate::upload::PdfFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const UPLOAD_PATH: &str = "api/upload";
const CHAT_PATH: &str = "api/chat";
const HEALTH_PATH: &str = "api/health";

/// Timeout for the health probe; it should answer instantly.
const HEALTH_TIMEOUT_SECS: u64 = 10;

/// HTTP client for the question-answering service.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    upload_url: Url,
    chat_url: Url,
    health_url: Url,
    upload_timeout_secs: u64,
    chat_timeout_secs: u64,
}

impl HttpBackend {
    /// Build a backend for the service at `config.base_url`.
    pub fn new(config: &ClientConfig) -> Result<Self, PdfChatError> {
        let client = Client::builder()
            .user_agent(concat!("edgequake-pdfchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PdfChatError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            upload_url: config.endpoint(UPLOAD_PATH)?,
            chat_url: config.endpoint(CHAT_PATH)?,
            health_url: config.endpoint(HEALTH_PATH)?,
            upload_timeout_secs: config.upload_timeout_secs,
            chat_timeout_secs: config.chat_timeout_secs,
        })
    }
}

#[async_trait]
impl QaBackend for HttpBackend {
    async fn upload(&self, file: &PdfFile) -> Result<UploadResponse, ServiceError> {
        let endpoint = self.upload_url.path();
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.file_name().to_string())
            .mime_str(file.media_type())
            .map_err(|e| ServiceError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        let form = Form::new().part("file", part);

        debug!(
            "POST {} ({} bytes, '{}')",
            self.upload_url,
            file.size(),
            file.file_name()
        );
        let response = self
            .client
            .post(self.upload_url.clone())
            .multipart(form)
            .timeout(Duration::from_secs(self.upload_timeout_secs))
            .send()
            .await
            .map_err(|e| classify(endpoint, self.upload_timeout_secs, e))?;

        decode(endpoint, self.upload_timeout_secs, response).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ServiceError> {
        let endpoint = self.chat_url.path();
        debug!(
            "POST {} (doc {}, {} history messages)",
            self.chat_url,
            request.doc_id,
            request.history.len()
        );
        let response = self
            .client
            .post(self.chat_url.clone())
            .json(request)
            .timeout(Duration::from_secs(self.chat_timeout_secs))
            .send()
            .await
            .map_err(|e| classify(endpoint, self.chat_timeout_secs, e))?;

        decode(endpoint, self.chat_timeout_secs, response).await
    }

    async fn health(&self) -> Result<(), ServiceError> {
        let endpoint = self.health_url.path();
        let response = self
            .client
            .get(self.health_url.clone())
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| classify(endpoint, HEALTH_TIMEOUT_SECS, e))?;

        let body: HealthResponse = decode(endpoint, HEALTH_TIMEOUT_SECS, response).await?;
        if body.status == "ok" {
            Ok(())
        } else {
            Err(ServiceError::Decode {
                endpoint: endpoint.to_string(),
                reason: format!("status '{}'", body.status),
            })
        }
    }
}

/// Check the status line, then parse a JSON success body.
async fn decode<T: DeserializeOwned>(
    endpoint: &str,
    timeout_secs: u64,
    response: Response,
) -> Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        // A body we cannot read still tells us the status.
        let raw = response.text().await.unwrap_or_default();
        return Err(ServiceError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            detail: ErrorBody::detail_from(&raw),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| classify(endpoint, timeout_secs, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

fn classify(endpoint: &str, timeout_secs: u64, err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout {
            endpoint: endpoint.to_string(),
            secs: timeout_secs,
        }
    } else {
        ServiceError::Transport {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    }
}
