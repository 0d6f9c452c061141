//! `HttpBackend` against a throwaway axum server on localhost.
//!
//! The server answers each request with the next scripted reply and hands
//! what it received back to the test, so these run offline.
//!
//! Run with:
//!   cargo test --test http

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use edgequake_pdfchat::{ChatRequest, ClientConfig, PdfFile, Role, Session, UploadError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

enum Reply {
    Json(u16, &'static str),
    Text(u16, &'static str),
    /// Accept the request, then never answer in time.
    Hang,
}

#[derive(Debug)]
struct FormPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Debug)]
enum Received {
    Upload {
        content_type: String,
        parts: Vec<FormPart>,
    },
    Chat(ChatRequest),
    Health,
}

#[derive(Clone)]
struct FakeService {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    received: mpsc::UnboundedSender<Received>,
}

impl FakeService {
    async fn respond(&self, received: Received) -> Response {
        self.received.send(received).ok();
        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or(Reply::Text(500, "no reply scripted"));
        match reply {
            Reply::Json(status, body) => (
                status_code(status),
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            Reply::Text(status, body) => (status_code(status), body).into_response(),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                StatusCode::OK.into_response()
            }
        }
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap()
}

async fn handle_upload(
    State(service): State<FakeService>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let part_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap().to_vec();
        parts.push(FormPart {
            name,
            file_name,
            content_type: part_type,
            bytes,
        });
    }
    service
        .respond(Received::Upload {
            content_type,
            parts,
        })
        .await
}

async fn handle_chat(
    State(service): State<FakeService>,
    Json(request): Json<ChatRequest>,
) -> Response {
    service.respond(Received::Chat(request)).await
}

async fn handle_health(State(service): State<FakeService>) -> Response {
    service.respond(Received::Health).await
}

/// Serve `replies` in order, one per request. Returns the base URL and a
/// channel of what the server received.
async fn serve(replies: Vec<Reply>) -> (String, mpsc::UnboundedReceiver<Received>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let service = FakeService {
        replies: Arc::new(Mutex::new(replies.into())),
        received: tx,
    };
    let app = Router::new()
        .route("/api/upload", post(handle_upload))
        .route("/api/chat", post(handle_chat))
        .route("/api/health", get(handle_health))
        .with_state(service);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), rx)
}

async fn next_chat(received: &mut mpsc::UnboundedReceiver<Received>) -> ChatRequest {
    match received.recv().await {
        Some(Received::Chat(request)) => request,
        other => panic!("expected a chat request, got {other:?}"),
    }
}

fn session(base: &str, chat_timeout_secs: u64) -> Session {
    let config = ClientConfig::builder()
        .base_url(base)
        .chat_timeout_secs(chat_timeout_secs)
        .upload_timeout_secs(5)
        .build()
        .unwrap();
    Session::new(config).unwrap()
}

fn contract_pdf() -> PdfFile {
    PdfFile::new("contract.pdf", "application/pdf", b"%PDF-1.4 test body".to_vec())
}

const UPLOAD_OK: &str = r#"{"doc_id":"abc123","page_count":12,"chunks":30}"#;

// ── Upload ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_sends_multipart_file_field() {
    let (base, mut requests) = serve(vec![Reply::Json(200, UPLOAD_OK)]).await;
    let s = session(&base, 5);

    let meta = s.submit_file(contract_pdf()).await.unwrap();
    assert_eq!(meta.page_count, 12);
    assert_eq!(meta.chunk_count, Some(30));
    assert_eq!(s.document_handle().unwrap().as_str(), "abc123");

    let Some(Received::Upload {
        content_type,
        parts,
    }) = requests.recv().await
    else {
        panic!("expected an upload request");
    };
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert_eq!(parts.len(), 1);
    let part = &parts[0];
    assert_eq!(part.name, "file");
    assert_eq!(part.file_name.as_deref(), Some("contract.pdf"));
    assert_eq!(part.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(part.bytes, b"%PDF-1.4 test body");
}

#[tokio::test]
async fn upload_error_detail_is_shown_verbatim() {
    let (base, _requests) = serve(vec![Reply::Json(
        400,
        r#"{"detail":"No extractable text found in this PDF."}"#,
    )])
    .await;
    let s = session(&base, 5);

    let err = s.submit_file(contract_pdf()).await.unwrap_err();
    assert_eq!(
        err,
        UploadError::Failed {
            message: "No extractable text found in this PDF.".into()
        }
    );
    assert!(s.document_handle().is_none());
    assert!(!s.is_uploading());
}

#[tokio::test]
async fn upload_error_without_detail_is_generic() {
    let (base, _requests) = serve(vec![Reply::Text(500, "Internal Server Error")]).await;
    let s = session(&base, 5);

    let err = s.submit_file(contract_pdf()).await.unwrap_err();
    assert_eq!(err.to_string(), "Upload failed");
}

#[tokio::test]
async fn unreachable_service_fails_upload_gracefully() {
    // Bind then drop to obtain a port nobody listens on.
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap().port()
    };
    let s = session(&format!("http://127.0.0.1:{port}"), 5);

    let err = s.submit_file(contract_pdf()).await.unwrap_err();
    assert_eq!(err.to_string(), "Upload failed");
    assert!(!s.is_uploading());
}

// ── Chat ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_posts_json_turn_and_records_answer() {
    let (base, mut requests) = serve(vec![
        Reply::Json(200, UPLOAD_OK),
        Reply::Json(
            200,
            r#"{"answer":"Net 30 days.","citations":[{"page":4,"id":"abc123:7"}]}"#,
        ),
        Reply::Json(200, r#"{"answer":"1.5% per month."}"#),
    ])
    .await;
    let s = session(&base, 5);
    s.submit_file(contract_pdf()).await.unwrap();
    requests.recv().await.unwrap();

    s.ask("What is the payment term?").await.unwrap();
    let first = next_chat(&mut requests).await;
    assert_eq!(first.doc_id, "abc123");
    assert_eq!(first.question, "What is the payment term?");
    assert!(first.history.is_empty());

    s.ask("And the late fee?").await.unwrap();
    let second = next_chat(&mut requests).await;
    assert_eq!(second.question, "And the late fee?");
    let history: Vec<(Role, &str)> = second
        .history
        .iter()
        .map(|m| (m.role(), m.content()))
        .collect();
    assert_eq!(
        history,
        vec![
            (Role::User, "What is the payment term?"),
            (Role::Assistant, "Net 30 days."),
        ]
    );

    let t = s.transcript();
    assert_eq!(t.len(), 4);
    assert_eq!(t.last().unwrap().role(), Role::Assistant);
    assert_eq!(t.last().unwrap().content(), "1.5% per month.");
}

#[tokio::test]
async fn chat_timeout_appends_fallback() {
    let (base, _requests) = serve(vec![Reply::Json(200, UPLOAD_OK), Reply::Hang]).await;
    let s = session(&base, 1);
    s.submit_file(contract_pdf()).await.unwrap();

    let outcome = s.ask("X").await.unwrap();
    assert!(outcome.is_fallback());

    let t = s.transcript();
    let contents: Vec<&str> = t.iter().map(|m| m.content()).collect();
    assert_eq!(contents, vec!["X", "Sorry — something went wrong."]);
    assert!(!s.is_answer_pending());
}

#[tokio::test]
async fn chat_server_error_appends_fallback() {
    let (base, _requests) = serve(vec![
        Reply::Json(200, UPLOAD_OK),
        Reply::Json(429, r#"{"detail":"Chat failed: free-tier rate limit"}"#),
    ])
    .await;
    let s = session(&base, 5);
    s.submit_file(contract_pdf()).await.unwrap();

    let outcome = s.ask("X").await.unwrap();
    assert_eq!(
        outcome.answer().unwrap().content(),
        "Sorry — something went wrong."
    );
}

#[tokio::test]
async fn malformed_answer_body_appends_fallback() {
    let (base, _requests) = serve(vec![
        Reply::Json(200, UPLOAD_OK),
        Reply::Json(200, r#"{"reply":"wrong field"}"#),
    ])
    .await;
    let s = session(&base, 5);
    s.submit_file(contract_pdf()).await.unwrap();

    assert!(s.ask("X").await.unwrap().is_fallback());
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_probe() {
    let (base, mut requests) = serve(vec![
        Reply::Json(200, r#"{"status":"ok"}"#),
        Reply::Json(200, r#"{"status":"degraded"}"#),
    ])
    .await;
    let s = session(&base, 5);

    assert!(s.health().await.is_ok());
    assert!(matches!(requests.recv().await, Some(Received::Health)));
    assert!(s.health().await.is_err());
}
