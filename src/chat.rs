//! Conversation controller: one question, one round trip, one answer.
//!
//! ## Turn sequence
//!
//! ```text
//! ask("q")
//!  ├─ 1. precondition   document present, nothing in flight
//!  ├─ 2. snapshot       history = transcript before "q"
//!  ├─ 3. append         user: "q"           (visible immediately)
//!  ├─ 4. pending        answer_pending = true
//!  ├─ 5. request        POST /api/chat { doc_id, question, history }
//!  ├─ 6. append         assistant: answer | fallback
//!  └─ 7. idle           answer_pending = false (guard, every exit path)
//! ```
//!
//! Steps 1–4 happen in one critical section, and step 6 and 7 in another,
//! so a concurrent reader never sees a half-applied turn.

use crate::error::{AskError, ServiceError};
use crate::model::Message;
use crate::service::wire::{ChatRequest, Citation};
use crate::session::{Activity, Session};
use tracing::{debug, info, warn};

/// What happened to one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// The input was empty or whitespace; nothing was sent or recorded.
    Ignored,
    /// The service answered; `answer` is now the last transcript entry.
    Answered {
        answer: Message,
        citations: Vec<Citation>,
    },
    /// The request failed; the fallback `answer` was recorded instead.
    Fallback { answer: Message, error: ServiceError },
}

impl AskOutcome {
    /// The assistant message appended by this turn, if any.
    pub fn answer(&self) -> Option<&Message> {
        match self {
            AskOutcome::Ignored => None,
            AskOutcome::Answered { answer, .. } | AskOutcome::Fallback { answer, .. } => {
                Some(answer)
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AskOutcome::Fallback { .. })
    }
}

impl Session {
    /// Ask a question about the current document.
    ///
    /// Returns `Err` only when the question could not be submitted at all
    /// (no document, or the session is busy); nothing is recorded then. Once
    /// submitted, a turn always ends with exactly one assistant message in
    /// the transcript, either the service's answer or the configured
    /// fallback; transport and server failures never surface as `Err`.
    pub async fn ask(&self, question: &str) -> Result<AskOutcome, AskError> {
        let question = question.trim();

        let request = self.with_state(|s| -> Result<Option<ChatRequest>, AskError> {
            let handle = s.document_handle.as_ref().ok_or(AskError::NoDocument)?;
            if question.is_empty() {
                return Ok(None);
            }
            if s.upload_in_progress {
                return Err(AskError::UploadInProgress);
            }
            if s.answer_pending {
                return Err(AskError::AnswerPending);
            }

            let request = ChatRequest {
                doc_id: handle.as_str().to_string(),
                question: question.to_string(),
                history: s.transcript.messages().to_vec(),
            };
            s.transcript.push(Message::user(question));
            s.answer_pending = true;
            Ok(Some(request))
        })?;

        let Some(request) = request else {
            debug!("Ignoring empty question");
            return Ok(AskOutcome::Ignored);
        };

        let fallback = self.config().fallback_answer.clone();
        let pending = self.arm(Activity::AnswerPending, Some(fallback.clone()));
        let observer = &self.config().observer;
        observer.on_question_sent(question);
        debug!(
            "Asking about {} with {} history messages",
            request.doc_id,
            request.history.len()
        );

        match self.backend().chat(&request).await {
            Ok(response) => {
                let answer = Message::assistant(response.answer);
                pending.finish_with(answer.clone());
                info!(
                    "Answer received ({} chars, {} citations)",
                    answer.content().len(),
                    response.citations.len()
                );
                observer.on_answer(answer.content());
                Ok(AskOutcome::Answered {
                    answer,
                    citations: response.citations,
                })
            }
            Err(error) => {
                let answer = Message::assistant(fallback);
                pending.finish_with(answer.clone());
                warn!("Chat turn failed, answered with fallback: {}", error);
                observer.on_answer_failed(&error.to_string());
                Ok(AskOutcome::Fallback { answer, error })
            }
        }
    }
}
