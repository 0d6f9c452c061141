//! The session: one document handle, one transcript, two controllers.
//!
//! [`Session`] owns all mutable state behind a short-lived lock that is
//! never held across an `.await`, so it can be wrapped in an `Arc` and shared
//! between an input task and a rendering task. The controllers live in
//! [`crate::upload`] (`submit_file`) and [`crate::chat`] (`ask`).
//!
//! ## Gating
//!
//! At most one network operation is in flight per session:
//!
//! | In flight       | `submit_file`        | `ask`                          |
//! |-----------------|----------------------|--------------------------------|
//! | nothing         | allowed              | allowed once a document exists |
//! | upload          | `UploadError::Busy`  | `AskError::UploadInProgress`   |
//! | answer pending  | `UploadError::Busy`  | `AskError::AnswerPending`      |
//!
//! Because a second question cannot start before the first resolves,
//! answers land in the transcript in the order their questions were asked.

use crate::config::ClientConfig;
use crate::error::{PdfChatError, ServiceError, ABANDONED_TURN, GENERIC_UPLOAD_FAILURE};
use crate::model::{DocumentHandle, DocumentMetadata, Message, SessionState, Transcript};
use crate::service::{HttpBackend, QaBackend};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// A conversation about one uploaded PDF at a time.
pub struct Session {
    config: ClientConfig,
    backend: Arc<dyn QaBackend>,
    state: Mutex<SessionState>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A session talking HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self, PdfChatError> {
        let backend = HttpBackend::new(&config)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// A session over any [`QaBackend`].
    pub fn with_backend(config: ClientConfig, backend: Arc<dyn QaBackend>) -> Self {
        Self {
            config,
            backend,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Snapshot of everything a view needs to render.
    pub fn state(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn document_handle(&self) -> Option<DocumentHandle> {
        self.lock().document_handle.clone()
    }

    pub fn metadata(&self) -> Option<DocumentMetadata> {
        self.lock().metadata.clone()
    }

    pub fn transcript(&self) -> Transcript {
        self.lock().transcript.clone()
    }

    pub fn is_uploading(&self) -> bool {
        self.lock().upload_in_progress
    }

    pub fn is_answer_pending(&self) -> bool {
        self.lock().answer_pending
    }

    /// Ask the service whether it is up.
    pub async fn health(&self) -> Result<(), ServiceError> {
        self.backend.health().await
    }

    pub(crate) fn backend(&self) -> &dyn QaBackend {
        self.backend.as_ref()
    }

    /// Run `f` with exclusive access to the state.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.lock())
    }

    /// Claim the session for `activity` if nothing else is in flight.
    pub(crate) fn begin(&self, activity: Activity) -> Option<ActivityGuard<'_>> {
        let mut s = self.lock();
        if s.upload_in_progress || s.answer_pending {
            return None;
        }
        activity.set(&mut s, true);
        drop(s);
        Some(self.arm(activity, None))
    }

    /// Guard for an activity whose flag the caller already raised.
    ///
    /// With `unanswered` set, dropping the guard without
    /// [`ActivityGuard::finish_with`] appends that text as the assistant's
    /// reply, so an abandoned turn still leaves user/assistant pairs.
    pub(crate) fn arm(&self, activity: Activity, unanswered: Option<String>) -> ActivityGuard<'_> {
        ActivityGuard {
            session: self,
            activity,
            unanswered,
            released: false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // Every critical section leaves the state valid, so a poisoned lock
        // is still safe to use.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The two things a session can be busy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Activity {
    Uploading,
    AnswerPending,
}

impl Activity {
    fn set(self, s: &mut SessionState, on: bool) {
        match self {
            Activity::Uploading => s.upload_in_progress = on,
            Activity::AnswerPending => s.answer_pending = on,
        }
    }
}

/// Lowers an activity flag when dropped, on every exit path: return, `?`,
/// panic in the backend, or the caller dropping the future mid-request.
///
/// An abandoned activity is also reported to the observer as a failure, so a
/// view that saw the start hook always sees an end hook.
#[must_use]
pub(crate) struct ActivityGuard<'a> {
    session: &'a Session,
    activity: Activity,
    unanswered: Option<String>,
    released: bool,
}

impl ActivityGuard<'_> {
    /// Lower the flag. The caller reports the outcome to the observer.
    pub(crate) fn finish(mut self) {
        self.activity.set(&mut self.session.lock(), false);
        self.released = true;
    }

    /// Append `message` and lower the flag in the same critical section.
    pub(crate) fn finish_with(mut self, message: Message) {
        let mut s = self.session.lock();
        s.transcript.push(message);
        self.activity.set(&mut s, false);
        drop(s);
        self.released = true;
    }
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        {
            let mut s = self.session.lock();
            if let Some(text) = self.unanswered.take() {
                s.transcript.push(Message::assistant(text));
            }
            self.activity.set(&mut s, false);
        }

        let observer = &self.session.config.observer;
        match self.activity {
            Activity::Uploading => {
                warn!("Upload abandoned before it finished");
                observer.on_upload_failed(GENERIC_UPLOAD_FAILURE);
            }
            Activity::AnswerPending => {
                warn!("Chat turn abandoned before an answer arrived");
                observer.on_answer_failed(ABANDONED_TURN);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn session() -> Session {
        Session::new(ClientConfig::default()).unwrap()
    }

    #[test]
    fn new_session_is_idle_and_empty() {
        let s = session().state();
        assert!(s.document_handle.is_none());
        assert!(s.metadata.is_none());
        assert!(s.transcript.is_empty());
        assert!(!s.upload_in_progress);
        assert!(!s.answer_pending);
    }

    #[test]
    fn begin_is_exclusive_and_guard_releases_on_drop() {
        let s = session();
        let guard = s.begin(Activity::Uploading).expect("idle session");
        assert!(s.is_uploading());
        assert!(s.begin(Activity::Uploading).is_none());
        assert!(s.begin(Activity::AnswerPending).is_none());
        drop(guard);
        assert!(!s.is_uploading());
        assert!(s.begin(Activity::AnswerPending).is_some());
    }

    #[test]
    fn abandoned_answer_appends_fallback() {
        let s = session();
        s.with_state(|st| {
            st.transcript.push(Message::user("X"));
            st.answer_pending = true;
        });
        drop(s.arm(Activity::AnswerPending, Some("fallback".into())));

        let st = s.state();
        assert!(!st.answer_pending);
        assert_eq!(st.transcript.len(), 2);
        assert_eq!(st.transcript.messages()[1].role(), Role::Assistant);
        assert_eq!(st.transcript.messages()[1].content(), "fallback");
    }

    #[test]
    fn finish_with_appends_exactly_once() {
        let s = session();
        s.with_state(|st| st.answer_pending = true);
        s.arm(Activity::AnswerPending, Some("fallback".into()))
            .finish_with(Message::assistant("real answer"));

        let st = s.state();
        assert!(!st.answer_pending);
        assert_eq!(st.transcript.len(), 1);
        assert_eq!(st.transcript.messages()[0].content(), "real answer");
    }

    #[derive(Default)]
    struct Ends(Mutex<Vec<String>>);

    impl crate::observer::SessionObserver for Ends {
        fn on_upload_failed(&self, message: &str) {
            self.0.lock().unwrap().push(format!("upload_failed {message}"));
        }
        fn on_answer_failed(&self, error: &str) {
            self.0.lock().unwrap().push(format!("answer_failed {error}"));
        }
    }

    #[test]
    fn abandoned_guards_report_to_observer() {
        let ends = Arc::new(Ends::default());
        let config = ClientConfig::builder().observer(ends.clone()).build().unwrap();
        let s = Session::new(config).unwrap();

        s.begin(Activity::Uploading).unwrap().finish();
        assert!(ends.0.lock().unwrap().is_empty());

        drop(s.begin(Activity::Uploading));
        s.with_state(|st| st.answer_pending = true);
        drop(s.arm(Activity::AnswerPending, Some("fallback".into())));

        assert_eq!(
            *ends.0.lock().unwrap(),
            vec!["upload_failed Upload failed", "answer_failed cancelled"]
        );
        assert!(s.state().can_upload());
    }
}
