//! In-memory backend shared by the application tests.

use crate::session::SessionStore;
use async_trait::async_trait;
use docchat_core::error::{DocchatError, Result};
use docchat_core::session::{
    AttachedFile, ChatReply, MessageCodec, Session, SessionBackend, UploadReceipt,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A backend call as the mock saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List,
    Upload { session_id: String, file_name: String },
    Ask { session_id: String, query: String },
    Delete { session_id: String },
}

#[derive(Default)]
struct MockState {
    sessions: Vec<Session>,
    ask_results: VecDeque<Result<ChatReply>>,
    upload_results: VecDeque<Result<UploadReceipt>>,
    list_error: Option<DocchatError>,
    delete_error: Option<DocchatError>,
    /// Append asked turns to the session history, like the real backend
    persist: bool,
    calls: Vec<Call>,
}

/// Scriptable [`SessionBackend`].
///
/// Unscripted asks answer `answer to <query>`, unscripted uploads succeed
/// without a message.
pub(crate) struct MockBackend {
    state: Mutex<MockState>,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            hold: Mutex::new(None),
        }
    }

    /// Seeds sessions with the given raw histories.
    pub(crate) fn with_sessions(sessions: &[(&str, &[&str])]) -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().sessions = sessions
            .iter()
            .map(|(id, history)| Session {
                session_id: id.to_string(),
                history: history.iter().map(|turn| turn.to_string()).collect(),
                title: None,
            })
            .collect();
        backend
    }

    pub(crate) fn persisting(self) -> Self {
        self.state.lock().unwrap().persist = true;
        self
    }

    pub(crate) fn push_ask(&self, result: Result<ChatReply>) {
        self.state.lock().unwrap().ask_results.push_back(result);
    }

    pub(crate) fn push_upload(&self, result: Result<UploadReceipt>) {
        self.state.lock().unwrap().upload_results.push_back(result);
    }

    pub(crate) fn fail_list(&self, error: Option<DocchatError>) {
        self.state.lock().unwrap().list_error = error;
    }

    pub(crate) fn fail_delete(&self, error: Option<DocchatError>) {
        self.state.lock().unwrap().delete_error = error;
    }

    /// Makes asks and uploads wait until the returned handle is notified.
    pub(crate) fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    async fn wait_if_held(&self) {
        let hold = self.hold.lock().unwrap().clone();
        if let Some(notify) = hold {
            notify.notified().await;
        }
    }
}

#[async_trait]
impl SessionBackend for MockBackend {
    async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.record(Call::List);
        let state = self.state.lock().unwrap();
        match &state.list_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.sessions.clone()),
        }
    }

    async fn upload_document(
        &self,
        session_id: &str,
        file: &AttachedFile,
    ) -> Result<UploadReceipt> {
        self.record(Call::Upload {
            session_id: session_id.to_string(),
            file_name: file.display_name.clone(),
        });
        self.wait_if_held().await;
        let mut state = self.state.lock().unwrap();
        if !state
            .sessions
            .iter()
            .any(|session| session.session_id == session_id)
        {
            state.sessions.push(Session::new(session_id));
        }
        state
            .upload_results
            .pop_front()
            .unwrap_or_else(|| Ok(UploadReceipt::default()))
    }

    async fn ask(&self, session_id: &str, query: &str) -> Result<ChatReply> {
        self.record(Call::Ask {
            session_id: session_id.to_string(),
            query: query.to_string(),
        });
        self.wait_if_held().await;
        let mut state = self.state.lock().unwrap();
        let result = state.ask_results.pop_front().unwrap_or_else(|| {
            Ok(ChatReply {
                text: format!("answer to {query}"),
                sources: Vec::new(),
            })
        });

        if state.persist
            && let Ok(reply) = &result
        {
            let turns = [format!("Human: {query}"), format!("AI: {}", reply.text)];
            match state
                .sessions
                .iter_mut()
                .find(|session| session.session_id == session_id)
            {
                Some(session) => session.history.extend(turns),
                None => {
                    let mut session = Session::new(session_id);
                    session.history.extend(turns);
                    state.sessions.push(session);
                }
            }
        }
        result
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.record(Call::Delete {
            session_id: session_id.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.delete_error {
            return Err(err.clone());
        }
        state
            .sessions
            .retain(|session| session.session_id != session_id);
        Ok(())
    }
}

pub(crate) fn store_with(backend: &Arc<MockBackend>) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(backend.clone(), MessageCodec::default()))
}

/// Yields until `store` has an operation in flight.
pub(crate) async fn until_pending(store: &SessionStore) {
    while store.pending().is_idle() {
        tokio::task::yield_now().await;
    }
}
