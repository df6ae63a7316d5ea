//! Upload flow: document ingestion for the active session.

use crate::in_flight::InFlight;
use crate::outcome::FlowOutcome;
use crate::session::SessionStore;
use docchat_core::session::{AttachedFile, Message};
use docchat_core::state::{GateRejection, OperationRequest, RequestGate, Ticket};
use std::sync::Arc;

/// Shown when the backend confirms an upload without a message of its own.
pub const UPLOAD_SUCCESS_FALLBACK: &str =
    "Document processed. You can now ask questions about it.";
/// Shown when an upload fails without a backend detail.
pub const UPLOAD_FAILURE_FALLBACK: &str = "Failed to process the document. Please try again.";

/// Text of the transient notice shown while `file_name` is being ingested.
pub fn processing_notice(file_name: &str) -> String {
    format!("Processing {file_name}... this can take a while for large documents.")
}

/// Submits the attached document for the active session.
///
/// `Idle → Uploading → Idle`. Unlike a chat turn, an upload replaces the
/// whole view with a single notice at each step.
pub struct UploadFlow {
    store: Arc<SessionStore>,
}

impl UploadFlow {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Attaches `file` and uploads it.
    pub async fn upload_file(&self, file: AttachedFile) -> FlowOutcome {
        self.store.attach_file(file);
        self.upload().await
    }

    /// Uploads the attached file.
    ///
    /// On success the view shows the confirmation notice and the attached
    /// file is cleared. On failure the view shows the failure notice and the
    /// file stays attached for a retry. Either way the session list is
    /// refreshed, since the backend registers the session before ingesting.
    pub async fn upload(&self) -> FlowOutcome {
        let admitted: Result<(Ticket, AttachedFile), GateRejection> =
            self.store.with_active(|state| {
                let ticket = RequestGate::try_enter(state, OperationRequest::Upload)?;
                let Some(file) = state.attached_file.clone() else {
                    RequestGate::release(state, &ticket);
                    return Err(GateRejection::NoFileAttached);
                };
                state.messages = vec![Message::notice(processing_notice(&file.display_name))];
                state.anomalies.clear();
                Ok((ticket, file))
            });
        let (ticket, file) = match admitted {
            Ok(admitted) => admitted,
            Err(rejection) => {
                tracing::debug!("[UploadFlow] Upload rejected: {}", rejection);
                return FlowOutcome::Rejected(rejection);
            }
        };

        let in_flight = InFlight::new(&self.store, ticket);
        let session_id = in_flight.ticket().session_id.clone();
        tracing::info!(
            "[UploadFlow] Uploading {} to session {}",
            file.display_name,
            session_id
        );

        let result = self.store.backend().upload_document(&session_id, &file).await;

        let outcome = in_flight.complete(|state, ticket| {
            if !state.is_active(&ticket.session_id) {
                tracing::info!(
                    "[UploadFlow] Session {} is no longer active, discarding result",
                    ticket.session_id
                );
                return FlowOutcome::Discarded {
                    session_id: ticket.session_id.clone(),
                };
            }

            match result {
                Ok(receipt) => {
                    let text = receipt
                        .message
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| UPLOAD_SUCCESS_FALLBACK.to_string());
                    state.messages = vec![Message::notice(text)];
                    state.attached_file = None;
                    FlowOutcome::Completed
                }
                Err(err) => {
                    tracing::error!("[UploadFlow] Upload of {} failed: {}", file.display_name, err);
                    let notice = err.user_message(UPLOAD_FAILURE_FALLBACK);
                    state.messages = vec![Message::notice(notice.clone())];
                    FlowOutcome::Failed { notice }
                }
            }
        });

        self.store.refresh_quietly().await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, MockBackend, store_with, until_pending};
    use docchat_core::DocchatError;
    use docchat_core::session::{MessageStatus, UploadReceipt};
    use docchat_core::state::Pending;

    async fn active_store(backend: &Arc<MockBackend>) -> Arc<SessionStore> {
        let store = store_with(backend);
        store.initialize().await;
        store
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected_without_request() {
        let backend = Arc::new(MockBackend::with_sessions(&[("s1", &["Human: hi"])]));
        let store = active_store(&backend).await;

        let outcome = UploadFlow::new(store.clone()).upload().await;

        assert_eq!(outcome, FlowOutcome::Rejected(GateRejection::NoFileAttached));
        let view = store.snapshot();
        assert_eq!(view.pending, Pending::Idle);
        assert_eq!(view.messages.len(), 1);
        assert_eq!(backend.count(|call| matches!(call, Call::Upload { .. })), 0);
    }

    #[tokio::test]
    async fn test_upload_success_replaces_view_and_clears_file() {
        let backend = Arc::new(MockBackend::with_sessions(&[("s1", &["Human: hi"])]));
        backend.push_upload(Ok(UploadReceipt {
            message: Some("Indexed report.pdf".to_string()),
        }));
        let store = active_store(&backend).await;
        let lists_before = backend.count(|call| matches!(call, Call::List));

        let outcome = UploadFlow::new(store.clone())
            .upload_file(AttachedFile::from_path("/tmp/report.pdf"))
            .await;

        assert_eq!(outcome, FlowOutcome::Completed);
        let view = store.snapshot();
        assert_eq!(view.messages, vec![Message::notice("Indexed report.pdf")]);
        assert!(view.attached_file.is_none());
        assert_eq!(view.pending, Pending::Idle);
        assert!(backend.calls().contains(&Call::Upload {
            session_id: "s1".to_string(),
            file_name: "report.pdf".to_string(),
        }));
        assert_eq!(
            backend.count(|call| matches!(call, Call::List)),
            lists_before + 1
        );
    }

    #[tokio::test]
    async fn test_upload_success_without_message_uses_fallback() {
        let backend = Arc::new(MockBackend::with_sessions(&[("s1", &[])]));
        let store = active_store(&backend).await;

        UploadFlow::new(store.clone())
            .upload_file(AttachedFile::from_path("/tmp/report.pdf"))
            .await;

        assert_eq!(
            store.snapshot().messages,
            vec![Message::notice(UPLOAD_SUCCESS_FALLBACK)]
        );
    }

    #[tokio::test]
    async fn test_upload_shows_processing_notice_while_pending() {
        let backend = Arc::new(MockBackend::with_sessions(&[("s1", &["Human: hi"])]));
        let store = active_store(&backend).await;
        let release = backend.hold();

        let flow = UploadFlow::new(store.clone());
        let handle = tokio::spawn(async move {
            flow.upload_file(AttachedFile::from_path("/tmp/report.pdf"))
                .await
        });
        until_pending(&store).await;

        let view = store.snapshot();
        assert_eq!(view.pending, Pending::Uploading);
        assert_eq!(
            view.messages,
            vec![Message::notice(processing_notice("report.pdf"))]
        );
        assert_eq!(
            crate::ChatFlow::new(store.clone()).send_text("q").await,
            FlowOutcome::Rejected(GateRejection::Busy(Pending::Uploading))
        );

        release.notify_one();
        assert!(handle.await.unwrap().is_completed());
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_file_and_refreshes() {
        let backend = Arc::new(MockBackend::with_sessions(&[("s1", &[])]));
        backend.push_upload(Err(DocchatError::backend(
            415,
            Some("Only PDF files are supported".to_string()),
        )));
        let store = active_store(&backend).await;
        let lists_before = backend.count(|call| matches!(call, Call::List));

        let outcome = UploadFlow::new(store.clone())
            .upload_file(AttachedFile::from_path("/tmp/notes.txt"))
            .await;

        assert_eq!(
            outcome,
            FlowOutcome::Failed {
                notice: "Only PDF files are supported".to_string()
            }
        );
        let view = store.snapshot();
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.messages[0].status, MessageStatus::Notice);
        assert_eq!(
            view.attached_file,
            Some(AttachedFile::from_path("/tmp/notes.txt"))
        );
        assert_eq!(view.pending, Pending::Idle);
        assert_eq!(
            backend.count(|call| matches!(call, Call::List)),
            lists_before + 1
        );
    }

    #[tokio::test]
    async fn test_failed_upload_to_new_session_still_lists_it() {
        let backend = Arc::new(MockBackend::new());
        backend.push_upload(Err(DocchatError::backend(
            500,
            Some("Error processing PDF".to_string()),
        )));
        let store = active_store(&backend).await;
        let session_id = store.active_session_id().unwrap();
        assert!(store.list().is_empty());

        let outcome = UploadFlow::new(store.clone())
            .upload_file(AttachedFile::from_path("/tmp/broken.pdf"))
            .await;

        assert!(matches!(outcome, FlowOutcome::Failed { .. }));
        let listed: Vec<String> = store
            .list()
            .into_iter()
            .map(|session| session.session_id)
            .collect();
        assert_eq!(listed, vec![session_id]);
    }

    #[tokio::test]
    async fn test_upload_failure_without_detail_uses_fallback() {
        let backend = Arc::new(MockBackend::with_sessions(&[("s1", &[])]));
        backend.push_upload(Err(DocchatError::transport("reset by peer")));
        let store = active_store(&backend).await;

        UploadFlow::new(store.clone())
            .upload_file(AttachedFile::from_path("/tmp/report.pdf"))
            .await;

        assert_eq!(
            store.snapshot().messages,
            vec![Message::notice(UPLOAD_FAILURE_FALLBACK)]
        );
    }

    #[tokio::test]
    async fn test_upload_result_for_abandoned_session_is_discarded() {
        let backend = Arc::new(MockBackend::with_sessions(&[("a", &[]), ("b", &["Human: b"])]));
        let store = active_store(&backend).await;
        let release = backend.hold();

        let flow = UploadFlow::new(store.clone());
        let handle = tokio::spawn(async move {
            flow.upload_file(AttachedFile::from_path("/tmp/report.pdf"))
                .await
        });
        until_pending(&store).await;
        store.select_session("b").unwrap();
        release.notify_one();

        assert_eq!(
            handle.await.unwrap(),
            FlowOutcome::Discarded {
                session_id: "a".to_string()
            }
        );
        let view = store.snapshot();
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.messages[0].text, "b");
        assert_eq!(view.pending, Pending::Idle);
    }
}
