//! Chat flow: one question, one answer.

use crate::in_flight::InFlight;
use crate::outcome::FlowOutcome;
use crate::session::SessionStore;
use docchat_core::session::Message;
use docchat_core::state::{GateRejection, OperationRequest, RequestGate, Ticket};
use std::sync::Arc;

/// Shown when a chat exchange fails without a backend detail.
pub const CHAT_FAILURE_FALLBACK: &str =
    "Sorry, something went wrong while getting an answer. Please try again.";

/// Sends the user's question for the active session.
///
/// `Idle → Sending → Idle`. The question appears in the view immediately as a
/// provisional message and stays there whatever happens to the exchange.
pub struct ChatFlow {
    store: Arc<SessionStore>,
}

impl ChatFlow {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Puts `text` in the input buffer and sends it.
    ///
    /// The buffer is written in the same critical section that admits the
    /// request, so concurrent callers never send each other's text. A
    /// rejected request leaves `text` in the buffer.
    pub async fn send_text(&self, text: impl Into<String>) -> FlowOutcome {
        self.submit(Some(text.into())).await
    }

    /// Sends the current input buffer.
    ///
    /// 1. The gate admits the request or the call returns `Rejected` without
    ///    touching the view or the network.
    /// 2. The question is appended as a provisional user message and the
    ///    input buffer is cleared.
    /// 3. The answer is appended as a provisional assistant message, or a
    ///    notice with the failure text is appended instead.
    /// 4. The gate is released and the session list refreshed, whatever the
    ///    outcome.
    pub async fn send(&self) -> FlowOutcome {
        self.submit(None).await
    }

    async fn submit(&self, text: Option<String>) -> FlowOutcome {
        let admitted: Result<(Ticket, String), GateRejection> = self.store.with_active(|state| {
            if let Some(text) = text {
                state.draft = text;
            }
            let query = state.draft.trim().to_string();
            let ticket = RequestGate::try_enter(state, OperationRequest::Send { text: &query })?;
            state.messages.push(Message::provisional_user(query.clone()));
            state.draft.clear();
            Ok((ticket, query))
        });
        let (ticket, query) = match admitted {
            Ok(admitted) => admitted,
            Err(rejection) => {
                tracing::debug!("[ChatFlow] Send rejected: {}", rejection);
                return FlowOutcome::Rejected(rejection);
            }
        };

        let in_flight = InFlight::new(&self.store, ticket);
        let session_id = in_flight.ticket().session_id.clone();
        tracing::info!("[ChatFlow] Asking in session {}", session_id);

        let result = self.store.backend().ask(&session_id, &query).await;

        let outcome = in_flight.complete(|state, ticket| {
            if !state.is_active(&ticket.session_id) {
                tracing::info!(
                    "[ChatFlow] Session {} is no longer active, discarding reply",
                    ticket.session_id
                );
                return FlowOutcome::Discarded {
                    session_id: ticket.session_id.clone(),
                };
            }

            match result {
                Ok(reply) => {
                    if !reply.sources.is_empty() {
                        tracing::debug!("[ChatFlow] Reply cites {:?}", reply.sources);
                    }
                    state
                        .messages
                        .push(Message::provisional_reply(reply.text, reply.sources));
                    FlowOutcome::Completed
                }
                Err(err) => {
                    tracing::error!("[ChatFlow] Chat request failed: {}", err);
                    let notice = err.user_message(CHAT_FAILURE_FALLBACK);
                    state.messages.push(Message::notice(notice.clone()));
                    FlowOutcome::Failed { notice }
                }
            }
        });

        self.store.refresh_quietly().await;
        outcome
    }
}
