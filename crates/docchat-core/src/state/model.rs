//! Active view state.
//!
//! `ActiveState` is the single mutable "current view": which session is
//! active, the messages shown for it, and whether a mutating operation is in
//! flight.

use super::gate::Ticket;
use crate::session::{AttachedFile, DecodeAnomaly, Message};
use serde::{Deserialize, Serialize};

/// Which mutating operation, if any, is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Pending {
    #[default]
    Idle,
    Sending,
    Uploading,
}

impl Pending {
    pub fn is_idle(&self) -> bool {
        matches!(self, Pending::Idle)
    }
}

/// The state the presentation layer renders.
///
/// Only the application layer mutates it; renderers get clones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveState {
    /// Active session, `None` only before initialization.
    pub active_session_id: Option<String>,
    /// Messages of the active session, in display order.
    pub messages: Vec<Message>,
    pub pending: Pending,
    /// Document chosen for the next upload.
    pub attached_file: Option<AttachedFile>,
    /// Text typed but not yet sent.
    pub draft: String,
    /// Whether the session list overlay is open on narrow layouts.
    pub sidebar_open: bool,
    /// History entries of the active session that failed to decode.
    pub anomalies: Vec<DecodeAnomaly>,
    /// The operation currently holding the gate.
    #[serde(skip)]
    pub(crate) in_flight: Option<Ticket>,
    #[serde(skip)]
    pub(crate) next_op_id: u64,
}

impl ActiveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `session_id` is the active session.
    pub fn is_active(&self, session_id: &str) -> bool {
        self.active_session_id.as_deref() == Some(session_id)
    }

    /// The ticket of the outstanding operation, if any.
    pub fn in_flight(&self) -> Option<&Ticket> {
        self.in_flight.as_ref()
    }

    /// Switches the view to `session_id` with the given decoded history.
    ///
    /// Messages are replaced, never merged, and the attached file is dropped.
    /// An in-flight operation keeps the gate; its result is discarded when it
    /// lands for a session that is no longer active.
    pub fn activate(
        &mut self,
        session_id: impl Into<String>,
        messages: Vec<Message>,
        anomalies: Vec<DecodeAnomaly>,
    ) {
        self.active_session_id = Some(session_id.into());
        self.messages = messages;
        self.anomalies = anomalies;
        self.attached_file = None;
        self.sidebar_open = false;
    }

    /// Marks provisional entries that `snapshot` now contains as confirmed.
    ///
    /// Provisional entries are aligned from the end against the snapshot's
    /// turns. A provisional entry that matches the next unmatched snapshot turn
    /// (same sender and text) becomes confirmed in place; one that doesn't
    /// stays provisional. Notices are skipped. Nothing is appended, so a turn
    /// is never shown twice.
    ///
    /// Returns the number of entries confirmed.
    pub fn reconcile(&mut self, snapshot: &[Message]) -> usize {
        let mut confirmed = 0;
        let mut remaining = snapshot.iter().rev().peekable();

        for message in self.messages.iter_mut().rev() {
            if !message.is_provisional() {
                continue;
            }
            let Some(candidate) = remaining.peek() else {
                break;
            };
            if message.same_turn(candidate) {
                message.status = crate::session::MessageStatus::Confirmed;
                remaining.next();
                confirmed += 1;
            }
        }

        confirmed
    }
}
