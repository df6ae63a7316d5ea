//! Gate release on every exit path.

use crate::session::SessionStore;
use docchat_core::state::{ActiveState, RequestGate, Ticket};

/// Holds an admitted [`Ticket`] for the duration of a network exchange.
///
/// [`InFlight::complete`] applies the result and releases the gate in one
/// critical section. If the guard is dropped without completing (an error
/// propagated early, a panic, or the future itself being dropped) the gate is
/// released in `Drop`, so `pending` can never stay set.
pub(crate) struct InFlight<'a> {
    store: &'a SessionStore,
    ticket: Ticket,
    completed: bool,
}

impl<'a> InFlight<'a> {
    pub(crate) fn new(store: &'a SessionStore, ticket: Ticket) -> Self {
        Self {
            store,
            ticket,
            completed: false,
        }
    }

    pub(crate) fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    /// Runs `apply` on the active state, then releases the gate.
    pub(crate) fn complete<R>(mut self, apply: impl FnOnce(&mut ActiveState, &Ticket) -> R) -> R {
        let ticket = &self.ticket;
        let result = self.store.with_active(|state| {
            let result = apply(state, ticket);
            RequestGate::release(state, ticket);
            result
        });
        self.completed = true;
        result
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        tracing::warn!(
            "[InFlight] {:?} #{} ended without completing, releasing gate",
            self.ticket.operation,
            self.ticket.op_id
        );
        self.store
            .with_active(|state| RequestGate::release(state, &self.ticket));
    }
}
