//! Single-flight admission for mutating operations.
//!
//! At most one send or upload may be outstanding at a time. [`RequestGate`]
//! checks the preconditions of a request against [`ActiveState`], marks the
//! state as pending and hands out a [`Ticket`]; releasing the ticket returns
//! the state to [`Pending::Idle`].

use super::model::{ActiveState, Pending};
use thiserror::Error;

/// The kind of mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Send,
    Upload,
}

impl Operation {
    /// The pending tag set while this operation is in flight.
    pub fn pending(&self) -> Pending {
        match self {
            Operation::Send => Pending::Sending,
            Operation::Upload => Pending::Uploading,
        }
    }
}

/// A request to start an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationRequest<'a> {
    /// Send `text` to the active session.
    Send { text: &'a str },
    /// Upload the attached file to the active session.
    Upload,
}

impl OperationRequest<'_> {
    pub fn operation(&self) -> Operation {
        match self {
            OperationRequest::Send { .. } => Operation::Send,
            OperationRequest::Upload => Operation::Upload,
        }
    }
}

/// Proof of admission, tagged with the session the operation was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub op_id: u64,
    pub operation: Operation,
    pub session_id: String,
}

/// Why the gate refused a request.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    #[error("another operation is still in progress ({0:?})")]
    Busy(Pending),
    #[error("no active session")]
    NoActiveSession,
    #[error("message is empty")]
    EmptyQuery,
    #[error("no file attached")]
    NoFileAttached,
}

/// Admission rules for sends and uploads.
pub struct RequestGate;

impl RequestGate {
    /// Admits `request` or explains why not.
    ///
    /// Busy is checked first: while anything is pending every request is
    /// rejected, whatever its other preconditions.
    pub fn try_enter(
        state: &mut ActiveState,
        request: OperationRequest<'_>,
    ) -> Result<Ticket, GateRejection> {
        if !state.pending.is_idle() {
            return Err(GateRejection::Busy(state.pending));
        }

        let session_id = state
            .active_session_id
            .clone()
            .ok_or(GateRejection::NoActiveSession)?;

        match request {
            OperationRequest::Send { text } if text.trim().is_empty() => {
                return Err(GateRejection::EmptyQuery);
            }
            OperationRequest::Upload if state.attached_file.is_none() => {
                return Err(GateRejection::NoFileAttached);
            }
            _ => {}
        }

        state.next_op_id += 1;
        let ticket = Ticket {
            op_id: state.next_op_id,
            operation: request.operation(),
            session_id,
        };
        state.pending = ticket.operation.pending();
        state.in_flight = Some(ticket.clone());

        tracing::debug!(
            "[RequestGate] Admitted {:?} #{} for session {}",
            ticket.operation,
            ticket.op_id,
            ticket.session_id
        );

        Ok(ticket)
    }

    /// Returns the state to idle after `ticket`'s operation finished.
    ///
    /// Releasing a ticket that no longer holds the gate is a no-op.
    pub fn release(state: &mut ActiveState, ticket: &Ticket) {
        match &state.in_flight {
            Some(current) if current.op_id == ticket.op_id => {
                state.in_flight = None;
                state.pending = Pending::Idle;
                tracing::debug!("[RequestGate] Released #{}", ticket.op_id);
            }
            _ => {
                tracing::warn!(
                    "[RequestGate] Ticket #{} released but does not hold the gate",
                    ticket.op_id
                );
            }
        }
    }
}
