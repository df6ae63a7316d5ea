//! Active view state and the single-flight gate.

mod gate;
mod model;

pub use gate::{GateRejection, Operation, OperationRequest, RequestGate, Ticket};
pub use model::{ActiveState, Pending};
