//! Application layer for docchat.
//!
//! This crate owns the client-side state: the session list, the active view
//! and the single-flight gate. It coordinates the domain types with a
//! [`docchat_core::session::SessionBackend`] implementation to carry out
//! the chat and upload flows.

pub mod chat_flow;
mod in_flight;
pub mod outcome;
pub mod session;
pub mod upload_flow;

#[cfg(test)]
mod test_support;

pub use chat_flow::ChatFlow;
pub use outcome::FlowOutcome;
pub use session::{SessionStore, SidebarSync};
pub use upload_flow::UploadFlow;
