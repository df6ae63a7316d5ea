//! Domain layer for docchat.
//!
//! Sessions, the messages of the active view, the turn-history codec, the
//! single-flight gate and the interface to the remote backend.

pub mod config;
pub mod error;
pub mod session;
pub mod state;

// Re-export common error type
pub use error::{DocchatError, Result};
