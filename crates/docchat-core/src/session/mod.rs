//! Session domain module.
//!
//! This module contains the session model, the message types shown in the
//! conversation view, the history codec and the backend interface.
//!
//! # Module Structure
//!
//! - `model`: Session as listed by the backend (`Session`)
//! - `message`: Conversation message types (`Sender`, `Message`)
//! - `codec`: Turn-history decoding (`MessageCodec`)
//! - `backend`: Trait for the remote service (`SessionBackend`)
//!
//! # Usage
//!
//! ```ignore
//! use docchat_core::session::{Session, SessionBackend, MessageCodec};
//! use docchat_core::session::{Message, Sender};
//! ```

mod backend;
mod codec;
mod message;
mod model;

// Re-export public API
pub use backend::{AttachedFile, ChatReply, SessionBackend, UploadReceipt};
pub use codec::{
    DEFAULT_ASSISTANT_MARKER, DEFAULT_HUMAN_MARKER, DecodeAnomaly, DecodedHistory, MessageCodec,
};
pub use message::{Message, MessageStatus, Sender};
pub use model::{Session, UNTITLED_SESSION};
