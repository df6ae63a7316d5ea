//! Conversation message types.
//!
//! This module contains types for representing messages in the active
//! conversation view, including who sent them and how far they have been
//! confirmed by the backend.

use serde::{Deserialize, Serialize};

/// Represents the speaker of a message.
///
/// Only two speakers exist: status and error notices are assistant messages
/// with [`MessageStatus::Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// Message typed by the user.
    User,
    /// Message produced by the backend, or a client notice.
    Assistant,
}

/// How a message entered the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MessageStatus {
    /// Decoded from a backend history snapshot.
    #[default]
    Confirmed,
    /// Appended locally before any snapshot has shown it.
    Provisional,
    /// Client-synthesized status or error text. Never reconciled.
    Notice,
}

/// A single message in the active conversation view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The message text, without any wire marker.
    pub text: String,
    /// Who said it.
    pub sender: Sender,
    /// Where the message came from.
    #[serde(default)]
    pub status: MessageStatus,
    /// Source documents the backend cited for an answer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl Message {
    /// A confirmed message decoded from history.
    pub fn confirmed(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender,
            status: MessageStatus::Confirmed,
            sources: Vec::new(),
        }
    }

    /// A user message appended ahead of backend confirmation.
    pub fn provisional_user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            status: MessageStatus::Provisional,
            sources: Vec::new(),
        }
    }

    /// An assistant reply received from the chat exchange, not yet seen in a snapshot.
    pub fn provisional_reply(text: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
            status: MessageStatus::Provisional,
            sources,
        }
    }

    /// A client-side notice shown as an assistant message.
    pub fn notice(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
            status: MessageStatus::Notice,
            sources: Vec::new(),
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.status == MessageStatus::Provisional
    }

    pub fn is_notice(&self) -> bool {
        self.status == MessageStatus::Notice
    }

    /// True when both messages carry the same turn, regardless of status.
    pub fn same_turn(&self, other: &Message) -> bool {
        self.sender == other.sender && self.text == other.text
    }
}
