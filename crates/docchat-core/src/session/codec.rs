//! Decoding of the backend's flat turn history.
//!
//! Every history entry is a single string that begins with a fixed speaker
//! marker followed by the turn text. Decoding strips exactly the marker's
//! length from the front of the entry. It never searches the rest of the
//! entry, so turn text that happens to contain a marker is left intact.

use super::message::{Message, Sender};
use crate::error::{DocchatError, Result};
use serde::{Deserialize, Serialize};

/// Marker the backend puts in front of human turns.
pub const DEFAULT_HUMAN_MARKER: &str = "Human: ";
/// Marker the backend puts in front of assistant turns.
pub const DEFAULT_ASSISTANT_MARKER: &str = "AI: ";

/// A history entry that matched neither marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeAnomaly {
    /// Position of the entry in the history.
    pub index: usize,
    /// The entry exactly as received.
    pub raw: String,
}

/// Result of decoding a whole history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedHistory {
    /// One message per history entry, in order.
    pub messages: Vec<Message>,
    /// Entries that carried no known marker.
    pub anomalies: Vec<DecodeAnomaly>,
}

/// Converts prefix-encoded turns into sender-tagged messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCodec {
    human_marker: String,
    assistant_marker: String,
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_HUMAN_MARKER, DEFAULT_ASSISTANT_MARKER)
    }
}

impl MessageCodec {
    pub fn new(human_marker: impl Into<String>, assistant_marker: impl Into<String>) -> Self {
        Self {
            human_marker: human_marker.into(),
            assistant_marker: assistant_marker.into(),
        }
    }

    pub fn human_marker(&self) -> &str {
        &self.human_marker
    }

    pub fn assistant_marker(&self) -> &str {
        &self.assistant_marker
    }

    /// Decodes a single entry, failing on an unrecognized prefix.
    pub fn decode_turn(&self, raw: &str) -> Result<Message> {
        if let Some(text) = raw.strip_prefix(self.human_marker.as_str()) {
            return Ok(Message::confirmed(Sender::User, text));
        }
        if let Some(text) = raw.strip_prefix(self.assistant_marker.as_str()) {
            return Ok(Message::confirmed(Sender::Assistant, text));
        }
        Err(DocchatError::Decode {
            raw: raw.to_string(),
        })
    }

    /// Decodes a full history.
    ///
    /// An entry with no known marker is still displayed, as an assistant
    /// message with its full text, and is reported in
    /// [`DecodedHistory::anomalies`].
    pub fn decode<S: AsRef<str>>(&self, history: &[S]) -> DecodedHistory {
        let mut decoded = DecodedHistory {
            messages: Vec::with_capacity(history.len()),
            anomalies: Vec::new(),
        };

        for (index, raw) in history.iter().enumerate() {
            let raw = raw.as_ref();
            match self.decode_turn(raw) {
                Ok(message) => decoded.messages.push(message),
                Err(_) => {
                    tracing::warn!(
                        "[MessageCodec] History entry {} has no known marker: {:?}",
                        index,
                        raw
                    );
                    decoded.messages.push(Message::confirmed(Sender::Assistant, raw));
                    decoded.anomalies.push(DecodeAnomaly {
                        index,
                        raw: raw.to_string(),
                    });
                }
            }
        }

        decoded
    }
}
