//! Session domain model.
//!
//! This module contains the Session entity as the backend lists it: an id,
//! the prefix-encoded turn history, and a display title.

use serde::{Deserialize, Serialize};

/// Title shown for a session that has no title and no human turn yet.
pub const UNTITLED_SESSION: &str = "New chat";

/// Represents one conversation known to the client.
///
/// `history` is kept exactly as the backend sent it. It is append-only on the
/// backend side and is only ever decoded for display, never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (client UUID or backend-assigned)
    pub session_id: String,
    /// Raw encoded turns in backend order
    #[serde(default)]
    pub history: Vec<String>,
    /// Human-readable session title
    #[serde(default)]
    pub title: Option<String>,
}

impl Session {
    /// Creates a session with an empty history.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            history: Vec::new(),
            title: None,
        }
    }

    /// Label for the session list.
    ///
    /// Uses the backend title when present, otherwise the first human turn
    /// (marker removed, truncated to `max_chars`), otherwise [`UNTITLED_SESSION`].
    pub fn display_title(&self, human_marker: &str, max_chars: usize) -> String {
        if let Some(title) = self.title.as_deref().map(str::trim)
            && !title.is_empty()
        {
            return title.to_string();
        }

        self.history
            .iter()
            .find_map(|turn| turn.strip_prefix(human_marker))
            .map(|text| truncate_chars(text.trim(), max_chars))
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| UNTITLED_SESSION.to_string())
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}
