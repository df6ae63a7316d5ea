//! Data Transfer Objects (DTOs) for the backend's HTTP contract.
//!
//! These mirror the JSON bodies exactly and stay private to the
//! infrastructure layer; the domain types live in `docchat_core::session`.

use docchat_core::session::{ChatReply, Session, UploadReceipt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of `GET /sessions/`.
#[derive(Debug, Deserialize)]
pub struct SessionDTO {
    pub session_id: String,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl From<SessionDTO> for Session {
    fn from(dto: SessionDTO) -> Self {
        Session {
            session_id: dto.session_id,
            history: dto.history,
            title: dto.title,
        }
    }
}

/// Body of `POST /chat/`.
#[derive(Debug, Serialize)]
pub struct ChatRequestDTO<'a> {
    pub session_id: &'a str,
    pub user_query: &'a str,
}

/// Response of `POST /chat/`.
///
/// Older deployments answer with `ai_message` plus the cited
/// `source_documents` instead of `response`.
#[derive(Debug, Deserialize)]
pub struct ChatResponseDTO {
    #[serde(alias = "ai_message")]
    pub response: String,
    #[serde(default)]
    pub source_documents: Vec<Option<String>>,
}

impl From<ChatResponseDTO> for ChatReply {
    fn from(dto: ChatResponseDTO) -> Self {
        let mut sources: Vec<String> = Vec::new();
        for source in dto.source_documents.into_iter().flatten() {
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        ChatReply {
            text: dto.response,
            sources,
        }
    }
}

/// Response of `POST /upload-pdf/` and `GET /`.
#[derive(Debug, Deserialize)]
pub struct MessageResponseDTO {
    #[serde(default)]
    pub message: Option<String>,
}

impl From<MessageResponseDTO> for UploadReceipt {
    fn from(dto: MessageResponseDTO) -> Self {
        UploadReceipt {
            message: dto.message,
        }
    }
}

/// Error body: `{"detail": ...}`.
#[derive(Debug, Deserialize)]
pub struct ErrorDTO {
    pub detail: Value,
}

impl ErrorDTO {
    /// Flattens `detail` into display text.
    ///
    /// A plain string is used as is. Validation failures arrive as a list of
    /// objects with a `msg` field; those are joined with "; ".
    pub fn detail_text(&self) -> Option<String> {
        match &self.detail {
            Value::String(text) => Some(text.clone()),
            Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Extracts the detail text from an error body, if it has one.
pub fn parse_error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorDTO>(body)
        .ok()
        .and_then(|dto| dto.detail_text())
}
