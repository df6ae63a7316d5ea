//! Session backend trait.
//!
//! Defines the interface to the remote question-answering service.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A document the user picked for upload.
///
/// Only the reference is held; bytes are read when the upload is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    /// Where to read the document from.
    pub path: PathBuf,
    /// Name shown to the user and sent as the multipart file name.
    pub display_name: String,
}

impl AttachedFile {
    /// References `path`, using its file name for display.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, display_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The assistant's answer to one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    /// Source documents the backend cited, if it reported any.
    pub sources: Vec<String>,
}

/// Acknowledgement of a successful document ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReceipt {
    /// The backend's confirmation text, when it sent one.
    pub message: Option<String>,
}

/// An abstract backend holding sessions and answering questions about
/// their documents.
///
/// This trait decouples the session state manager from the transport, so the
/// store and flows can be exercised against in-memory fakes.
///
/// # Implementation Notes
///
/// Implementations map every failure onto the [`crate::DocchatError`]
/// taxonomy: `Transport` when no response arrived, `Backend` for a
/// non-success status (with the response's detail text when present).
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Lists every session the backend knows, with its full history.
    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Ingests `file` as the document for `session_id`.
    async fn upload_document(&self, session_id: &str, file: &AttachedFile)
    -> Result<UploadReceipt>;

    /// Asks one question in the context of `session_id`.
    async fn ask(&self, session_id: &str, query: &str) -> Result<ChatReply>;

    /// Deletes a session.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Session deleted (or didn't exist)
    /// - `Err(_)`: The backend could not be reached or refused
    async fn delete_session(&self, session_id: &str) -> Result<()>;
}
