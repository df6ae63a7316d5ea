//! HttpSessionBackend - REST client for the document question-answering service.
//!
//! Implements [`SessionBackend`] over the service's four endpoints and maps
//! every failure onto the `Transport` / `Backend` error taxonomy.

use crate::dto::{
    ChatRequestDTO, ChatResponseDTO, MessageResponseDTO, SessionDTO, parse_error_detail,
};
use async_trait::async_trait;
use docchat_core::error::{DocchatError, Result};
use docchat_core::session::{AttachedFile, ChatReply, Session, SessionBackend, UploadReceipt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

const SESSIONS_PATH: &str = "/sessions/";
const CHAT_PATH: &str = "/chat/";
const UPLOAD_PATH: &str = "/upload-pdf/";

/// Backend implementation that talks to the service over HTTP.
#[derive(Clone)]
pub struct HttpSessionBackend {
    client: Client,
    base_url: String,
}

impl HttpSessionBackend {
    /// Creates a backend rooted at `base_url` (e.g. `http://127.0.0.1:8000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Uses a preconfigured client (proxies, TLS roots).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/sessions/{session_id}` with the id as one percent-encoded segment.
    ///
    /// Ids that would collapse into another path (`""`, `"."`, `".."`) are
    /// refused before anything is sent.
    fn session_url(&self, session_id: &str) -> Result<Url> {
        if matches!(session_id, "" | "." | "..") {
            return Err(DocchatError::internal(format!(
                "Invalid session id {session_id:?}"
            )));
        }
        let mut url = Url::parse(&self.url(SESSIONS_PATH)).map_err(|err| {
            DocchatError::config(format!("Invalid base URL {}: {err}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| DocchatError::config(format!("Base URL {} has no path", self.base_url)))?
            .pop_if_empty()
            .push(session_id);
        Ok(url)
    }

    /// Calls the service root and returns its greeting.
    pub async fn health(&self) -> Result<String> {
        let response = self
            .client
            .get(self.url("/"))
            .send()
            .await
            .map_err(transport_error)?;
        let body: MessageResponseDTO = read_json(check_status(response).await?).await?;
        Ok(body.message.unwrap_or_default())
    }
}

#[async_trait]
impl SessionBackend for HttpSessionBackend {
    async fn list_sessions(&self) -> Result<Vec<Session>> {
        tracing::debug!("[HttpSessionBackend] GET {}", SESSIONS_PATH);

        let response = self
            .client
            .get(self.url(SESSIONS_PATH))
            .send()
            .await
            .map_err(transport_error)?;
        let sessions: Vec<SessionDTO> = read_json(check_status(response).await?).await?;

        tracing::debug!("[HttpSessionBackend] Listed {} sessions", sessions.len());
        Ok(sessions.into_iter().map(Session::from).collect())
    }

    async fn upload_document(
        &self,
        session_id: &str,
        file: &AttachedFile,
    ) -> Result<UploadReceipt> {
        let bytes = tokio::fs::read(file.path()).await.map_err(|err| {
            DocchatError::io(format!(
                "Failed to read {}: {}",
                file.path().display(),
                err
            ))
        })?;

        let mime = mime_guess::from_path(file.path()).first_or_octet_stream();
        tracing::info!(
            "[HttpSessionBackend] Uploading {} ({} bytes, {}) for session {}",
            file.display_name,
            bytes.len(),
            mime,
            session_id
        );

        let part = Part::bytes(bytes)
            .file_name(file.display_name.clone())
            .mime_str(mime.essence_str())
            .map_err(|err| DocchatError::internal(format!("Invalid MIME type: {err}")))?;
        let form = Form::new()
            .text("session_id", session_id.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let body: MessageResponseDTO = read_json(check_status(response).await?).await?;
        Ok(body.into())
    }

    async fn ask(&self, session_id: &str, query: &str) -> Result<ChatReply> {
        tracing::debug!("[HttpSessionBackend] POST {} session={}", CHAT_PATH, session_id);

        let response = self
            .client
            .post(self.url(CHAT_PATH))
            .json(&ChatRequestDTO {
                session_id,
                user_query: query,
            })
            .send()
            .await
            .map_err(transport_error)?;
        let body: ChatResponseDTO = read_json(check_status(response).await?).await?;
        Ok(body.into())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let url = self.session_url(session_id)?;
        tracing::debug!("[HttpSessionBackend] DELETE {}", url.path());

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(transport_error)?;

        // Already gone counts as deleted.
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("[HttpSessionBackend] Session {} was already gone", session_id);
            return Ok(());
        }
        check_status(response).await?;
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> DocchatError {
    DocchatError::transport(format!("Request failed: {err}"))
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = parse_error_detail(&body);
    tracing::warn!(
        "[HttpSessionBackend] {} {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or(""),
        detail.as_deref().unwrap_or(&body)
    );
    Err(DocchatError::backend(status.as_u16(), detail))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await.map_err(transport_error)?;
    Ok(serde_json::from_str(&body)?)
}
