//! Sidebar synchronization.
//!
//! The session list is never patched locally. After every mutation the whole
//! list is fetched again and replaces the cache, and the active view's
//! provisional entries are reconciled against the fresh snapshot.

use super::store::SessionStore;
use docchat_core::error::Result;
use docchat_core::session::SessionBackend;
use std::sync::Arc;

/// Refetch-and-replace synchronization of the session list.
pub struct SidebarSync {
    backend: Arc<dyn SessionBackend>,
}

impl SidebarSync {
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self { backend }
    }

    /// Fetches the full list and replaces the store's cache with it.
    ///
    /// # Returns
    ///
    /// The number of provisional entries in the active view that the new
    /// snapshot confirmed.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the cached list is left as it was.
    pub async fn refresh(&self, store: &SessionStore) -> Result<usize> {
        let sessions = self.backend.list_sessions().await?;
        let count = sessions.len();
        let confirmed = store.replace_sessions(sessions);

        tracing::debug!(
            "[SidebarSync] Refreshed {} sessions, {} provisional entries confirmed",
            count,
            confirmed
        );
        Ok(confirmed)
    }

    /// Like [`SidebarSync::refresh`], but a failure only logs a warning.
    pub async fn refresh_or_log(&self, store: &SessionStore) {
        if let Err(err) = self.refresh(store).await {
            tracing::warn!("[SidebarSync] Refresh failed, keeping cached list: {}", err);
        }
    }

    /// Loads the initial listing and activates a session.
    ///
    /// The first listed session becomes active. When the backend has no
    /// sessions, or cannot be reached, a new local session is created instead
    /// so there is always something to write into.
    pub async fn initialize(&self, store: &SessionStore) {
        let sessions = match self.backend.list_sessions().await {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::error!("[SidebarSync] Initial listing failed: {}", err);
                store.create_new();
                return;
            }
        };

        let first_id = sessions.first().map(|session| session.session_id.clone());
        store.replace_sessions(sessions);

        match first_id {
            Some(session_id) => {
                if let Err(err) = store.select_session(&session_id) {
                    tracing::error!("[SidebarSync] Could not select {}: {}", session_id, err);
                    store.create_new();
                }
            }
            None => {
                tracing::info!("[SidebarSync] No sessions on the backend, starting a new one");
                store.create_new();
            }
        }
    }
}
