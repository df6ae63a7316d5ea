//! Session store: the session list and the active view.

use super::sync::SidebarSync;
use chrono::{DateTime, Utc};
use docchat_core::error::{DocchatError, Result};
use docchat_core::session::{AttachedFile, MessageCodec, Session, SessionBackend};
use docchat_core::state::{ActiveState, Pending};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use uuid::Uuid;

/// Generates identifiers for new client-side sessions.
pub type IdGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// Holds the authoritative session list and the active view state.
///
/// `SessionStore` is the only owner of that state. Presentation code reads it
/// through [`SessionStore::snapshot`] and [`SessionStore::list`] and changes it
/// through the operations below or through `ChatFlow` / `UploadFlow`.
///
/// # Locking
///
/// Both locks are `std::sync` locks held only for short synchronous critical
/// sections, never across an `.await`. When both are needed, the session list
/// is locked before the active state.
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    codec: MessageCodec,
    sync: SidebarSync,
    /// Cached backend listing, replaced wholesale by `SidebarSync`
    sessions: RwLock<Vec<Session>>,
    active: Mutex<ActiveState>,
    last_synced_at: RwLock<Option<DateTime<Utc>>>,
    id_generator: IdGenerator,
}

impl SessionStore {
    /// Creates an empty store with no active session.
    ///
    /// Call [`SessionStore::initialize`] to load the listing and pick an
    /// active session.
    pub fn new(backend: Arc<dyn SessionBackend>, codec: MessageCodec) -> Self {
        Self {
            sync: SidebarSync::new(backend.clone()),
            backend,
            codec,
            sessions: RwLock::new(Vec::new()),
            active: Mutex::new(ActiveState::new()),
            last_synced_at: RwLock::new(None),
            id_generator: Box::new(|| Uuid::new_v4().to_string()),
        }
    }

    /// Replaces the session id generator.
    pub fn with_id_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.id_generator = Box::new(generator);
        self
    }

    pub fn backend(&self) -> &Arc<dyn SessionBackend> {
        &self.backend
    }

    pub fn codec(&self) -> &MessageCodec {
        &self.codec
    }

    // ============================================================================
    // Reads
    // ============================================================================

    /// Returns the cached session list.
    pub fn list(&self) -> Vec<Session> {
        self.sessions_read().clone()
    }

    /// Returns a copy of the active view for rendering.
    pub fn snapshot(&self) -> ActiveState {
        self.active_lock().clone()
    }

    pub fn active_session_id(&self) -> Option<String> {
        self.active_lock().active_session_id.clone()
    }

    pub fn pending(&self) -> Pending {
        self.active_lock().pending
    }

    /// When the list was last replaced by a successful refresh.
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        *self
            .last_synced_at
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================================================
    // Session operations
    // ============================================================================

    /// Loads the listing and activates a session.
    ///
    /// See [`SidebarSync::initialize`].
    pub async fn initialize(&self) {
        self.sync.initialize(self).await;
    }

    /// Refetches the session list. See [`SidebarSync::refresh`].
    pub async fn refresh(&self) -> Result<usize> {
        self.sync.refresh(self).await
    }

    /// Refetches the session list, logging instead of failing.
    pub async fn refresh_quietly(&self) {
        self.sync.refresh_or_log(self).await;
    }

    /// Makes `session_id` the active session.
    ///
    /// The view is rebuilt from that session's cached history; nothing of the
    /// previous view is kept. The attached file is dropped and the sidebar
    /// overlay closed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is not in the cached list. The view is
    /// left untouched in that case.
    pub fn select_session(&self, session_id: &str) -> Result<()> {
        let history = {
            let sessions = self.sessions_read();
            sessions
                .iter()
                .find(|session| session.session_id == session_id)
                .map(|session| session.history.clone())
                .ok_or_else(|| DocchatError::not_found("Session", session_id))?
        };

        let decoded = self.codec.decode(&history);
        if !decoded.anomalies.is_empty() {
            tracing::warn!(
                "[SessionStore] Session {} has {} undecodable history entries",
                session_id,
                decoded.anomalies.len()
            );
        }

        self.active_lock()
            .activate(session_id, decoded.messages, decoded.anomalies);
        tracing::info!(
            "[SessionStore] Selected session {} ({} turns)",
            session_id,
            history.len()
        );
        Ok(())
    }

    /// Starts a new conversation under a fresh client-side id.
    ///
    /// The id is not in the cached list and differs from the current active
    /// id. No backend call is made; the backend learns about the session on
    /// the first send or upload.
    pub fn create_new(&self) -> String {
        let sessions = self.sessions_read();
        let mut active = self.active_lock();

        let mut session_id = (self.id_generator)();
        while active.is_active(&session_id)
            || sessions.iter().any(|session| session.session_id == session_id)
        {
            tracing::debug!("[SessionStore] Generated id {} is taken, retrying", session_id);
            session_id = (self.id_generator)();
        }

        active.activate(session_id.clone(), Vec::new(), Vec::new());
        active.draft.clear();

        tracing::info!("[SessionStore] Created new session {}", session_id);
        session_id
    }

    /// Deletes a session on the backend.
    ///
    /// If it was the active session a new one is created right away, so the
    /// view never points at a deleted id. The list is then refreshed.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the deletion failed; the store is left
    /// untouched. A failed refresh afterwards is only logged.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.backend
            .delete_session(session_id)
            .await
            .inspect_err(|err| {
                tracing::error!("[SessionStore] Failed to delete session {}: {}", session_id, err)
            })?;
        tracing::info!("[SessionStore] Deleted session {}", session_id);

        let was_active = self.active_lock().is_active(session_id);
        if was_active {
            self.create_new();
        }

        self.refresh_quietly().await;
        Ok(())
    }

    // ============================================================================
    // View inputs
    // ============================================================================

    /// Replaces the input buffer.
    pub fn set_draft(&self, text: impl Into<String>) {
        self.active_lock().draft = text.into();
    }

    /// Selects the document for the next upload.
    pub fn attach_file(&self, file: AttachedFile) {
        tracing::debug!("[SessionStore] Attached {}", file.display_name);
        self.active_lock().attached_file = Some(file);
    }

    pub fn detach_file(&self) {
        self.active_lock().attached_file = None;
    }

    /// Opens or closes the session list overlay; returns the new state.
    pub fn toggle_sidebar(&self) -> bool {
        let mut active = self.active_lock();
        active.sidebar_open = !active.sidebar_open;
        active.sidebar_open
    }

    // ============================================================================
    // Crate-internal access for the flows and SidebarSync
    // ============================================================================

    /// Runs `f` with exclusive access to the active state.
    pub(crate) fn with_active<R>(&self, f: impl FnOnce(&mut ActiveState) -> R) -> R {
        f(&mut self.active_lock())
    }

    /// Replaces the cached list and reconciles the active view against it.
    ///
    /// Returns the number of provisional entries confirmed.
    pub(crate) fn replace_sessions(&self, sessions: Vec<Session>) -> usize {
        let mut cached = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *cached = sessions;
        *self
            .last_synced_at
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());

        let mut active = self.active_lock();
        let Some(active_id) = active.active_session_id.clone() else {
            return 0;
        };
        let Some(session) = cached.iter().find(|s| s.session_id == active_id) else {
            return 0;
        };

        let snapshot = self.codec.decode(&session.history);
        active.reconcile(&snapshot.messages)
    }

    fn sessions_read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn active_lock(&self) -> MutexGuard<'_, ActiveState> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, MockBackend, store_with};
    use docchat_core::session::{Message, MessageStatus, Sender};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_select_session_shows_decoded_history() {
        let backend = Arc::new(MockBackend::with_sessions(&[(
            "s1",
            &["Human: hi", "AI: hello"],
        )]));
        let store = store_with(&backend);
        store.refresh().await.unwrap();

        store.select_session("s1").unwrap();

        let view = store.snapshot();
        assert_eq!(view.active_session_id.as_deref(), Some("s1"));
        assert_eq!(
            view.messages,
            vec![
                Message::confirmed(Sender::User, "hi"),
                Message::confirmed(Sender::Assistant, "hello"),
            ]
        );
        assert!(view.anomalies.is_empty());
    }

    #[tokio::test]
    async fn test_select_session_replaces_previous_messages() {
        let backend = Arc::new(MockBackend::with_sessions(&[
            ("a", &["Human: about a", "AI: a answer"]),
            ("b", &["Human: about b"]),
        ]));
        let store = store_with(&backend);
        store.refresh().await.unwrap();

        store.select_session("a").unwrap();
        store.attach_file(AttachedFile::from_path("/tmp/a.pdf"));
        store.select_session("b").unwrap();

        let view = store.snapshot();
        assert_eq!(view.messages, vec![Message::confirmed(Sender::User, "about b")]);
        assert!(view.attached_file.is_none());
    }

    #[tokio::test]
    async fn test_select_session_keeps_unknown_prefix_visible() {
        let backend = Arc::new(MockBackend::with_sessions(&[(
            "s1",
            &["Human: q", "System: odd"],
        )]));
        let store = store_with(&backend);
        store.refresh().await.unwrap();

        store.select_session("s1").unwrap();

        let view = store.snapshot();
        assert_eq!(view.messages[1], Message::confirmed(Sender::Assistant, "System: odd"));
        assert_eq!(view.anomalies.len(), 1);
        assert_eq!(view.anomalies[0].index, 1);
    }

    #[test]
    fn test_select_unknown_session_leaves_view_untouched() {
        let backend = Arc::new(MockBackend::new());
        let store = store_with(&backend);
        let current = store.create_new();

        let err = store.select_session("missing").unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(store.active_session_id(), Some(current));
    }

    #[test]
    fn test_create_new_twice_gives_distinct_empty_sessions() {
        let backend = Arc::new(MockBackend::new());
        let store = store_with(&backend);

        store.set_draft("half typed");
        let first = store.create_new();
        let second = store.create_new();

        assert_ne!(first, second);
        let view = store.snapshot();
        assert_eq!(view.active_session_id, Some(second));
        assert!(view.messages.is_empty());
        assert!(view.draft.is_empty());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_new_retries_on_collision() {
        let backend = Arc::new(MockBackend::with_sessions(&[("taken", &[])]));
        let counter = Arc::new(AtomicUsize::new(0));
        let ids = counter.clone();
        let store = Arc::new(
            SessionStore::new(backend.clone(), MessageCodec::default()).with_id_generator(
                move || match ids.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => "taken".to_string(),
                    n => format!("fresh-{n}"),
                },
            ),
        );
        store.refresh().await.unwrap();

        assert_eq!(store.create_new(), "fresh-2");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_delete_active_session_switches_to_new_one() {
        let backend = Arc::new(MockBackend::with_sessions(&[
            ("a", &["Human: q", "AI: r"]),
            ("b", &[]),
        ]));
        let store = store_with(&backend);
        store.refresh().await.unwrap();
        store.select_session("a").unwrap();

        store.delete_session("a").await.unwrap();

        let active = store.active_session_id().unwrap();
        assert_ne!(active, "a");
        assert!(store.list().iter().all(|s| s.session_id != active));
        assert!(store.snapshot().messages.is_empty());
        assert_eq!(
            store.list().iter().map(|s| s.session_id.as_str()).collect::<Vec<_>>(),
            vec!["b"]
        );
    }

    #[tokio::test]
    async fn test_delete_inactive_session_keeps_view() {
        let backend = Arc::new(MockBackend::with_sessions(&[
            ("a", &["Human: q"]),
            ("b", &[]),
        ]));
        let store = store_with(&backend);
        store.refresh().await.unwrap();
        store.select_session("a").unwrap();

        store.delete_session("b").await.unwrap();

        assert_eq!(store.active_session_id().as_deref(), Some("a"));
        assert_eq!(store.snapshot().messages.len(), 1);
        assert_eq!(store.list().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_store_untouched() {
        let backend = Arc::new(MockBackend::with_sessions(&[("a", &[])]));
        let store = store_with(&backend);
        store.refresh().await.unwrap();
        store.select_session("a").unwrap();
        backend.fail_delete(Some(DocchatError::backend(500, None)));

        let err = store.delete_session("a").await.unwrap_err();

        assert!(err.is_backend());
        assert_eq!(store.active_session_id().as_deref(), Some("a"));
        assert_eq!(backend.count(|call| matches!(call, Call::List)), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_cached_list() {
        let backend = Arc::new(MockBackend::with_sessions(&[("a", &[])]));
        let store = store_with(&backend);
        store.refresh().await.unwrap();
        let synced = store.last_synced_at();
        assert!(synced.is_some());

        backend.fail_list(Some(DocchatError::transport("connection refused")));
        assert!(store.refresh().await.unwrap_err().is_transport());

        assert_eq!(store.list().len(), 1);
        assert_eq!(store.last_synced_at(), synced);
    }

    #[tokio::test]
    async fn test_refresh_confirms_provisional_without_duplicates() {
        let backend = Arc::new(MockBackend::with_sessions(&[("s1", &[])]));
        let store = store_with(&backend);
        store.refresh().await.unwrap();
        store.select_session("s1").unwrap();
        store.with_active(|state| {
            state.messages.push(Message::provisional_user("q"));
            state.messages.push(Message::provisional_reply("a", vec![]));
        });

        // Not persisted yet: nothing changes.
        assert_eq!(store.refresh().await.unwrap(), 0);
        assert!(store.snapshot().messages.iter().all(Message::is_provisional));

        let persisted = MockBackend::with_sessions(&[("s1", &["Human: q", "AI: a"])]);
        let sessions = persisted.list_sessions().await.unwrap();
        assert_eq!(store.replace_sessions(sessions), 2);

        let view = store.snapshot();
        assert_eq!(view.messages.len(), 2);
        assert!(
            view.messages
                .iter()
                .all(|m| m.status == MessageStatus::Confirmed)
        );
    }

    #[test]
    fn test_toggle_sidebar() {
        let store = store_with(&Arc::new(MockBackend::new()));
        assert!(store.toggle_sidebar());
        assert!(!store.toggle_sidebar());
    }
}
