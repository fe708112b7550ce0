//! Session state.
//!
//! A session is either empty or ready with exactly one processed video. The ready state is
//! replaced wholesale, so readers always see a complete index. Processing is serialized per
//! session; questions only take a short read lock to clone the active video handle.

use crate::error::{Result, VidaskError};
use crate::vector_store::VectorIndex;
use crate::video::VideoId;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

/// The processed video of a ready session.
#[derive(Debug)]
pub struct ActiveVideo {
    pub video_id: VideoId,
    pub title: Option<String>,
    pub transcript_text: String,
    pub index: Arc<VectorIndex>,
    /// Summary, once one has been generated.
    pub summary: Option<String>,
    pub processed_at: DateTime<Utc>,
}

/// Session lifecycle.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Empty,
    Ready(Arc<ActiveVideo>),
}

/// One user's session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    /// Unix milliseconds of the last lookup.
    last_active: AtomicI64,
    state: RwLock<SessionState>,
    processing: Mutex<()>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_active: AtomicI64::new(now.timestamp_millis()),
            state: RwLock::new(SessionState::Empty),
            processing: Mutex::new(()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_active.load(Ordering::Relaxed))
            .unwrap_or(self.created_at)
    }

    fn touch(&self) {
        self.last_active
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    fn is_busy(&self) -> bool {
        self.processing.try_lock().is_err()
    }

    /// Current state.
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// The active video, if the session is ready.
    pub async fn active(&self) -> Option<Arc<ActiveVideo>> {
        match &*self.state.read().await {
            SessionState::Ready(video) => Some(video.clone()),
            SessionState::Empty => None,
        }
    }

    /// Held for the whole of a `process` call.
    pub(crate) async fn lock_processing(&self) -> MutexGuard<'_, ()> {
        self.processing.lock().await
    }

    /// Make `video` the active video, dropping any previous one.
    pub(crate) async fn activate(&self, video: ActiveVideo) -> Arc<ActiveVideo> {
        let video = Arc::new(video);
        *self.state.write().await = SessionState::Ready(video.clone());
        video
    }

    /// Record the summary of the active video if it is still `video_id`.
    pub(crate) async fn set_summary(&self, video_id: &VideoId, summary: &str) {
        let mut state = self.state.write().await;
        if let SessionState::Ready(active) = &*state {
            if &active.video_id == video_id {
                let updated = ActiveVideo {
                    video_id: active.video_id.clone(),
                    title: active.title.clone(),
                    transcript_text: active.transcript_text.clone(),
                    index: active.index.clone(),
                    summary: Some(summary.to_string()),
                    processed_at: active.processed_at,
                };
                *state = SessionState::Ready(Arc::new(updated));
            }
        }
    }
}

/// Default cap on live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Default idle time before a session is dropped, in seconds.
pub const DEFAULT_IDLE_SECS: i64 = 3600;

/// Sessions keyed by id, for servers handling several users.
///
/// The store is bounded: sessions idle for longer than `idle_ttl` are swept, and `create`
/// fails once `max_sessions` live sessions remain after a sweep.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Arc<Session>>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, Duration::seconds(DEFAULT_IDLE_SECS))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions,
            idle_ttl,
        }
    }

    /// Create and register a new empty session.
    pub fn create(&self) -> Result<Arc<Session>> {
        if self.sessions.len() >= self.max_sessions {
            self.sweep_idle(Utc::now());
            if self.sessions.len() >= self.max_sessions {
                return Err(VidaskError::TooManySessions(self.max_sessions));
            }
        }

        let session = Arc::new(Session::new());
        self.sessions.insert(session.id(), session.clone());
        Ok(session)
    }

    /// Look up a session and mark it active.
    pub fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.get(id).map(|entry| entry.value().clone())?;
        session.touch();
        Some(session)
    }

    pub fn remove(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    /// Drop sessions idle for longer than the TTL as of `now`. Sessions in the middle of
    /// processing are kept. Returns the number removed.
    pub fn sweep_idle(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| {
            session.is_busy() || now - session.last_active() <= self.idle_ttl
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    fn video(id: &str) -> ActiveVideo {
        ActiveVideo {
            video_id: VideoId::parse(id).unwrap(),
            title: Some("Demo".to_string()),
            transcript_text: "hello".to_string(),
            index: Arc::new(
                VectorIndex::from_embeddings(vec![Chunk::new("hello", 0)], vec![vec![1.0]])
                    .unwrap(),
            ),
            summary: None,
            processed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_session_starts_empty() {
        let session = Session::new();
        assert!(matches!(session.state().await, SessionState::Empty));
        assert!(session.active().await.is_none());
    }

    #[tokio::test]
    async fn test_activate_replaces_video() {
        let session = Session::new();
        session.activate(video("aaaaaaaaaaa")).await;
        let first = session.active().await.unwrap();

        session.activate(video("bbbbbbbbbbb")).await;
        let second = session.active().await.unwrap();

        assert_eq!(first.video_id.as_str(), "aaaaaaaaaaa");
        assert_eq!(second.video_id.as_str(), "bbbbbbbbbbb");
    }

    #[tokio::test]
    async fn test_set_summary_only_for_active_video() {
        let session = Session::new();
        session.activate(video("aaaaaaaaaaa")).await;

        let other = VideoId::parse("bbbbbbbbbbb").unwrap();
        session.set_summary(&other, "wrong").await;
        assert!(session.active().await.unwrap().summary.is_none());

        let current = VideoId::parse("aaaaaaaaaaa").unwrap();
        session.set_summary(&current, "right").await;
        assert_eq!(session.active().await.unwrap().summary.as_deref(), Some("right"));
    }

    #[test]
    fn test_session_store() {
        let store = SessionStore::new();
        let a = store.create().unwrap();
        let b = store.create().unwrap();

        assert_eq!(store.len(), 2);
        assert_ne!(a.id(), b.id());
        assert!(Arc::ptr_eq(&store.get(&a.id()).unwrap(), &a));

        store.remove(&a.id());
        assert!(store.get(&a.id()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_caps_live_sessions() {
        let store = SessionStore::with_limits(1, Duration::hours(1));
        store.create().unwrap();

        let err = store.create().unwrap_err();
        assert!(matches!(err, VidaskError::TooManySessions(1)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_drops_idle_sessions() {
        let store = SessionStore::with_limits(10, Duration::seconds(60));
        let idle = store.create().unwrap();
        let busy = store.create().unwrap();
        let also_idle = store.create().unwrap();

        assert_eq!(store.sweep_idle(Utc::now() + Duration::seconds(30)), 0);

        let _guard = busy.lock_processing().await;
        let later = Utc::now() + Duration::seconds(120);
        assert_eq!(store.sweep_idle(later), 2);

        assert!(store.get(&idle.id()).is_none());
        assert!(store.get(&also_idle.id()).is_none());
        assert!(store.get(&busy.id()).is_some());
    }
}
