//! Application state for the coach server

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::CoachConfig;
use crate::dashboard::Dashboard;
use crate::error::{Error, Result};
use crate::ingestion::{SlideIngestor, TextChunker};
use crate::providers::{build_llm, LlmProvider, RetrievalProvider, SlideRetriever};
use crate::session::{ConversationEngine, InterviewScript, SessionContext};
use crate::storage::CoachDb;

/// A live session, locked for the duration of one operation
pub type SharedSession = Arc<Mutex<SessionContext>>;

/// A registered session and when it was last looked up
struct SessionSlot {
    session: SharedSession,
    last_seen: parking_lot::Mutex<Instant>,
}

impl SessionSlot {
    fn new(session: SharedSession) -> Self {
        Self {
            session,
            last_seen: parking_lot::Mutex::new(Instant::now()),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: CoachConfig,
    /// Session engine (LLM, retrieval, grading, persistence)
    engine: ConversationEngine,
    /// Tutor dashboard over the store
    dashboard: Dashboard,
    /// Slide upload pipeline
    ingestor: SlideIngestor,
    /// Live sessions by id
    sessions: DashMap<Uuid, SessionSlot>,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create new application state from config
    pub async fn new(config: CoachConfig) -> Result<Self> {
        tracing::info!("Initializing interview coach state (backend: {:?})...", config.backend);

        let db = Arc::new(CoachDb::new(&config.storage.database_path)?);
        tracing::info!("Database opened at {}", config.storage.database_path.display());

        let script = InterviewScript::load(&config.interview)?;
        let llm = build_llm(&config)?;

        let state = Self::from_parts(config, db, llm, script);

        // Background eviction of finished and abandoned sessions
        let sweep_every = Duration::from_secs(state.config().server.session_sweep_secs);
        let weak = Arc::downgrade(&state.inner);
        tokio::spawn(async move {
            sweep_sessions(weak, sweep_every).await;
        });

        Ok(state)
    }

    /// Assemble state from already-built components
    pub fn from_parts(
        config: CoachConfig,
        db: Arc<CoachDb>,
        llm: Arc<dyn LlmProvider>,
        script: InterviewScript,
    ) -> Self {
        let retriever: Option<Arc<dyn RetrievalProvider>> = if config.retrieval.enabled {
            Some(Arc::new(SlideRetriever::new(db.clone())))
        } else {
            tracing::info!("Slide retrieval disabled");
            None
        };

        let engine = ConversationEngine::new(llm, retriever, db.clone(), script, config.retrieval.top_k);
        let dashboard = Dashboard::new(db.clone());
        let ingestor = SlideIngestor::new(db, TextChunker::from_config(&config.chunking));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                engine,
                dashboard,
                ingestor,
                sessions: DashMap::new(),
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &CoachConfig {
        &self.inner.config
    }

    pub fn engine(&self) -> &ConversationEngine {
        &self.inner.engine
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.inner.dashboard
    }

    pub fn ingestor(&self) -> &SlideIngestor {
        &self.inner.ingestor
    }

    pub fn db(&self) -> &Arc<CoachDb> {
        self.inner.engine.db()
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    // ==================== Sessions ====================

    /// Register a session and return its handle
    pub fn insert_session(&self, session: SessionContext) -> SharedSession {
        let id = session.id;
        let shared = Arc::new(Mutex::new(session));
        self.inner.sessions.insert(id, SessionSlot::new(shared.clone()));
        shared
    }

    /// Look up a live session, marking it as recently used
    pub fn session(&self, id: &Uuid) -> Result<SharedSession> {
        let entry = self.inner.sessions.get(id).ok_or(Error::SessionNotFound(*id))?;
        *entry.last_seen.lock() = Instant::now();
        Ok(entry.session.clone())
    }

    /// Discard a session; returns whether it existed
    pub fn remove_session(&self, id: &Uuid) -> bool {
        self.inner.sessions.remove(id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Discard ended sessions past their grace period and idle sessions past
    /// the idle limit; returns how many were removed
    ///
    /// Sessions locked by an in-flight request are kept.
    pub fn evict_sessions(&self) -> usize {
        self.evict_sessions_at(Instant::now())
    }

    pub(crate) fn evict_sessions_at(&self, now: Instant) -> usize {
        let server = &self.inner.config.server;
        let grace = Duration::from_secs(server.ended_session_grace_secs);
        let idle_limit = Duration::from_secs(server.session_idle_secs);

        let before = self.inner.sessions.len();
        self.inner.sessions.retain(|id, slot| {
            let Ok(session) = slot.session.try_lock() else {
                return true;
            };
            let idle = now.saturating_duration_since(*slot.last_seen.lock());
            let expired = idle >= idle_limit || (session.ended && idle >= grace);
            if expired {
                tracing::debug!("Evicting session {} for {} (ended: {})", id, session.user, session.ended);
            }
            !expired
        });

        let evicted = before.saturating_sub(self.inner.sessions.len());
        if evicted > 0 {
            tracing::info!("Evicted {} sessions, {} remain", evicted, self.inner.sessions.len());
        }
        evicted
    }
}

/// Periodically evict sessions until the state is dropped
async fn sweep_sessions(state: Weak<AppStateInner>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(inner) = state.upgrade() else {
            break;
        };
        AppState { inner }.evict_sessions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    fn state() -> AppState {
        let llm = Arc::new(ScriptedLlm::replying(&["Every 50k strokes.", "Good focus. Grade: B"]));
        let db = Arc::new(CoachDb::in_memory().unwrap());
        let script = InterviewScript::new("You run the press shop.", "RUBRIC", "Hi, ask away.");
        AppState::from_parts(CoachConfig::default(), db, llm, script)
    }

    #[tokio::test]
    async fn test_ended_session_evicted_after_grace() {
        let state = state();
        let graded = state.insert_session(state.engine().reset("alice"));
        let open = state.insert_session(state.engine().reset("bob"));
        let graded_id = graded.lock().await.id;
        let open_id = open.lock().await.id;

        {
            let mut session = graded.lock().await;
            state
                .engine()
                .submit_user_message(&mut session, "How often is the die replaced?")
                .await
                .unwrap();
            state.engine().end_session(&mut session).await.unwrap();
        }

        let server = &state.config().server;
        let grace = Duration::from_secs(server.ended_session_grace_secs);

        // Still available for the feedback download
        assert_eq!(state.evict_sessions(), 0);
        assert!(state.session(&graded_id).is_ok());

        assert_eq!(state.evict_sessions_at(Instant::now() + grace), 1);
        assert!(matches!(state.session(&graded_id), Err(Error::SessionNotFound(_))));
        assert!(state.session(&open_id).is_ok());
        assert_eq!(state.session_count(), 1);
    }

    #[tokio::test]
    async fn test_idle_session_evicted() {
        let state = state();
        let shared = state.insert_session(state.engine().reset("carol"));
        let id = shared.lock().await.id;

        let idle_limit = Duration::from_secs(state.config().server.session_idle_secs);
        assert_eq!(state.evict_sessions_at(Instant::now() + idle_limit / 2), 0);

        // A session held by a request survives the sweep
        let guard = shared.lock().await;
        assert_eq!(state.evict_sessions_at(Instant::now() + idle_limit), 0);
        drop(guard);

        assert_eq!(state.evict_sessions_at(Instant::now() + idle_limit), 1);
        assert!(state.session(&id).is_err());
    }
}
