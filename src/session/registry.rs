use super::state::{SessionStatus, UserCaptureState};
use crate::glasses::GlassesSession;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Everything the server keeps for one user's live session
pub struct ActiveSession {
    /// Distinguishes this session from a later one for the same user
    pub epoch: u64,
    pub state: UserCaptureState,
    /// Connection to the wearer's glasses. The registry holds it on the
    /// server's behalf for as long as the session is active; removing the
    /// entry releases it, apart from captures already in flight.
    pub handle: Arc<dyn GlassesSession>,
    pub started_at: DateTime<Utc>,
    ticker: Option<JoinHandle<()>>,
}

impl ActiveSession {
    pub fn new(epoch: u64, handle: Arc<dyn GlassesSession>, now: Instant) -> Self {
        Self {
            epoch,
            state: UserCaptureState::new(now),
            handle,
            started_at: Utc::now(),
            ticker: None,
        }
    }

    pub fn attach_ticker(&mut self, ticker: JoinHandle<()>) {
        if let Some(old) = self.ticker.replace(ticker) {
            old.abort();
        }
    }

    fn status(&self, user_id: &str, now: Instant) -> SessionStatus {
        SessionStatus {
            user_id: user_id.to_string(),
            session_id: self.handle.session_id().to_string(),
            is_streaming: self.state.is_streaming(),
            cooldown_remaining_ms: self
                .state
                .cooldown_remaining(now)
                .map(|d| d.as_millis() as u64),
            started_at: self.started_at,
        }
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Active sessions keyed by user id
///
/// Owned by the server and passed to whoever needs it. Callers hold the lock
/// only between await points, never across a collaborator call.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, ActiveSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, returning the one it replaces
    pub async fn insert(&self, user_id: &str, session: ActiveSession) -> Option<ActiveSession> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(user_id.to_string(), session)
    }

    pub async fn remove(&self, user_id: &str) -> Option<ActiveSession> {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(user_id)
    }

    /// Run `f` against the user's session while holding the lock
    pub async fn with_session<R>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut ActiveSession) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.lock().await;
        sessions.get_mut(user_id).map(f)
    }

    pub async fn handle(&self, user_id: &str) -> Option<Arc<dyn GlassesSession>> {
        self.with_session(user_id, |s| Arc::clone(&s.handle)).await
    }

    pub async fn status(&self, user_id: &str) -> Option<SessionStatus> {
        let now = Instant::now();
        let sessions = self.sessions.lock().await;
        sessions.get(user_id).map(|s| s.status(user_id, now))
    }

    pub async fn is_active(&self, user_id: &str) -> bool {
        self.sessions.lock().await.contains_key(user_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
