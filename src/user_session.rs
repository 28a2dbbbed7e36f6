use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    // next plain text message becomes a post
    AwaitingPost,
    // next plain text message is appended to a support ticket
    AwaitingTicketMessage { ticket_id: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: i64,
    pub state: SessionState,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Default)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<i64, UserSession>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_session(&self, user_id: i64) -> SessionState {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&user_id)
            .map(|session| session.state.clone())
            .unwrap_or(SessionState::Idle)
    }

    pub async fn set_session(&self, user_id: i64, state: SessionState) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            user_id,
            UserSession {
                user_id,
                state,
                last_updated: chrono::Utc::now(),
            },
        );
    }

    pub async fn clear_session(&self, user_id: i64) {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(&user_id);
    }

    /// drops sessions untouched for longer than `max_age`, returns how many were removed
    pub async fn cleanup_old_sessions(&self, max_age: chrono::Duration) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        let cutoff = chrono::Utc::now() - max_age;
        sessions.retain(|_, session| session.last_updated > cutoff);
        before - sessions.len()
    }
}
