use crate::config::AppConfig;
use crate::domain::chat::Interviewer;
use crate::domain::exercise::{Narrator, TracingNarrator};
use crate::domain::questionnaire::Questionnaire;
use crate::middleware::RateLimiter;
use crate::services::exercise_runtime::ExerciseSession;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub chat_sessions: Arc<RwLock<HashMap<Uuid, ChatSession>>>,
    pub questionnaires: Arc<RwLock<HashMap<Uuid, QuestionnaireSession>>>,
    pub exercise_sessions: Arc<RwLock<HashMap<Uuid, ExerciseSession>>>,
    pub chat_limiter: RateLimiter,
    pub narrator: Arc<dyn Narrator>,
}

pub struct ChatSession {
    pub interviewer: Interviewer,
    pub last_active: DateTime<Utc>,
}

pub struct QuestionnaireSession {
    pub questionnaire: Questionnaire,
    pub last_active: DateTime<Utc>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let chat_limiter = RateLimiter::new(config.chat_rate_limit, config.chat_rate_window_secs);
        Self {
            config,
            chat_sessions: Arc::new(RwLock::new(HashMap::new())),
            questionnaires: Arc::new(RwLock::new(HashMap::new())),
            exercise_sessions: Arc::new(RwLock::new(HashMap::new())),
            chat_limiter,
            narrator: Arc::new(TracingNarrator),
        }
    }

    /// Removes every session idle since before `now - ttl`. Returns how many went.
    pub async fn prune_idle(&self, now: DateTime<Utc>) -> usize {
        // A TTL reaching past the earliest representable time never expires anything.
        let Some(cutoff) = now.checked_sub_signed(self.config.session_ttl) else {
            return 0;
        };
        let mut removed = 0;

        {
            let mut sessions = self.chat_sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, s| s.last_active >= cutoff);
            removed += before - sessions.len();
        }
        {
            let mut sessions = self.questionnaires.write().await;
            let before = sessions.len();
            sessions.retain(|_, s| s.last_active >= cutoff);
            removed += before - sessions.len();
        }
        {
            let mut sessions = self.exercise_sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, s| s.last_active >= cutoff);
            removed += before - sessions.len();
        }

        removed
    }
}
