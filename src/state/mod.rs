use crate::utils::TranslationSessionConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SessionMap = Arc<RwLock<HashMap<String, SessionState>>>;

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub config: TranslationSessionConfig,
    pub sessions: SessionMap,
}

impl AppState {
    pub fn new(config: TranslationSessionConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn session(&self, session_id: &str) -> Option<SessionState> {
        self.sessions.read().await.get(session_id).cloned()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: String,
    pub status: SessionStatus,
    pub progress: f32,
    pub entries_processed: usize,
    pub entries_total: usize,
    pub batches_completed: usize,
    pub batches_total: usize,
    pub failed_batches: usize,
    pub start_time: u64,
    pub estimated_time_remaining: Option<u64>,
    pub output_file: Option<String>,
    pub error: Option<String>,
}

pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl SessionState {
    pub fn new(session_id: String, entries_total: usize, batches_total: usize) -> Self {
        Self {
            session_id,
            status: SessionStatus::Running,
            progress: 0.0,
            entries_processed: 0,
            entries_total,
            batches_completed: 0,
            batches_total,
            failed_batches: 0,
            start_time: now_secs(),
            estimated_time_remaining: None,
            output_file: None,
            error: None,
        }
    }

    pub fn update_progress(&mut self, entries_processed: usize, batches_completed: usize) {
        self.entries_processed = entries_processed;
        self.batches_completed = batches_completed;
        self.progress = if self.entries_total > 0 {
            entries_processed as f32 / self.entries_total as f32
        } else {
            1.0
        };

        if self.batches_completed > 0 {
            let elapsed = now_secs().saturating_sub(self.start_time);
            let rate = self.batches_completed as f64 / elapsed.max(1) as f64;
            let remaining = self.batches_total.saturating_sub(self.batches_completed);
            self.estimated_time_remaining = Some((remaining as f64 / rate.max(0.001)) as u64);
        }
    }
}

/// Progress sink for one session, handed to the translation pipeline.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    sessions: SessionMap,
    session_id: String,
}

impl SessionTracker {
    pub fn new(sessions: SessionMap, session_id: impl Into<String>) -> Self {
        Self {
            sessions,
            session_id: session_id.into(),
        }
    }

    pub async fn start(&self, entries_total: usize, batches_total: usize) {
        self.sessions.write().await.insert(
            self.session_id.clone(),
            SessionState::new(self.session_id.clone(), entries_total, batches_total),
        );
    }

    pub async fn record_batch(
        &self,
        entries_processed: usize,
        batches_completed: usize,
        failed: bool,
    ) {
        let mut sessions = self.sessions.write().await;
        if let Some(state) = sessions.get_mut(&self.session_id) {
            state.update_progress(entries_processed, batches_completed);
            if failed {
                state.failed_batches += 1;
            }
        }
    }

    pub async fn complete(&self, output_file: Option<String>) {
        let mut sessions = self.sessions.write().await;
        if let Some(state) = sessions.get_mut(&self.session_id) {
            state.status = SessionStatus::Completed;
            state.progress = 1.0;
            state.estimated_time_remaining = Some(0);
            state.output_file = output_file;
        }
    }

    pub async fn fail(&self, error: String) {
        let mut sessions = self.sessions.write().await;
        if let Some(state) = sessions.get_mut(&self.session_id) {
            state.status = SessionStatus::Failed;
            state.error = Some(error);
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
