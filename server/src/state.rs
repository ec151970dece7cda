use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use askbot::{AppProfile, ConfigurationError, GeneratorConfig, OllamaClient, ResponseGenerator};
use shared::Transcript;
use uuid::Uuid;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct Session {
    transcript: Transcript,
    touched: Instant,
}

/// Transcripts of the open chat sessions, keyed by the id each browser tab
/// generates. Nothing is written to disk.
///
/// A session that sees no chat for `idle_timeout` is over: it is dropped the
/// next time any session records an exchange, and reads no longer see it.
#[derive(Clone)]
pub struct Sessions {
    inner: Arc<Mutex<HashMap<Uuid, Session>>>,
    idle_timeout: Duration,
}

impl Default for Sessions {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl Sessions {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::default(),
            idle_timeout,
        }
    }

    /// Appends one exchange and returns the updated transcript.
    pub fn record(&self, session: Uuid, question: &str, answer: Option<String>) -> Transcript {
        self.record_at(session, question, answer, Instant::now())
    }

    fn record_at(
        &self,
        session: Uuid,
        question: &str,
        answer: Option<String>,
        now: Instant,
    ) -> Transcript {
        let mut sessions = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let before = sessions.len();
        sessions.retain(|id, s| *id == session || !self.expired(s, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, open = sessions.len(), "dropped idle sessions");
        }

        let entry = sessions.entry(session).or_insert_with(|| Session {
            transcript: Transcript::new(),
            touched: now,
        });
        if self.expired(entry, now) {
            entry.transcript = Transcript::new();
        }
        entry.touched = now;
        entry.transcript.record(question, answer);
        entry.transcript.clone()
    }

    pub fn transcript(&self, session: Uuid) -> Transcript {
        self.transcript_at(session, Instant::now())
    }

    fn transcript_at(&self, session: Uuid, now: Instant) -> Transcript {
        let sessions = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(&session)
            .filter(|s| !self.expired(s, now))
            .map(|s| s.transcript.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self, session: Uuid) -> bool {
        let mut sessions = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(&session).is_some()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn expired(&self, session: &Session, now: Instant) -> bool {
        now.saturating_duration_since(session.touched) >= self.idle_timeout
    }
}

#[derive(Clone)]
pub struct AppState {
    pub profile: AppProfile,
    pub generator: Arc<ResponseGenerator>,
    pub ollama: OllamaClient,
    pub sessions: Sessions,
}

impl AppState {
    pub fn new(config: &GeneratorConfig, profile: AppProfile) -> Result<Self, ConfigurationError> {
        Ok(Self {
            profile,
            generator: Arc::new(ResponseGenerator::new(config, profile)),
            ollama: OllamaClient::new(&config.endpoints.ollama)?,
            sessions: Sessions::default(),
        })
    }

    pub fn with_idle_timeout(self, idle_timeout: Duration) -> Self {
        Self {
            sessions: Sessions::new(idle_timeout),
            ..self
        }
    }
}
