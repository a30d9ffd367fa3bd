//! Teaching session domain types.
//!
//! A session is one bounded learner–persona pairing: it ties a learner to an
//! instructor persona for a subject/topic, owns an ordered list of message
//! ids, and tracks lifecycle timestamps. The orchestrator mutates it after
//! every exchange (append message id, bump last-activity).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::MessageId;

/// Unique identifier for a teaching session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a learner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LearnerId(pub String);

impl LearnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for LearnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LearnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a teaching session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Exchanges are being processed
    Active,
    /// Temporarily suspended, may resume
    Paused,
    /// Ended normally
    Completed,
    /// Ended by timeout or walk-away
    Abandoned,
}

/// One bounded learner–persona interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeachingSession {
    /// Unique session ID
    pub id: SessionId,

    /// The learner in this session
    pub learner_id: LearnerId,

    /// The instructor persona being emulated
    pub persona_id: crate::persona::PersonaId,

    /// Subject area (e.g., "algebra")
    pub subject: String,

    /// Current topic within the subject
    pub topic: String,

    /// The learning objective for this session
    pub learning_objective: String,

    /// Lifecycle state
    pub state: SessionState,

    /// Ordered, append-only list of message ids. Must reflect true
    /// chronological order.
    pub message_ids: Vec<MessageId>,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Last exchange activity
    pub last_activity_at: DateTime<Utc>,

    /// When the session ended (if it has)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    /// Compare-and-swap version, bumped by the storage backend on every
    /// successful save. A stale writer fails with a version conflict
    /// instead of clobbering a concurrent append.
    #[serde(default)]
    pub version: u64,
}

impl TeachingSession {
    /// Create a new active session.
    pub fn new(
        learner_id: LearnerId,
        persona_id: crate::persona::PersonaId,
        subject: impl Into<String>,
        topic: impl Into<String>,
        learning_objective: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            learner_id,
            persona_id,
            subject: subject.into(),
            topic: topic.into(),
            learning_objective: learning_objective.into(),
            state: SessionState::Active,
            message_ids: Vec::new(),
            started_at: now,
            last_activity_at: now,
            ended_at: None,
            version: 0,
        }
    }

    /// Append a message id and bump the activity timestamp.
    pub fn record_message(&mut self, message_id: MessageId) {
        self.message_ids.push(message_id);
        self.last_activity_at = Utc::now();
    }

    /// Mark the session as ended in the given terminal state.
    pub fn end(&mut self, state: SessionState) {
        self.state = state;
        self.ended_at = Some(Utc::now());
    }
}
