//! Message domain types.
//!
//! A message is one turn in a teaching session, owned by exactly one
//! session and immutable once persisted. The learner's turn is always
//! written before generation begins so it survives a downstream failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::SessionId;

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The emulated instructor persona
    Instructor,
    /// The human learner
    Learner,
}

impl Role {
    /// Label used when rendering conversation history into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Instructor => "Instructor",
            Role::Learner => "Learner",
        }
    }
}

/// Coarse classification of a message's teaching function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Question,
    Statement,
    Guidance,
    Correction,
    Explanation,
    Encouragement,
}

/// Demand phrasings that count as question-like even without a `?`.
const ANSWER_DEMAND_PATTERNS: &[&str] = &[
    "tell me the answer",
    "give me the answer",
    "just tell me",
    "what's the answer",
];

/// Leading words that mark an input as a question.
const QUESTION_WORDS: &[&str] = &[
    "what", "why", "how", "when", "where", "which", "who", "can", "could", "would", "should",
    "is", "are", "do", "does", "did", "will",
];

/// Does the text read as a question or an answer demand?
pub fn looks_like_question(input: &str) -> bool {
    let lower = input.trim().to_lowercase();
    if lower.contains('?') {
        return true;
    }
    if ANSWER_DEMAND_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }
    match lower.split_whitespace().next() {
        Some(first) => QUESTION_WORDS.contains(&first),
        None => false,
    }
}

/// Optional teaching metadata attached to a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeachingMetadata {
    /// Observed learner struggle, 0 (none) to 5 (stuck)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub struggle_level: Option<u8>,

    /// A concept this message introduced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_introduced: Option<String>,

    /// A misconception this message addressed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub misconception_addressed: Option<String>,
}

impl TeachingMetadata {
    pub fn is_empty(&self) -> bool {
        self.struggle_level.is_none()
            && self.concept_introduced.is_none()
            && self.misconception_addressed.is_none()
    }
}

/// A single turn in a teaching session. Immutable once persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    /// Unique message ID
    pub id: MessageId,

    /// The owning session
    pub session_id: SessionId,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Coarse teaching-function tag
    pub kind: MessageKind,

    /// Optional teaching metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TeachingMetadata>,

    /// Timestamp
    pub created_at: DateTime<Utc>,
}

impl SessionMessage {
    /// Create a new learner message. The kind is classified from the
    /// content: question-like input is tagged `Question`, anything else
    /// `Statement`.
    pub fn learner(session_id: SessionId, content: impl Into<String>) -> Self {
        let content = content.into();
        let kind = if looks_like_question(&content) {
            MessageKind::Question
        } else {
            MessageKind::Statement
        };
        Self {
            id: MessageId::new(),
            session_id,
            role: Role::Learner,
            content,
            kind,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new instructor message.
    pub fn instructor(
        session_id: SessionId,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            id: MessageId::new(),
            session_id,
            role: Role::Instructor,
            content: content.into(),
            kind,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    /// Attach teaching metadata.
    pub fn with_metadata(mut self, metadata: TeachingMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
