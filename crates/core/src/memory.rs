//! Learner memory — accumulated per-learner knowledge state.
//!
//! Memory is additive and best-effort: updates after each exchange may add
//! concepts, markers, and tags, and may promote mastery, but never remove
//! prior entries or demote a concept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{LearnerId, SessionId};

/// How well the learner has internalized a concept.
///
/// The derived ordering (`Introduced < Practicing < Mastered`) is what makes
/// "promotion only" checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    Introduced,
    Practicing,
    Mastered,
}

impl MasteryLevel {
    /// The next level up, or `self` if already mastered.
    pub fn promoted(self) -> Self {
        match self {
            MasteryLevel::Introduced => MasteryLevel::Practicing,
            MasteryLevel::Practicing => MasteryLevel::Mastered,
            MasteryLevel::Mastered => MasteryLevel::Mastered,
        }
    }
}

/// One concept the learner has encountered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptRecord {
    /// Concept name (e.g., "inverse operations")
    pub name: String,

    /// Current mastery level
    pub mastery: MasteryLevel,

    /// When the concept was first introduced
    pub first_seen: DateTime<Utc>,

    /// Last time the concept came up
    pub last_reviewed: DateTime<Utc>,
}

/// A misconception the learner has shown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Misconception {
    /// Description of the misunderstanding
    pub description: String,

    /// Whether it has been resolved
    pub resolved: bool,

    /// When it was first noted
    pub noted_at: DateTime<Utc>,

    /// When it was resolved (if it has been)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A dated free-text progress note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressMarker {
    pub note: String,
    pub at: DateTime<Utc>,
}

/// A short summary of a completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub summary: String,
    pub at: DateTime<Utc>,
}

/// Accumulated per-learner knowledge state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerMemory {
    /// The learner this memory belongs to
    pub learner_id: LearnerId,

    /// Concepts encountered so far
    #[serde(default)]
    pub concepts: Vec<ConceptRecord>,

    /// Misconceptions, open and resolved
    #[serde(default)]
    pub misconceptions: Vec<Misconception>,

    /// Strength tags (e.g., "pattern spotting")
    #[serde(default)]
    pub strengths: Vec<String>,

    /// Weakness tags (e.g., "fraction arithmetic")
    #[serde(default)]
    pub weaknesses: Vec<String>,

    /// Dated progress notes, chronological
    #[serde(default)]
    pub progress_markers: Vec<ProgressMarker>,

    /// Summaries of past sessions
    #[serde(default)]
    pub session_summaries: Vec<SessionSummary>,

    /// When this memory was last written
    pub last_updated: DateTime<Utc>,
}

impl LearnerMemory {
    /// An empty-but-valid memory for a learner's first session.
    pub fn empty(learner_id: LearnerId) -> Self {
        Self {
            learner_id,
            concepts: Vec::new(),
            misconceptions: Vec::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            progress_markers: Vec::new(),
            session_summaries: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    /// True when no category has any entries.
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
            && self.misconceptions.is_empty()
            && self.strengths.is_empty()
            && self.weaknesses.is_empty()
            && self.progress_markers.is_empty()
            && self.session_summaries.is_empty()
    }

    /// Ensure a concept exists, adding it at `Introduced` if new. Returns a
    /// mutable reference either way.
    pub fn ensure_concept(&mut self, name: &str) -> &mut ConceptRecord {
        let now = Utc::now();
        let idx = match self.concepts.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                self.concepts.push(ConceptRecord {
                    name: name.to_string(),
                    mastery: MasteryLevel::Introduced,
                    first_seen: now,
                    last_reviewed: now,
                });
                self.concepts.len() - 1
            }
        };
        let record = &mut self.concepts[idx];
        record.last_reviewed = now;
        record
    }

    /// Promote a concept one mastery level. Never demotes; unknown concepts
    /// are added at `Introduced` first.
    pub fn promote_concept(&mut self, name: &str) {
        let record = self.ensure_concept(name);
        record.mastery = record.mastery.promoted();
    }

    /// Add a strength tag if not already present.
    pub fn add_strength(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.strengths.contains(&tag) {
            self.strengths.push(tag);
        }
    }

    /// Add a weakness tag if not already present.
    pub fn add_weakness(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.weaknesses.contains(&tag) {
            self.weaknesses.push(tag);
        }
    }

    /// Append a dated progress note.
    pub fn add_progress_marker(&mut self, note: impl Into<String>) {
        self.progress_markers.push(ProgressMarker {
            note: note.into(),
            at: Utc::now(),
        });
    }

    /// Misconceptions that are still open.
    pub fn unresolved_misconceptions(&self) -> impl Iterator<Item = &Misconception> {
        self.misconceptions.iter().filter(|m| !m.resolved)
    }
}
