//! Storage trait — persistence collaborator for sessions, messages,
//! profiles, and learner memory.
//!
//! The pipeline loads everything fresh per request and writes back at the
//! end; there is no caching layer here. Implementations: in-memory (tests
//! and ephemeral runs); a database-backed implementation lives behind the
//! same trait.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::memory::LearnerMemory;
use crate::message::{MessageId, SessionMessage};
use crate::persona::{PersonaId, PersonaProfile};
use crate::session::{LearnerId, SessionId, TeachingSession};

/// The persistence collaborator.
#[async_trait]
pub trait Storage: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Load a session by id. `None` means not found.
    async fn load_session(
        &self,
        id: &SessionId,
    ) -> std::result::Result<Option<TeachingSession>, StorageError>;

    /// Save a session. Saves are compare-and-swap on `session.version`:
    /// a stale writer gets `StorageError::VersionConflict`. On success the
    /// stored version is bumped; callers should reload before retrying.
    async fn save_session(
        &self,
        session: &TeachingSession,
    ) -> std::result::Result<u64, StorageError>;

    /// Load a single message by id.
    async fn load_message(
        &self,
        id: &MessageId,
    ) -> std::result::Result<Option<SessionMessage>, StorageError>;

    /// Load messages by id list, preserving the input order. Missing ids
    /// are skipped rather than failing the whole load.
    async fn load_messages(
        &self,
        ids: &[MessageId],
    ) -> std::result::Result<Vec<SessionMessage>, StorageError>;

    /// Persist a message. Messages are immutable; saving an existing id is
    /// a backend error.
    async fn save_message(
        &self,
        message: &SessionMessage,
    ) -> std::result::Result<(), StorageError>;

    /// Load a persona profile by id. `None` means not found; backends that
    /// hold only base identity should return `PersonaProfile::minimal`.
    async fn load_profile(
        &self,
        id: &PersonaId,
    ) -> std::result::Result<Option<PersonaProfile>, StorageError>;

    /// Save a persona profile.
    async fn save_profile(
        &self,
        profile: &PersonaProfile,
    ) -> std::result::Result<(), StorageError>;

    /// Load learner memory. Returns an empty-but-valid memory when none
    /// exists yet — never `None` on first access.
    async fn load_memory(
        &self,
        learner_id: &LearnerId,
    ) -> std::result::Result<LearnerMemory, StorageError>;

    /// Persist learner memory, replacing the previous snapshot.
    async fn save_memory(&self, memory: &LearnerMemory)
        -> std::result::Result<(), StorageError>;
}
