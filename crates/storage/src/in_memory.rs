//! In-memory backend — useful for testing and ephemeral sessions.
//!
//! Session saves are compare-and-swap on the `version` field: the save
//! fails with `VersionConflict` unless the caller's version matches the
//! stored one, so two concurrent exchanges against the same session cannot
//! silently drop each other's message-list appends.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use mentora_core::error::StorageError;
use mentora_core::memory::LearnerMemory;
use mentora_core::message::{MessageId, SessionMessage};
use mentora_core::persona::{PersonaId, PersonaProfile};
use mentora_core::session::{LearnerId, SessionId, TeachingSession};
use mentora_core::storage::Storage;

/// An in-memory backend storing all records in HashMaps.
#[derive(Default)]
pub struct InMemoryStorage {
    sessions: Arc<RwLock<HashMap<SessionId, TeachingSession>>>,
    messages: Arc<RwLock<HashMap<MessageId, SessionMessage>>>,
    profiles: Arc<RwLock<HashMap<PersonaId, PersonaProfile>>>,
    memories: Arc<RwLock<HashMap<LearnerId, LearnerMemory>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load_session(
        &self,
        id: &SessionId,
    ) -> Result<Option<TeachingSession>, StorageError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn save_session(&self, session: &TeachingSession) -> Result<u64, StorageError> {
        let mut sessions = self.sessions.write().await;
        if let Some(stored) = sessions.get(&session.id) {
            if stored.version != session.version {
                return Err(StorageError::VersionConflict {
                    session_id: session.id.to_string(),
                    expected: session.version,
                    found: stored.version,
                });
            }
        }
        let mut saved = session.clone();
        saved.version += 1;
        let new_version = saved.version;
        sessions.insert(saved.id.clone(), saved);
        Ok(new_version)
    }

    async fn load_message(
        &self,
        id: &MessageId,
    ) -> Result<Option<SessionMessage>, StorageError> {
        Ok(self.messages.read().await.get(id).cloned())
    }

    async fn load_messages(
        &self,
        ids: &[MessageId],
    ) -> Result<Vec<SessionMessage>, StorageError> {
        let messages = self.messages.read().await;
        Ok(ids.iter().filter_map(|id| messages.get(id).cloned()).collect())
    }

    async fn save_message(&self, message: &SessionMessage) -> Result<(), StorageError> {
        let mut messages = self.messages.write().await;
        if messages.contains_key(&message.id) {
            return Err(StorageError::Backend(format!(
                "message {} already persisted (messages are immutable)",
                message.id
            )));
        }
        messages.insert(message.id.clone(), message.clone());
        Ok(())
    }

    async fn load_profile(
        &self,
        id: &PersonaId,
    ) -> Result<Option<PersonaProfile>, StorageError> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn save_profile(&self, profile: &PersonaProfile) -> Result<(), StorageError> {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn load_memory(&self, learner_id: &LearnerId) -> Result<LearnerMemory, StorageError> {
        Ok(self
            .memories
            .read()
            .await
            .get(learner_id)
            .cloned()
            .unwrap_or_else(|| LearnerMemory::empty(learner_id.clone())))
    }

    async fn save_memory(&self, memory: &LearnerMemory) -> Result<(), StorageError> {
        self.memories
            .write()
            .await
            .insert(memory.learner_id.clone(), memory.clone());
        Ok(())
    }
}
