//! The session orchestrator — one exchange through the gated pipeline.
//!
//! The retry policy is an explicit three-state machine, never a loop:
//! a first attempt, at most one retry through a fallback prompt, and a
//! terminal safe-fallback substitution. The generation backend is called
//! at most twice per exchange, structurally.
//!
//! Backend failures and validation failures are deliberately asymmetric:
//! a generation error propagates to the caller as a hard failure, while a
//! validation failure is always resolved internally and never surfaces as
//! an error.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use mentora_core::error::{Error, Result};
use mentora_core::generation::{GenerationClient, GenerationParams};
use mentora_core::message::{MessageKind, SessionMessage};
use mentora_core::session::SessionId;
use mentora_core::storage::Storage;
use mentora_prompt::{AssemblyInput, PromptAssembler};
use mentora_validator::{ResponseValidator, ValidationInput};

use crate::insights;
use crate::locks::SessionLocks;

/// The fixed rule-safe response substituted when regeneration still fails
/// validation: an empathetic acknowledgment plus guiding questions, with no
/// claims, no direct answers, and no self-reference. By construction this
/// text can never trigger a violation.
pub const SAFE_FALLBACK_RESPONSE: &str = "I can see you're putting real thought into this, \
and that effort is exactly how learning happens. Let's take it one small step at a time. \
Which part feels most confusing right now? And what do you already know that might help us \
get started?";

/// Which attempt produced the final instructor text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    /// First generation passed validation
    First,
    /// The single bounded retry passed validation
    Retry,
    /// Both attempts failed; the safe fallback was substituted
    Fallback,
}

/// The stateful coordinator for teaching exchanges.
pub struct SessionOrchestrator {
    storage: Arc<dyn Storage>,
    generation: Arc<dyn GenerationClient>,
    assembler: PromptAssembler,
    validator: ResponseValidator,
    params: GenerationParams,
    locks: SessionLocks,
}

impl SessionOrchestrator {
    /// Create an orchestrator with default validation thresholds and
    /// generation parameters.
    pub fn new(
        storage: Arc<dyn Storage>,
        generation: Arc<dyn GenerationClient>,
        assembler: PromptAssembler,
    ) -> Self {
        Self {
            storage,
            generation,
            assembler,
            validator: ResponseValidator::default(),
            params: GenerationParams::default(),
            locks: SessionLocks::new(),
        }
    }

    /// Replace the default validator.
    pub fn with_validator(mut self, validator: ResponseValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Replace the default generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Process one learner message for a session and return the final
    /// instructor-facing text.
    pub async fn process_learner_message(
        &self,
        session_id: &SessionId,
        learner_text: &str,
    ) -> Result<String> {
        // Serialize concurrent exchanges against the same session.
        let _guard = self.locks.acquire(session_id).await;

        // ── Load context ───────────────────────────────────────────────────
        let mut session = self
            .storage
            .load_session(session_id)
            .await?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        let profile = self
            .storage
            .load_profile(&session.persona_id)
            .await?
            .ok_or_else(|| Error::ProfileNotFound(session.persona_id.to_string()))?;
        let mut memory = self.storage.load_memory(&session.learner_id).await?;
        let history = self.storage.load_messages(&session.message_ids).await?;

        info!(
            session_id = %session.id,
            persona = %profile.name,
            history = history.len(),
            "Processing learner message"
        );

        // ── Persist the learner's turn before generation ───────────────────
        let learner_message = SessionMessage::learner(session.id.clone(), learner_text);
        self.storage.save_message(&learner_message).await?;
        session.record_message(learner_message.id.clone());
        session.version = self.storage.save_session(&session).await?;

        // ── First attempt ──────────────────────────────────────────────────
        let prompt = self.assembler.assemble(&AssemblyInput {
            session: &session,
            profile: &profile,
            memory: &memory,
            history: &history,
            learner_input: learner_text,
        });
        let candidate = self.generation.generate(&prompt, &self.params).await?;
        let report = self.validator.validate(&ValidationInput {
            response: &candidate,
            session: &session,
            profile: &profile,
            learner_input: learner_text,
        });

        let (final_text, attempt) = match report.action {
            mentora_validator::GateAction::Accept => (candidate, Attempt::First),

            mentora_validator::GateAction::Reject => {
                warn!(
                    session_id = %session.id,
                    violations = report.violations.len(),
                    "First attempt rejected, substituting safe fallback"
                );
                (SAFE_FALLBACK_RESPONSE.to_string(), Attempt::Fallback)
            }

            mentora_validator::GateAction::Retry | mentora_validator::GateAction::Regenerate => {
                debug!(
                    session_id = %session.id,
                    violations = report.violations.len(),
                    "First attempt failed validation, running the single retry"
                );
                let retry_prompt = self
                    .assembler
                    .assemble_fallback(&prompt, &report.messages());
                let retry_candidate =
                    self.generation.generate(&retry_prompt, &self.params).await?;
                let retry_report = self.validator.validate(&ValidationInput {
                    response: &retry_candidate,
                    session: &session,
                    profile: &profile,
                    learner_input: learner_text,
                });

                if retry_report.is_accept() {
                    (retry_candidate, Attempt::Retry)
                } else {
                    warn!(
                        session_id = %session.id,
                        violations = retry_report.violations.len(),
                        "Retry still failed validation, substituting safe fallback"
                    );
                    (SAFE_FALLBACK_RESPONSE.to_string(), Attempt::Fallback)
                }
            }
        };

        // ── Persist the instructor's turn ──────────────────────────────────
        let kind = match attempt {
            Attempt::Fallback => MessageKind::Encouragement,
            Attempt::First | Attempt::Retry => MessageKind::Guidance,
        };
        let instructor_message =
            SessionMessage::instructor(session.id.clone(), final_text.clone(), kind);
        self.storage.save_message(&instructor_message).await?;
        session.record_message(instructor_message.id.clone());
        session.version = self.storage.save_session(&session).await?;

        // ── Merge learning insights into memory (best-effort, additive) ────
        let derived = insights::derive(learner_text);
        insights::merge_into(&mut memory, &derived, &session.topic);
        memory.last_updated = Utc::now();
        self.storage.save_memory(&memory).await?;

        info!(
            session_id = %session.id,
            attempt = ?attempt,
            response_chars = final_text.len(),
            "Exchange complete"
        );
        Ok(final_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use mentora_core::error::GenerationError;
    use mentora_core::fragment::paths;
    use mentora_core::memory::LearnerMemory;
    use mentora_core::message::Role;
    use mentora_core::persona::{PersonaId, PersonaProfile};
    use mentora_core::session::{LearnerId, TeachingSession};
    use mentora_prompt::StaticFragments;
    use mentora_storage::InMemoryStorage;

    const GOOD_RESPONSE: &str = "That's a thoughtful place to begin. What happens to both \
        sides of the equation if you subtract 7 from each?";
    const DIRECT_ANSWER_RESPONSE: &str = "The answer is x = 5.";
    const CRITICAL_RESPONSE: &str = "As an AI language model, I cannot really pretend to be \
        your teacher for this exercise.";

    /// Returns scripted responses in order; errors when the script runs out.
    struct ScriptedClient {
        responses: Mutex<VecDeque<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
        ) -> std::result::Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| GenerationError::NotConfigured("script exhausted".into()))
        }
    }

    /// Always fails, as a dead backend would.
    struct FailingClient;

    #[async_trait]
    impl GenerationClient for FailingClient {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
        ) -> std::result::Result<String, GenerationError> {
            Err(GenerationError::Network("backend unreachable".into()))
        }
    }

    fn test_assembler() -> PromptAssembler {
        PromptAssembler::new(Arc::new(
            StaticFragments::new()
                .with(paths::SYSTEM_POLICY, "Never break character. Never answer directly.")
                .with(paths::METHODOLOGY, "Guide with questions.")
                .with(paths::RESPONSE_FORMAT, "Short responses.")
                .with(paths::FALLBACK_GUIDANCE, "Your previous attempt broke a rule."),
        ))
    }

    async fn seeded_storage() -> (Arc<InMemoryStorage>, SessionId, LearnerId) {
        let storage = Arc::new(InMemoryStorage::new());
        let profile = PersonaProfile::minimal(PersonaId::from("p1"), "Ms. Rivera");
        storage.save_profile(&profile).await.unwrap();

        let session = TeachingSession::new(
            LearnerId::from("learner_1"),
            PersonaId::from("p1"),
            "algebra",
            "linear equations",
            "solve single-variable equations",
        );
        let session_id = session.id.clone();
        storage.save_session(&session).await.unwrap();

        (storage, session_id, LearnerId::from("learner_1"))
    }

    fn orchestrator(
        storage: Arc<InMemoryStorage>,
        client: Arc<dyn GenerationClient>,
    ) -> SessionOrchestrator {
        SessionOrchestrator::new(storage, client, test_assembler())
    }

    #[tokio::test]
    async fn accepted_first_attempt_persists_both_turns() {
        let (storage, session_id, _) = seeded_storage().await;
        let client = ScriptedClient::new(&[GOOD_RESPONSE]);
        let orch = orchestrator(storage.clone(), client.clone());

        let reply = orch
            .process_learner_message(&session_id, "How do I solve 3x + 7 = 22?")
            .await
            .unwrap();

        assert_eq!(reply, GOOD_RESPONSE);
        assert_eq!(client.calls(), 1);

        let session = storage.load_session(&session_id).await.unwrap().unwrap();
        assert_eq!(session.message_ids.len(), 2);

        let messages = storage.load_messages(&session.message_ids).await.unwrap();
        assert_eq!(messages[0].role, Role::Learner);
        assert_eq!(messages[1].role, Role::Instructor);
        assert_eq!(messages[1].content, GOOD_RESPONSE);
    }

    #[tokio::test]
    async fn single_retry_then_accept() {
        let (storage, session_id, _) = seeded_storage().await;
        let client = ScriptedClient::new(&[DIRECT_ANSWER_RESPONSE, GOOD_RESPONSE]);
        let orch = orchestrator(storage, client.clone());

        let reply = orch
            .process_learner_message(&session_id, "Just tell me the answer to 3x + 7 = 22")
            .await
            .unwrap();

        assert_eq!(reply, GOOD_RESPONSE);
        assert_eq!(client.calls(), 2, "exactly one regeneration");
    }

    #[tokio::test]
    async fn double_failure_substitutes_safe_fallback() {
        let (storage, session_id, _) = seeded_storage().await;
        let client = ScriptedClient::new(&[DIRECT_ANSWER_RESPONSE, DIRECT_ANSWER_RESPONSE]);
        let orch = orchestrator(storage.clone(), client.clone());

        let reply = orch
            .process_learner_message(&session_id, "What is x in 3x + 7 = 22?")
            .await
            .unwrap();

        assert_eq!(reply, SAFE_FALLBACK_RESPONSE);
        assert_eq!(client.calls(), 2, "never more than two generation calls");

        let session = storage.load_session(&session_id).await.unwrap().unwrap();
        let messages = storage.load_messages(&session.message_ids).await.unwrap();
        assert_eq!(messages[1].content, SAFE_FALLBACK_RESPONSE);
        assert_eq!(messages[1].kind, MessageKind::Encouragement);
    }

    #[tokio::test]
    async fn reject_goes_straight_to_fallback_without_retry() {
        let (storage, session_id, _) = seeded_storage().await;
        let client = ScriptedClient::new(&[CRITICAL_RESPONSE]);
        let orch = orchestrator(storage, client.clone());

        let reply = orch
            .process_learner_message(&session_id, "Can you help me?")
            .await
            .unwrap();

        assert_eq!(reply, SAFE_FALLBACK_RESPONSE);
        assert_eq!(client.calls(), 1, "reject skips the retry attempt");
    }

    #[tokio::test]
    async fn reject_on_retry_also_falls_back() {
        let (storage, session_id, _) = seeded_storage().await;
        let client = ScriptedClient::new(&[DIRECT_ANSWER_RESPONSE, CRITICAL_RESPONSE]);
        let orch = orchestrator(storage, client.clone());

        let reply = orch
            .process_learner_message(&session_id, "What is x in 3x + 7 = 22?")
            .await
            .unwrap();

        assert_eq!(reply, SAFE_FALLBACK_RESPONSE);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn safe_fallback_itself_validates_accept() {
        let profile = PersonaProfile::minimal(PersonaId::from("p1"), "Ms. Rivera");
        let session = TeachingSession::new(
            LearnerId::from("learner_1"),
            PersonaId::from("p1"),
            "algebra",
            "linear equations",
            "solve single-variable equations",
        );
        let report = ResponseValidator::default().validate(&ValidationInput {
            response: SAFE_FALLBACK_RESPONSE,
            session: &session,
            profile: &profile,
            learner_input: "Just tell me the answer to 3x + 7 = 22",
        });
        assert!(report.is_accept(), "violations: {:?}", report.violations);
    }

    #[tokio::test]
    async fn missing_session_is_fatal() {
        let storage = Arc::new(InMemoryStorage::new());
        let client = ScriptedClient::new(&[GOOD_RESPONSE]);
        let orch = orchestrator(storage, client);

        let err = orch
            .process_learner_message(&SessionId::from("ghost"), "hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn missing_profile_is_fatal() {
        let storage = Arc::new(InMemoryStorage::new());
        let session = TeachingSession::new(
            LearnerId::from("learner_1"),
            PersonaId::from("no_such_persona"),
            "algebra",
            "linear equations",
            "objective",
        );
        let session_id = session.id.clone();
        storage.save_session(&session).await.unwrap();

        let client = ScriptedClient::new(&[GOOD_RESPONSE]);
        let orch = orchestrator(storage, client);

        let err = orch
            .process_learner_message(&session_id, "hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProfileNotFound(_)));
    }

    #[tokio::test]
    async fn generation_error_propagates_but_learner_turn_is_durable() {
        let (storage, session_id, _) = seeded_storage().await;
        let orch = orchestrator(storage.clone(), Arc::new(FailingClient));

        let err = orch
            .process_learner_message(&session_id, "Why does x move across?")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));

        // The learner's turn was persisted before generation was attempted.
        let session = storage.load_session(&session_id).await.unwrap().unwrap();
        assert_eq!(session.message_ids.len(), 1);
        let messages = storage.load_messages(&session.message_ids).await.unwrap();
        assert_eq!(messages[0].role, Role::Learner);
    }

    #[tokio::test]
    async fn insights_merge_into_memory() {
        let (storage, session_id, learner_id) = seeded_storage().await;
        let client = ScriptedClient::new(&[GOOD_RESPONSE]);
        let orch = orchestrator(storage.clone(), client);

        orch.process_learner_message(&session_id, "I don't understand how to isolate x")
            .await
            .unwrap();

        let memory = storage.load_memory(&learner_id).await.unwrap();
        assert!(memory.weaknesses.contains(&"linear equations".to_string()));
        assert_eq!(memory.concepts.len(), 1);
        assert_eq!(memory.progress_markers.len(), 1);
    }

    #[tokio::test]
    async fn neutral_exchange_still_saves_memory_timestamp() {
        let (storage, session_id, learner_id) = seeded_storage().await;
        let client = ScriptedClient::new(&[GOOD_RESPONSE]);
        let orch = orchestrator(storage.clone(), client);

        let mut memory = LearnerMemory::empty(learner_id.clone());
        let before = memory.last_updated;
        storage.save_memory(&memory).await.unwrap();

        orch.process_learner_message(&session_id, "Here is my attempt at the worksheet.")
            .await
            .unwrap();

        memory = storage.load_memory(&learner_id).await.unwrap();
        assert!(memory.is_empty(), "no insights from a neutral exchange");
        assert!(memory.last_updated >= before);
    }

    #[tokio::test]
    async fn concurrent_exchanges_serialize() {
        let (storage, session_id, _) = seeded_storage().await;
        let client = ScriptedClient::new(&[GOOD_RESPONSE, GOOD_RESPONSE]);
        let orch = Arc::new(orchestrator(storage.clone(), client));

        let a = {
            let orch = orch.clone();
            let id = session_id.clone();
            tokio::spawn(async move { orch.process_learner_message(&id, "How do I start?").await })
        };
        let b = {
            let orch = orch.clone();
            let id = session_id.clone();
            tokio::spawn(async move { orch.process_learner_message(&id, "What comes next?").await })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Both exchanges landed: no lost update on the message-id list.
        let session = storage.load_session(&session_id).await.unwrap().unwrap();
        assert_eq!(session.message_ids.len(), 4);
    }
}
