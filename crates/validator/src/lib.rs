//! Response gating for Mentora.
//!
//! The validator is a pure function of (candidate response, session, persona
//! profile, original learner input) → a set of tagged violations plus one
//! coarse action. Checks run in a fixed priority tier; the action is decided
//! strictly by the **highest severity present**, independent of how many
//! lower-severity violations co-occur. The validator never calls the
//! generation backend and never mutates session, profile, or memory.

pub mod report;
pub mod rules;

use mentora_core::persona::PersonaProfile;
use mentora_core::session::TeachingSession;
use tracing::debug;

pub use report::{GateAction, Severity, ValidationReport, Violation};

/// All context available to the rule scan.
pub struct ValidationInput<'a> {
    /// The candidate instructor response
    pub response: &'a str,
    /// The session the response belongs to
    pub session: &'a TeachingSession,
    /// The persona being emulated
    pub profile: &'a PersonaProfile,
    /// The learner input that prompted the response
    pub learner_input: &'a str,
}

/// The response validator. Stateless — create one and reuse it.
#[derive(Debug, Clone)]
pub struct ResponseValidator {
    /// Responses shorter than this are a style deviation
    min_response_chars: usize,
    /// Question responses over this length need a verification question
    verification_length_threshold: usize,
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self {
            min_response_chars: 40,
            verification_length_threshold: 200,
        }
    }
}

impl ResponseValidator {
    pub fn new(min_response_chars: usize, verification_length_threshold: usize) -> Self {
        Self {
            min_response_chars,
            verification_length_threshold,
        }
    }

    /// Run the full rule scan and derive the gate action.
    pub fn validate(&self, input: &ValidationInput<'_>) -> ValidationReport {
        let mut violations: Vec<Violation> = Vec::new();

        // ── Critical tier ──────────────────────────────────────────────────
        if let Some(v) = rules::check_system_reference(input.response) {
            violations.push(v);
        }
        violations.extend(rules::check_forbidden_topics(input.response, input.profile));
        if let Some(v) = rules::check_unsafe_confirmation(input.response) {
            violations.push(v);
        }

        // ── High tier (plus the medium arm of the direct-answer check) ─────
        violations.extend(rules::check_direct_answer(
            input.response,
            input.learner_input,
        ));
        violations.extend(rules::check_style(
            input.response,
            input.profile,
            self.min_response_chars,
        ));

        // ── Medium tier ────────────────────────────────────────────────────
        if let Some(v) = rules::check_missing_verification(
            input.response,
            input.learner_input,
            &input.session.topic,
            self.verification_length_threshold,
        ) {
            violations.push(v);
        }

        let report = ValidationReport::from_violations(violations);
        debug!(
            action = ?report.action,
            violations = report.violations.len(),
            "Validated candidate response"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentora_core::persona::PersonaId;
    use mentora_core::session::LearnerId;

    fn test_profile() -> PersonaProfile {
        let mut profile = PersonaProfile::minimal(PersonaId::from("p1"), "Ms. Rivera");
        profile.consistency.forbidden_topics = vec!["politics".into()];
        profile
    }

    fn test_session() -> TeachingSession {
        TeachingSession::new(
            LearnerId::from("learner_1"),
            PersonaId::from("p1"),
            "algebra",
            "linear equations",
            "solve single-variable equations",
        )
    }

    fn validate(response: &str, learner_input: &str) -> ValidationReport {
        let session = test_session();
        let profile = test_profile();
        ResponseValidator::default().validate(&ValidationInput {
            response,
            session: &session,
            profile: &profile,
            learner_input,
        })
    }

    #[test]
    fn clean_guided_response_accepts() {
        let report = validate(
            "That's a great place to start. What happens to both sides if you subtract 7?",
            "How do I solve 3x + 7 = 22?",
        );
        assert!(report.is_accept());
        assert!(report.violations.is_empty());
    }

    #[test]
    fn system_reference_rejects_regardless_of_other_content() {
        let report = validate(
            "As an AI language model, I can help. The answer is x = 5.",
            "Just tell me the answer to 3x + 7 = 22",
        );
        assert_eq!(report.action, GateAction::Reject);
        // Lower-severity violations are still reported alongside
        assert!(report.violations.iter().any(|v| v.rule == rules::SYSTEM_REFERENCE));
        assert!(report.violations.iter().any(|v| v.rule == rules::DIRECT_ANSWER));
    }

    #[test]
    fn direct_answer_scenario_regenerates() {
        let report = validate("The answer is x = 5.", "Just tell me the answer to 3x + 7 = 22");
        assert_eq!(report.action, GateAction::Regenerate);
        let high = report
            .violations
            .iter()
            .find(|v| v.rule == rules::DIRECT_ANSWER)
            .unwrap();
        assert_eq!(high.severity, Severity::High);
    }

    #[test]
    fn forbidden_topic_rejects() {
        let report = validate(
            "Let's talk politics instead of algebra for a moment, shall we?",
            "What should we do next?",
        );
        assert_eq!(report.action, GateAction::Reject);
    }

    #[test]
    fn medium_only_retries() {
        // Long enough to clear the style minimum, no '?' anywhere.
        let response = "Think back to the worksheet from last time and look closely at how \
                        each step keeps the two sides balanced while you isolate the variable.";
        let report = validate(response, "How do I isolate x?");
        assert_eq!(report.action, GateAction::Retry);
        assert!(report
            .violations
            .iter()
            .all(|v| v.severity == Severity::Medium));
    }

    #[test]
    fn statement_input_skips_question_heuristics() {
        let report = validate(
            "Nice work on that one. Let's look at the next exercise together, shall we?",
            "I finished the first problem.",
        );
        assert!(report.is_accept());
    }

    #[test]
    fn messages_feed_fallback_prompt() {
        let report = validate("The answer is x = 5.", "What is x?");
        let messages = report.messages();
        assert!(!messages.is_empty());
        assert!(messages.iter().any(|m| m.contains("direct answer")));
    }
}
