//! The rule catalog — pure pattern and heuristic checks.
//!
//! Every check is a function of the candidate response and its context,
//! returning zero or more tagged violations. Checks never mutate anything
//! and never call the generation backend.

use mentora_core::persona::{CorrectionStyle, PersonaProfile};

use crate::report::{Severity, Violation};

// Rule names, stable across releases.
pub const SYSTEM_REFERENCE: &str = "system_reference";
pub const FORBIDDEN_TOPIC: &str = "forbidden_topic";
pub const UNSAFE_CONFIRMATION: &str = "unsafe_confirmation";
pub const DIRECT_ANSWER: &str = "direct_answer";
pub const STYLE_DEVIATION: &str = "style_deviation";
pub const MISSING_QUESTION: &str = "missing_question";
pub const MISSING_VERIFICATION: &str = "missing_verification";

/// Phrases that break the persona by referencing the underlying system.
const SYSTEM_REFERENCE_PATTERNS: &[&str] = &[
    "as an ai",
    "as a language model",
    "language model",
    "i am an ai",
    "i'm an ai",
    "as a chatbot",
    "i am a chatbot",
    "my training data",
    "i was trained",
    "as a virtual assistant",
];

/// Blanket assurances that confirm misinformation or wave away safety.
const UNSAFE_CONFIRMATION_PATTERNS: &[&str] = &[
    "completely safe to ignore",
    "no need to double-check",
    "you don't need to verify",
    "it is definitely true that",
    "trust me, it's fine",
];

/// Phrasings that hand the learner a definitive answer.
const DIRECT_ANSWER_PATTERNS: &[&str] = &[
    "the answer is",
    "the solution is",
    "the result is",
    "the correct answer is",
    "it equals",
];

/// Harsh phrasings incompatible with a gentle correction style.
const HARSH_CORRECTION_PATTERNS: &[&str] = &[
    "you're wrong",
    "you are wrong",
    "that's wrong",
    "that is wrong",
    "no, that's incorrect",
    "wrong again",
];

pub use mentora_core::message::looks_like_question;

/// Find the first case-insensitive occurrence of any pattern, returning the
/// byte offset and the pattern that matched.
fn find_pattern<'p>(text_lower: &str, patterns: &[&'p str]) -> Option<(usize, &'p str)> {
    patterns
        .iter()
        .filter_map(|p| text_lower.find(p).map(|idx| (idx, *p)))
        .min_by_key(|(idx, _)| *idx)
}

/// CRITICAL: the response refers to the underlying system, breaking character.
pub fn check_system_reference(response: &str) -> Option<Violation> {
    let lower = response.to_lowercase();
    find_pattern(&lower, SYSTEM_REFERENCE_PATTERNS).map(|(idx, pattern)| Violation {
        rule: SYSTEM_REFERENCE,
        severity: Severity::Critical,
        location: Some(idx),
        message: format!("response breaks character with system self-reference (\"{pattern}\")"),
    })
}

/// CRITICAL: the response mentions a topic the persona must never engage.
pub fn check_forbidden_topics(response: &str, profile: &PersonaProfile) -> Vec<Violation> {
    let lower = response.to_lowercase();
    profile
        .consistency
        .forbidden_topics
        .iter()
        .filter(|topic| !topic.trim().is_empty())
        .filter_map(|topic| {
            let topic_lower = topic.to_lowercase();
            lower.find(&topic_lower).map(|idx| Violation {
                rule: FORBIDDEN_TOPIC,
                severity: Severity::Critical,
                location: Some(idx),
                message: format!("response mentions forbidden topic \"{topic}\""),
            })
        })
        .collect()
}

/// CRITICAL: the response confirms misinformation or waves away safety.
pub fn check_unsafe_confirmation(response: &str) -> Option<Violation> {
    let lower = response.to_lowercase();
    find_pattern(&lower, UNSAFE_CONFIRMATION_PATTERNS).map(|(idx, pattern)| Violation {
        rule: UNSAFE_CONFIRMATION,
        severity: Severity::Critical,
        location: Some(idx),
        message: format!("response confirms unsafe or unverified claim (\"{pattern}\")"),
    })
}

/// HIGH + MEDIUM arms of the direct-answer check.
///
/// When the learner input looks like a question or answer demand:
/// - a definitive-answer pattern in the response is a HIGH violation
/// - a response with no question mark at all is a softer MEDIUM violation
pub fn check_direct_answer(response: &str, learner_input: &str) -> Vec<Violation> {
    if !looks_like_question(learner_input) {
        return Vec::new();
    }

    let mut violations = Vec::new();
    let lower = response.to_lowercase();

    if let Some((idx, pattern)) = find_pattern(&lower, DIRECT_ANSWER_PATTERNS) {
        violations.push(Violation {
            rule: DIRECT_ANSWER,
            severity: Severity::High,
            location: Some(idx),
            message: format!("response gives a direct answer (\"{pattern}\") instead of guiding"),
        });
    }

    if !response.contains('?') {
        violations.push(Violation {
            rule: MISSING_QUESTION,
            severity: Severity::Medium,
            location: None,
            message: "response to a question contains no question of its own".into(),
        });
    }

    violations
}

/// HIGH: the response deviates from the persona's instructional style —
/// too short to carry guidance, or harsh despite a gentle correction style.
pub fn check_style(
    response: &str,
    profile: &PersonaProfile,
    min_response_chars: usize,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    if response.trim().len() < min_response_chars {
        violations.push(Violation {
            rule: STYLE_DEVIATION,
            severity: Severity::High,
            location: None,
            message: format!(
                "response is too short to carry guidance ({} chars, minimum {})",
                response.trim().len(),
                min_response_chars
            ),
        });
    }

    if profile.correction_style == CorrectionStyle::Gentle {
        let lower = response.to_lowercase();
        if let Some((idx, pattern)) = find_pattern(&lower, HARSH_CORRECTION_PATTERNS) {
            violations.push(Violation {
                rule: STYLE_DEVIATION,
                severity: Severity::High,
                location: Some(idx),
                message: format!(
                    "harsh correction (\"{pattern}\") clashes with the persona's gentle style"
                ),
            });
        }
    }

    violations
}

/// MEDIUM: a long response to a question with no verification question.
pub fn check_missing_verification(
    response: &str,
    learner_input: &str,
    topic: &str,
    length_threshold: usize,
) -> Option<Violation> {
    if !looks_like_question(learner_input) {
        return None;
    }
    if response.len() <= length_threshold || response.contains('?') {
        return None;
    }
    Some(Violation {
        rule: MISSING_VERIFICATION,
        severity: Severity::Medium,
        location: None,
        message: format!(
            "long response never checks the learner's understanding of {topic}"
        ),
    })
}
