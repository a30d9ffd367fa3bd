//! Learning-insight derivation — best-effort signals from one exchange.
//!
//! Insights are additive only: they may add concepts, tags, and progress
//! markers, and may promote mastery, but never remove prior entries or
//! demote a concept. An exchange with no recognizable signal produces an
//! empty insight set and leaves memory untouched.

use mentora_core::memory::LearnerMemory;
use mentora_core::message::looks_like_question;

/// Phrases signalling the learner is struggling.
const CONFUSION_PHRASES: &[&str] = &[
    "i don't understand",
    "i dont understand",
    "i'm confused",
    "i am confused",
    "i don't get it",
    "this makes no sense",
    "i'm lost",
    "i'm stuck",
    "too hard",
];

/// Phrases signalling the learner has internalized something.
const UNDERSTANDING_PHRASES: &[&str] = &[
    "i understand",
    "that makes sense",
    "makes sense now",
    "i get it now",
    "oh, i see",
    "oh i see",
    "got it",
];

/// Signals extracted from one exchange.
#[derive(Debug, Clone, Default)]
pub struct ExchangeInsights {
    /// The learner signalled confusion
    pub struggled: bool,
    /// The learner signalled understanding
    pub understood: bool,
    /// The learner asked a question
    pub asked_question: bool,
}

impl ExchangeInsights {
    pub fn is_empty(&self) -> bool {
        !self.struggled && !self.understood && !self.asked_question
    }
}

/// Scan the learner's input for teaching signals.
pub fn derive(learner_input: &str) -> ExchangeInsights {
    let lower = learner_input.to_lowercase();
    ExchangeInsights {
        struggled: CONFUSION_PHRASES.iter().any(|p| lower.contains(p)),
        understood: UNDERSTANDING_PHRASES.iter().any(|p| lower.contains(p)),
        asked_question: looks_like_question(learner_input),
    }
}

/// Merge insights into learner memory around the session topic.
pub fn merge_into(memory: &mut LearnerMemory, insights: &ExchangeInsights, topic: &str) {
    if insights.is_empty() {
        return;
    }

    if insights.struggled {
        memory.ensure_concept(topic);
        memory.add_weakness(topic);
        memory.add_progress_marker(format!("struggled with {topic}"));
    }

    if insights.understood {
        memory.promote_concept(topic);
        memory.add_progress_marker(format!("showed understanding of {topic}"));
    }

    if insights.asked_question && !insights.struggled && !insights.understood {
        memory.ensure_concept(topic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentora_core::memory::MasteryLevel;
    use mentora_core::session::LearnerId;

    #[test]
    fn confusion_detected() {
        let insights = derive("I don't understand why x moves to the other side");
        assert!(insights.struggled);
        assert!(!insights.understood);
    }

    #[test]
    fn understanding_detected() {
        let insights = derive("Oh, that makes sense now! Thanks");
        assert!(insights.understood);
    }

    #[test]
    fn neutral_statement_is_empty() {
        let insights = derive("Here is my attempt at the worksheet.");
        assert!(insights.is_empty());
    }

    #[test]
    fn struggle_adds_weakness_and_marker() {
        let mut memory = LearnerMemory::empty(LearnerId::from("l1"));
        let insights = derive("I'm confused about this");
        merge_into(&mut memory, &insights, "linear equations");

        assert_eq!(memory.concepts.len(), 1);
        assert_eq!(memory.concepts[0].mastery, MasteryLevel::Introduced);
        assert_eq!(memory.weaknesses, vec!["linear equations"]);
        assert_eq!(memory.progress_markers.len(), 1);
    }

    #[test]
    fn understanding_promotes_but_never_demotes() {
        let mut memory = LearnerMemory::empty(LearnerId::from("l1"));
        let insights = derive("I get it now");
        merge_into(&mut memory, &insights, "fractions");
        assert_eq!(memory.concepts[0].mastery, MasteryLevel::Practicing);

        merge_into(&mut memory, &insights, "fractions");
        assert_eq!(memory.concepts[0].mastery, MasteryLevel::Mastered);

        // A later struggle never demotes the concept
        let struggle = derive("i'm stuck again");
        merge_into(&mut memory, &struggle, "fractions");
        assert_eq!(memory.concepts[0].mastery, MasteryLevel::Mastered);
    }

    #[test]
    fn question_alone_only_ensures_concept() {
        let mut memory = LearnerMemory::empty(LearnerId::from("l1"));
        let insights = derive("What is a coefficient?");
        merge_into(&mut memory, &insights, "coefficients");

        assert_eq!(memory.concepts.len(), 1);
        assert!(memory.weaknesses.is_empty());
        assert!(memory.progress_markers.is_empty());
    }

    #[test]
    fn empty_insights_leave_memory_untouched() {
        let mut memory = LearnerMemory::empty(LearnerId::from("l1"));
        merge_into(&mut memory, &ExchangeInsights::default(), "anything");
        assert!(memory.is_empty());
    }
}
