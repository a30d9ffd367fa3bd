//! Layered prompt assembly — builds the instruction text for one exchange.
//!
//! Layering order, outermost (most authoritative) first:
//!
//! 1. **System policy** (never break character, never hallucinate, never
//!    answer directly) — from the `policies/system.txt` fragment
//! 2. **Persona identity/style** — formatted from the profile
//! 3. **Teaching methodology** — from the `policies/methodology.txt` fragment
//! 4. **Learner context** — formatted from learner memory
//! 5. **Session context** — subject, topic, objective, state
//! 6. **Conversation history** — chronological, budget-trimmed newest-first
//! 7. **Response format** — from the `policies/response_format.txt` fragment
//! 8. **New learner input** — always the final labelled block
//!
//! Missing fragments are non-fatal: the assembler logs a warning and omits
//! that block. Assembly is deterministic — identical inputs always produce
//! byte-identical output.

use std::sync::Arc;

use mentora_core::fragment::{paths, FragmentSource};
use mentora_core::memory::{LearnerMemory, MasteryLevel};
use mentora_core::message::SessionMessage;
use mentora_core::persona::{CorrectionStyle, PersonaProfile};
use mentora_core::session::TeachingSession;
use tracing::warn;

use crate::token;

/// Placeholder rendered when learner memory has no entries at all.
pub const EMPTY_MEMORY_PLACEHOLDER: &str = "No prior learning history available.";

/// How many recent progress markers the learner-context block includes.
const PROGRESS_MARKER_WINDOW: usize = 3;

/// Soft budget for the conversation-history layer.
#[derive(Debug, Clone)]
pub struct HistoryBudget {
    /// Maximum tokens of history to include
    pub max_tokens: usize,
    /// Approximate characters per token
    pub chars_per_token: usize,
}

/// All inputs required for one assembly.
pub struct AssemblyInput<'a> {
    pub session: &'a TeachingSession,
    pub profile: &'a PersonaProfile,
    pub memory: &'a LearnerMemory,
    /// Full message history, chronological.
    pub history: &'a [SessionMessage],
    /// The new learner input being responded to.
    pub learner_input: &'a str,
}

/// The prompt assembler. Stateless — create one and reuse it.
pub struct PromptAssembler {
    fragments: Arc<dyn FragmentSource>,
    history_budget: Option<HistoryBudget>,
}

impl PromptAssembler {
    /// Create a new assembler reading policy fragments from the given source.
    pub fn new(fragments: Arc<dyn FragmentSource>) -> Self {
        Self {
            fragments,
            history_budget: None,
        }
    }

    /// Apply a soft token budget to the conversation-history layer.
    pub fn with_history_budget(mut self, budget: HistoryBudget) -> Self {
        self.history_budget = Some(budget);
        self
    }

    /// Assemble the instruction text from all eight layers.
    pub fn assemble(&self, input: &AssemblyInput<'_>) -> String {
        let mut blocks: Vec<String> = Vec::with_capacity(8);

        if let Some(policy) = self.load_fragment(paths::SYSTEM_POLICY) {
            blocks.push(policy);
        }
        blocks.push(Self::render_persona_block(input.profile));
        if let Some(methodology) = self.load_fragment(paths::METHODOLOGY) {
            blocks.push(methodology);
        }
        blocks.push(Self::render_learner_context(input.memory));
        blocks.push(Self::render_session_context(input.session));
        if let Some(history) = self.render_history(input.history) {
            blocks.push(history);
        }
        if let Some(format) = self.load_fragment(paths::RESPONSE_FORMAT) {
            blocks.push(format);
        }
        blocks.push(format!(
            "[New Learner Message]\nLearner: {}",
            input.learner_input
        ));

        blocks.join("\n\n")
    }

    /// Build the retry prompt: the original instruction text plus fallback
    /// guidance and an explicit list of violations to avoid.
    pub fn assemble_fallback(&self, original: &str, violation_messages: &[String]) -> String {
        let mut out = String::from(original);

        if let Some(guidance) = self.load_fragment(paths::FALLBACK_GUIDANCE) {
            out.push_str("\n\n");
            out.push_str(&guidance);
        }

        out.push_str("\n\n[Avoid These Violations]\n");
        for (i, msg) in violation_messages.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, msg));
        }

        out
    }

    // ── Private layer renderers ───────────────────────────────────────────

    fn load_fragment(&self, path: &str) -> Option<String> {
        match self.fragments.load(path) {
            Ok(Some(text)) => Some(text),
            Ok(None) => {
                warn!(fragment = path, "Policy fragment missing, omitting block");
                None
            }
            Err(e) => {
                warn!(fragment = path, error = %e, "Failed to load fragment, omitting block");
                None
            }
        }
    }

    fn render_persona_block(profile: &PersonaProfile) -> String {
        let mut out = format!(
            "[Persona]\nYou are {}. Stay fully in character as this instructor.\n",
            profile.name
        );
        if !profile.guidance_style.is_empty() {
            out.push_str(&format!("Guidance style: {}\n", profile.guidance_style));
        }
        if !profile.response_structure.is_empty() {
            out.push_str(&format!(
                "Response structure: {}\n",
                profile.response_structure
            ));
        }
        out.push_str(&format!(
            "Correction style: {}\n",
            Self::correction_style_label(profile.correction_style)
        ));
        if !profile.question_patterns.is_empty() {
            out.push_str("Characteristic questions:\n");
            for pattern in &profile.question_patterns {
                out.push_str(&format!("- {pattern}\n"));
            }
        }
        out.trim_end().to_string()
    }

    fn correction_style_label(style: CorrectionStyle) -> &'static str {
        match style {
            CorrectionStyle::Gentle => "gentle — lead with what was right, soften the correction",
            CorrectionStyle::Direct => "direct — name the mistake plainly, then move on",
            CorrectionStyle::Socratic => "socratic — expose the error through questions",
        }
    }

    /// Format the learner-context block from memory. Empty categories are
    /// omitted; entirely empty memory renders the literal placeholder.
    fn render_learner_context(memory: &LearnerMemory) -> String {
        if memory.is_empty() {
            return format!("[Learner Context]\n{EMPTY_MEMORY_PLACEHOLDER}");
        }

        let mut out = String::from("[Learner Context]\n");

        let mastered: Vec<&str> = memory
            .concepts
            .iter()
            .filter(|c| c.mastery == MasteryLevel::Mastered)
            .map(|c| c.name.as_str())
            .collect();
        if !mastered.is_empty() {
            out.push_str(&format!("Mastered concepts: {}\n", mastered.join(", ")));
        }

        let in_progress: Vec<String> = memory
            .concepts
            .iter()
            .filter(|c| c.mastery != MasteryLevel::Mastered)
            .map(|c| {
                let stage = match c.mastery {
                    MasteryLevel::Introduced => "introduced",
                    MasteryLevel::Practicing => "practicing",
                    MasteryLevel::Mastered => unreachable!(),
                };
                format!("{} ({stage})", c.name)
            })
            .collect();
        if !in_progress.is_empty() {
            out.push_str(&format!(
                "Concepts in progress: {}\n",
                in_progress.join(", ")
            ));
        }

        let open: Vec<&str> = memory
            .unresolved_misconceptions()
            .map(|m| m.description.as_str())
            .collect();
        if !open.is_empty() {
            out.push_str("Unresolved misconceptions:\n");
            for m in open {
                out.push_str(&format!("- {m}\n"));
            }
        }

        if !memory.strengths.is_empty() {
            out.push_str(&format!("Strengths: {}\n", memory.strengths.join(", ")));
        }
        if !memory.weaknesses.is_empty() {
            out.push_str(&format!("Weaknesses: {}\n", memory.weaknesses.join(", ")));
        }

        if !memory.progress_markers.is_empty() {
            out.push_str("Recent progress:\n");
            let start = memory
                .progress_markers
                .len()
                .saturating_sub(PROGRESS_MARKER_WINDOW);
            for marker in &memory.progress_markers[start..] {
                out.push_str(&format!("- {}\n", marker.note));
            }
        }

        out.trim_end().to_string()
    }

    fn render_session_context(session: &TeachingSession) -> String {
        let state = match session.state {
            mentora_core::session::SessionState::Active => "active",
            mentora_core::session::SessionState::Paused => "paused",
            mentora_core::session::SessionState::Completed => "completed",
            mentora_core::session::SessionState::Abandoned => "abandoned",
        };
        format!(
            "[Session Context]\nSubject: {}\nTopic: {}\nObjective: {}\nSession state: {state}",
            session.subject, session.topic, session.learning_objective
        )
    }

    /// Render conversation history chronologically, one `"<Role>: <content>"`
    /// line per message. Under a budget, whole messages are included
    /// newest-first until the budget is exhausted, then the survivors are
    /// restored to chronological order — never truncated mid-message.
    fn render_history(&self, history: &[SessionMessage]) -> Option<String> {
        if history.is_empty() {
            return None;
        }

        let included: Vec<&SessionMessage> = match &self.history_budget {
            None => history.iter().collect(),
            Some(budget) => {
                let mut used = 0;
                let mut kept: Vec<&SessionMessage> = Vec::new();
                for msg in history.iter().rev() {
                    let msg_tokens = token::estimate_message_tokens(msg, budget.chars_per_token);
                    if used + msg_tokens > budget.max_tokens {
                        break;
                    }
                    kept.push(msg);
                    used += msg_tokens;
                }
                kept.reverse();
                kept
            }
        };

        if included.is_empty() {
            return None;
        }

        let mut out = String::from("[Conversation So Far]\n");
        for msg in included {
            out.push_str(&format!("{}: {}\n", msg.role.label(), msg.content));
        }
        Some(out.trim_end().to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
