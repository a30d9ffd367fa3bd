//! Persona profile — the instructor's reproducible identity.
//!
//! A profile captures how a particular human instructor teaches: guidance
//! style, response structure, the questions they habitually ask, how they
//! correct mistakes, and consistency settings (forbidden topics, curriculum
//! structure). Profiles are read-only within a session; profile building
//! happens elsewhere.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a persona profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonaId(pub String);

impl PersonaId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for PersonaId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PersonaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the persona delivers corrections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStyle {
    /// Softens corrections, leads with what was right
    #[default]
    Gentle,
    /// Names the mistake plainly, then moves on
    Direct,
    /// Corrects by asking questions that expose the error
    Socratic,
}

/// Consistency settings — the guardrails that keep the emulation faithful.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsistencySettings {
    /// Topics the persona must never engage with
    #[serde(default)]
    pub forbidden_topics: Vec<String>,

    /// Curriculum structure the persona teaches against (shape is owned by
    /// the out-of-scope profile builder; treated as opaque here)
    #[serde(default)]
    pub curriculum: serde_json::Value,

    /// Additional persona-specific settings
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The instructor's reproducible identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaProfile {
    /// Unique profile ID
    pub id: PersonaId,

    /// The instructor's name
    pub name: String,

    /// How the persona guides (e.g., "leads with analogies, never lectures")
    pub guidance_style: String,

    /// Response-structure policy (e.g., "acknowledge, probe, then hint")
    pub response_structure: String,

    /// Question phrasings this instructor habitually uses
    #[serde(default)]
    pub question_patterns: Vec<String>,

    /// How mistakes are corrected
    #[serde(default)]
    pub correction_style: CorrectionStyle,

    /// Consistency guardrails
    #[serde(default)]
    pub consistency: ConsistencySettings,
}

impl PersonaProfile {
    /// A minimal profile for when only base identity exists: name and id
    /// are kept, all style lists are empty. Used as the storage fallback.
    pub fn minimal(id: PersonaId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            guidance_style: String::new(),
            response_structure: String::new(),
            question_patterns: Vec::new(),
            correction_style: CorrectionStyle::default(),
            consistency: ConsistencySettings::default(),
        }
    }
}
