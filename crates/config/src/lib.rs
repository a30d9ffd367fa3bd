//! Configuration loading and validation for Mentora.
//!
//! Loads configuration from a `mentora.toml` file with serde defaults for
//! every field, so an empty file (or no file at all) yields a working
//! configuration. The prompt root can be overridden via the
//! `MENTORA_PROMPT_ROOT` environment variable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use mentora_core::generation::GenerationParams;

/// Environment variable overriding `prompts.root`.
pub const PROMPT_ROOT_ENV: &str = "MENTORA_PROMPT_ROOT";

/// The root configuration structure. Maps directly to `mentora.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prompt assembly configuration
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Generation backend parameters
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Response validation thresholds
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Prompt assembly settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Directory holding policy fragments
    #[serde(default = "default_prompt_root")]
    pub root: PathBuf,

    /// Soft token budget for the conversation-history layer.
    /// `None` includes the full history.
    #[serde(default)]
    pub history_token_budget: Option<usize>,

    /// Approximate characters per token used by the budget heuristic
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            root: default_prompt_root(),
            history_token_budget: None,
            chars_per_token: default_chars_per_token(),
        }
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl GenerationConfig {
    /// Convert into the parameter struct the generation client consumes.
    pub fn to_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            stop: Vec::new(),
        }
    }
}

/// Validation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Responses shorter than this (chars) are a style deviation
    #[serde(default = "default_min_response_chars")]
    pub min_response_chars: usize,

    /// Responses over this length (chars) with no question mark, when the
    /// learner asked a question, are missing a verification question
    #[serde(default = "default_verification_threshold")]
    pub verification_length_threshold: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_response_chars: default_min_response_chars(),
            verification_length_threshold: default_verification_threshold(),
        }
    }
}

fn default_prompt_root() -> PathBuf {
    PathBuf::from("prompts")
}
fn default_chars_per_token() -> usize {
    4
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_min_response_chars() -> usize {
    40
}
fn default_verification_threshold() -> usize {
    200
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for mentora_core::Error {
    fn from(err: ConfigError) -> Self {
        mentora_core::Error::Config {
            message: err.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file, falling back to defaults if it's absent.
    /// Applies environment overrides and validates before returning.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            toml::from_str(&raw).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        if let Ok(root) = std::env::var(PROMPT_ROOT_ENV) {
            config.prompts.root = PathBuf::from(root);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate settings that serde defaults can't guarantee.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::Invalid(format!(
                "generation.temperature must be in 0.0..=2.0, got {}",
                self.generation.temperature
            )));
        }
        if self.generation.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "generation.max_tokens must be nonzero".into(),
            ));
        }
        if self.prompts.chars_per_token == 0 {
            return Err(ConfigError::Invalid(
                "prompts.chars_per_token must be nonzero".into(),
            ));
        }
        Ok(())
    }
}
