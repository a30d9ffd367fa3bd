//! GenerationClient trait — the abstraction over text-completion backends.
//!
//! The backend is an opaque service: it accepts one instruction text plus
//! generation parameters and returns one completion (or a finite stream of
//! partial chunks). The orchestrator calls `generate()` without knowing
//! which backend is configured — pure polymorphism.
//!
//! Backend errors are propagated to the caller as-is. Only validation
//! failures downstream trigger the fallback path; "the model failed to run"
//! and "the model's answer is unsafe" are deliberately kept distinct.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Parameters for one generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: None,
            stop: Vec::new(),
        }
    }
}

/// A single chunk in a streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,
}

/// The core GenerationClient trait.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// A human-readable name for this backend (e.g., "scripted", "remote").
    fn name(&self) -> &str;

    /// Send an instruction text and get one complete completion.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> std::result::Result<String, GenerationError>;

    /// Send an instruction text and get a stream of partial chunks.
    ///
    /// Default implementation calls `generate()` and wraps the result as a
    /// single final chunk. Streaming callers must buffer to completion
    /// before response gating — the validator only operates on whole texts.
    async fn generate_stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<GenerationChunk, GenerationError>>,
        GenerationError,
    > {
        let completion = self.generate(prompt, params).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(GenerationChunk {
                content: Some(completion),
                done: true,
            }))
            .await;
        Ok(rx)
    }
}
