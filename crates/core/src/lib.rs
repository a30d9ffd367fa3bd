//! # Mentora Core
//!
//! Domain types, traits, and error definitions for the Mentora teaching
//! engine. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (storage, text generation, prompt fragments)
//! is defined as a trait here. Implementations live in their respective
//! crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub collaborators
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod fragment;
pub mod generation;
pub mod memory;
pub mod message;
pub mod persona;
pub mod session;
pub mod storage;

// Re-export key types at crate root for ergonomics
pub use error::{Error, FragmentError, GenerationError, Result, StorageError};
pub use fragment::FragmentSource;
pub use generation::{GenerationChunk, GenerationClient, GenerationParams};
pub use memory::{
    ConceptRecord, LearnerMemory, MasteryLevel, Misconception, ProgressMarker, SessionSummary,
};
pub use message::{
    looks_like_question, MessageId, MessageKind, Role, SessionMessage, TeachingMetadata,
};
pub use persona::{ConsistencySettings, CorrectionStyle, PersonaId, PersonaProfile};
pub use session::{LearnerId, SessionId, SessionState, TeachingSession};
pub use storage::Storage;
