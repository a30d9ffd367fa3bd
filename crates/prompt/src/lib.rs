//! Instruction-text assembly for Mentora.
//!
//! The assembler is a pure function of (session, persona profile, learner
//! memory, message history, new input) → one instruction text, built by
//! concatenating fixed policy fragments with dynamically formatted context
//! blocks in a strict layering order. A second entry point appends
//! violation feedback to a previously built prompt for the single retry
//! attempt.

pub mod assembler;
pub mod fragments;
pub mod token;

pub use assembler::{AssemblyInput, HistoryBudget, PromptAssembler};
pub use fragments::{FileFragmentStore, StaticFragments};
