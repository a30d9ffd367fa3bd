//! Session orchestration — the stateful coordinator of one teaching
//! exchange.
//!
//! Control flow is strictly linear per request:
//!
//! 1. **Load context** (session, profile, memory, history) — missing
//!    session or profile is fatal for the request
//! 2. **Persist the learner's turn** before generation, so it survives a
//!    downstream failure
//! 3. **Assemble** the instruction text, **generate**, **validate**
//! 4. On a validation failure, exactly **one** regeneration through a
//!    fallback prompt; if that still fails, substitute the fixed
//!    rule-safe fallback response
//! 5. **Persist** the instructor's turn and an updated learner-memory
//!    snapshot

pub mod insights;
pub mod locks;
pub mod orchestrator;

pub use locks::SessionLocks;
pub use orchestrator::{SessionOrchestrator, SAFE_FALLBACK_RESPONSE};
