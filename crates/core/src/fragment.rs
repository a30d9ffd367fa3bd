//! FragmentSource trait — read-only prompt policy fragments.
//!
//! Fragments are small text files addressed by a relative path under a
//! configured root (e.g., `policies/system.txt`). A missing fragment is a
//! recoverable condition, not an error: the assembler logs a warning and
//! omits that block.

use crate::error::FragmentError;

/// Read-only source of prompt fragments.
pub trait FragmentSource: Send + Sync {
    /// Load a fragment by relative path. `Ok(None)` means the fragment
    /// does not exist, which callers treat as "omit this block".
    fn load(&self, path: &str) -> std::result::Result<Option<String>, FragmentError>;
}

/// Well-known fragment paths used by the prompt assembler.
pub mod paths {
    /// Immutable system policy: never break character, never hallucinate,
    /// never answer directly.
    pub const SYSTEM_POLICY: &str = "policies/system.txt";
    /// Teaching-methodology rules.
    pub const METHODOLOGY: &str = "policies/methodology.txt";
    /// Response-format policy.
    pub const RESPONSE_FORMAT: &str = "policies/response_format.txt";
    /// Guidance appended to the retry prompt after a validation failure.
    pub const FALLBACK_GUIDANCE: &str = "policies/fallback.txt";
}
