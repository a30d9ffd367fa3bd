//! Validation result types.
//!
//! A report is transient — computed fresh per candidate response, never
//! persisted. The coarse action is decided strictly by the highest severity
//! present; lower-severity violations are reported but never escalate or
//! combine.

use serde::{Deserialize, Serialize};

/// How serious a rule breach is. The derived total order
/// (`Medium < High < Critical`) is what the action derivation relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

/// The coarse action taken on a candidate response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateAction {
    /// No violations — use the response as-is
    Accept,
    /// Medium violations only — one retry with violation feedback
    Retry,
    /// High violations — one regeneration with violation feedback
    Regenerate,
    /// Critical violations — discard, substitute the safe fallback
    Reject,
}

impl GateAction {
    /// The action a given highest severity maps to.
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical => GateAction::Reject,
            Severity::High => GateAction::Regenerate,
            Severity::Medium => GateAction::Retry,
        }
    }
}

/// One detected rule breach.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    /// Stable rule name (e.g., "system_reference")
    pub rule: &'static str,

    /// How serious the breach is
    pub severity: Severity,

    /// Byte offset of the match in the response, when meaningful
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<usize>,

    /// Human-readable description, also fed back into the retry prompt
    pub message: String,
}

/// The full result of validating one candidate response.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// All detected violations, in rule-scan order
    pub violations: Vec<Violation>,

    /// The derived coarse action
    pub action: GateAction,
}

impl ValidationReport {
    /// Derive the action from the highest severity present and build the
    /// report. An empty violation list is exactly `Accept`.
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let action = violations
            .iter()
            .map(|v| v.severity)
            .max()
            .map(GateAction::for_severity)
            .unwrap_or(GateAction::Accept);
        Self { violations, action }
    }

    /// The violation messages, for fallback prompt assembly.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }

    pub fn is_accept(&self) -> bool {
        self.action == GateAction::Accept
    }
}
