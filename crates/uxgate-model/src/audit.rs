// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Criticality, ExpectedOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Page,
    Button,
    Workflow,
}

impl AuditKind {
    pub const ALL: [Self; 3] = [Self::Page, Self::Button, Self::Workflow];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Button => "button",
            Self::Workflow => "workflow",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Pass,
    Fail,
    Skip,
}

impl AuditOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
        }
    }
}

/// Why a failed audit failed. Present exactly when the outcome is `fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    AssertionFailed,
    NoopDetected,
    DeadEndDetected,
    Timeout,
    DriverError,
}

impl FailureClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AssertionFailed => "assertion_failed",
            Self::NoopDetected => "noop_detected",
            Self::DeadEndDetected => "dead_end_detected",
            Self::Timeout => "timeout",
            Self::DriverError => "driver_error",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    pub kind: AuditKind,
    pub id: String,
    pub outcome: AuditOutcome,
    pub criticality: Criticality,
    #[serde(default)]
    pub failure_class: Option<FailureClass>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub skip_reason: Option<String>,
    /// Declared outcome of a button audit; navigation buttons render as links.
    #[serde(default)]
    pub expected_outcome: Option<ExpectedOutcome>,
    #[serde(default)]
    pub matched_locator: Option<String>,
    #[serde(default)]
    pub used_fallback: bool,
    #[serde(default)]
    pub failed_step: Option<u32>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl AuditResult {
    fn base(kind: AuditKind, id: &str, outcome: AuditOutcome, criticality: Criticality) -> Self {
        Self {
            kind,
            id: id.to_string(),
            outcome,
            criticality,
            failure_class: None,
            error: None,
            skip_reason: None,
            expected_outcome: None,
            matched_locator: None,
            used_fallback: false,
            failed_step: None,
            duration_ms: 0,
        }
    }

    #[must_use]
    pub fn pass(kind: AuditKind, id: &str, criticality: Criticality) -> Self {
        Self::base(kind, id, AuditOutcome::Pass, criticality)
    }

    #[must_use]
    pub fn skip(kind: AuditKind, id: &str, criticality: Criticality, reason: &str) -> Self {
        let mut out = Self::base(kind, id, AuditOutcome::Skip, criticality);
        out.skip_reason = Some(reason.to_string());
        out
    }

    /// A failure keeps the entry's own criticality; it is never downgraded.
    #[must_use]
    pub fn fail(
        kind: AuditKind,
        id: &str,
        criticality: Criticality,
        class: FailureClass,
        error: &str,
    ) -> Self {
        let mut out = Self::base(kind, id, AuditOutcome::Fail, criticality);
        out.failure_class = Some(class);
        out.error = Some(error.to_string());
        out
    }

    #[must_use]
    pub fn with_locator(mut self, locator: &str, used_fallback: bool) -> Self {
        self.matched_locator = Some(locator.to_string());
        self.used_fallback = used_fallback;
        self
    }

    #[must_use]
    pub fn expecting(mut self, outcome: ExpectedOutcome) -> Self {
        self.expected_outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn is_link(&self) -> bool {
        self.expected_outcome == Some(ExpectedOutcome::Navigation)
    }

    #[must_use]
    pub fn at_step(mut self, step_id: u32) -> Self {
        self.failed_step = Some(step_id);
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.outcome != AuditOutcome::Skip
    }

    #[must_use]
    pub fn is_dead_end(&self) -> bool {
        self.failure_class == Some(FailureClass::DeadEndDetected)
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.failure_class == Some(FailureClass::NoopDetected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_keep_class_only_on_failures() {
        let pass = AuditResult::pass(AuditKind::Page, "home", Criticality::P2);
        assert_eq!(pass.failure_class, None);
        assert!(pass.is_executed());

        let skip = AuditResult::skip(AuditKind::Page, "home", Criticality::P2, "no fixture");
        assert_eq!(skip.failure_class, None);
        assert!(!skip.is_executed());

        let fail = AuditResult::fail(
            AuditKind::Workflow,
            "report-incident",
            Criticality::P0,
            FailureClass::DeadEndDetected,
            "stuck",
        )
        .at_step(3);
        assert!(fail.is_dead_end());
        assert_eq!(fail.failed_step, Some(3));
        assert_eq!(fail.criticality, Criticality::P0);
    }

    #[test]
    fn results_decode_with_optional_fields_missing() {
        let raw = r#"{"kind":"button","id":"a:b","outcome":"fail","criticality":"P1",
            "failure_class":"noop_detected"}"#;
        let row: AuditResult = serde_json::from_str(raw).expect("decode");
        assert!(row.is_noop());
        assert_eq!(row.duration_ms, 0);
    }
}
